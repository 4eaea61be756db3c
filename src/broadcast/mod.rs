//! The broadcast orchestrator.
//!
//! A broadcast resolves the caller's address into both namespaces, settles the
//! gas limit, gets the transaction prepared by the fee-delegation service and
//! then hands over to the pipeline of the configured wallet:
//!
//! * [`EvmPipeline`]: EIP-712 signature over the prepared payload, submitted
//!   through the wallet's web3 broadcast.
//! * [`NativePipeline`]: SIGN_MODE_DIRECT signature, assembled with the fee
//!   payer's signature into a `TxRaw` and submitted by the wallet.
//!
//! Errors from collaborators are returned exactly as received.

mod evm;
mod native;
mod request;


pub use evm::EvmPipeline;
pub use native::{assemble_fee_delegated_tx, NativePipeline};
pub use request::{BroadcastRequest, StepLabels};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chain::messages::to_web3_messages;
use crate::chain::{resolve_addresses, GasAmount, GasEstimator, MessageGasEstimator, ResolvedAddresses, WireMessage};
use crate::config::BroadcastOptions;
use crate::error::BroadcastResult;
use crate::indexer::{PrepareTxRequest, PreparedTransaction, TransactionApi};
use crate::telemetry::{send_and_record, MetricsProvider, NoopMetrics};
use crate::wallet::WalletStrategy;

const DEFAULT_BUCKET: &str = "tx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningProtocol {
    EvmStyle,
    Native,
}

impl SigningProtocol {
    /// Which signer shape the wallet has. No I/O.
    pub fn of(wallet: &WalletStrategy) -> Self {
        match wallet {
            WalletStrategy::Evm(_) => SigningProtocol::EvmStyle,
            WalletStrategy::Native(_) => SigningProtocol::Native,
        }
    }
}

impl fmt::Display for SigningProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningProtocol::EvmStyle => write!(f, "evm"),
            SigningProtocol::Native => write!(f, "native"),
        }
    }
}

/// Everything a pipeline needs for one request, computed before any network
/// call. Owned by that request alone.
pub struct PendingBroadcast<'a> {
    pub request: &'a BroadcastRequest,
    pub addresses: ResolvedAddresses,
    pub gas: GasAmount,
    /// The request's messages in EVM-style wire form, same order
    pub wire_messages: Vec<WireMessage>,
    pub options: &'a BroadcastOptions,
    pub labels: StepLabels,
    pub transaction_api: &'a dyn TransactionApi,
    pub metrics: &'a dyn MetricsProvider,
}

impl PendingBroadcast<'_> {
    /// Preparation is the same call on both paths: the fee payer relationship
    /// is keyed on the `0x` address.
    pub async fn prepare(&self) -> BroadcastResult<PreparedTransaction> {
        let request = PrepareTxRequest {
            memo: self.request.memo.clone(),
            messages: self.wire_messages.clone(),
            address: self.addresses.ethereum_address.clone(),
            chain_id: self.options.ethereum_chain_id,
            gas_limit: self.gas,
            estimate_gas: false,
        };

        debug!("{}: preparing {} message(s)", self.labels.prepare, self.wire_messages.len());
        send_and_record(self.metrics, &self.labels.prepare, self.transaction_api.prepare_tx(request)).await
    }
}

/// One signing protocol's prepare, sign, assemble and submit sequence
#[async_trait]
pub trait BroadcastPipeline: Send + Sync {
    fn protocol(&self) -> SigningProtocol;

    /// Run the sequence, returning the transaction hash
    async fn broadcast(&self, pending: &PendingBroadcast<'_>) -> BroadcastResult<String>;
}

/// Broadcasts messages with the configured wallet
pub struct MsgBroadcaster {
    options: BroadcastOptions,
    transaction_api: Arc<dyn TransactionApi>,
    wallet_strategy: WalletStrategy,
    metrics: Arc<dyn MetricsProvider>,
    estimator: Arc<dyn GasEstimator>,
}

impl MsgBroadcaster {
    pub fn new(
        options: BroadcastOptions,
        transaction_api: Arc<dyn TransactionApi>,
        wallet_strategy: WalletStrategy,
        metrics: Arc<dyn MetricsProvider>,
        estimator: Arc<dyn GasEstimator>,
    ) -> Self {
        Self {
            options,
            transaction_api,
            wallet_strategy,
            metrics,
            estimator,
        }
    }

    /// Broadcaster without metrics, estimating gas by message kind
    pub fn with_defaults(
        options: BroadcastOptions,
        transaction_api: Arc<dyn TransactionApi>,
        wallet_strategy: WalletStrategy,
    ) -> Self {
        Self::new(
            options,
            transaction_api,
            wallet_strategy,
            Arc::new(NoopMetrics),
            Arc::new(MessageGasEstimator),
        )
    }

    pub fn options(&self) -> &BroadcastOptions {
        &self.options
    }

    pub fn protocol(&self) -> SigningProtocol {
        SigningProtocol::of(&self.wallet_strategy)
    }

    fn pipeline(&self) -> Box<dyn BroadcastPipeline> {
        match &self.wallet_strategy {
            WalletStrategy::Evm(signer) => Box::new(EvmPipeline::new(signer.clone())),
            WalletStrategy::Native(signer) => Box::new(NativePipeline::new(signer.clone())),
        }
    }

    /// Broadcast a request and return the transaction hash
    pub async fn broadcast(&self, request: &BroadcastRequest) -> BroadcastResult<String> {
        let pipeline = self.pipeline();
        let addresses = resolve_addresses(&request.address)?;

        let gas = match request.gas_limit {
            Some(gas) => gas,
            None => self.estimator.estimate(request.msgs()),
        };

        let bucket = request.bucket.as_deref().unwrap_or(DEFAULT_BUCKET);
        let pending = PendingBroadcast {
            request,
            addresses,
            gas,
            wire_messages: to_web3_messages(request.msgs()),
            options: &self.options,
            labels: StepLabels::new(bucket),
            transaction_api: self.transaction_api.as_ref(),
            metrics: self.metrics.as_ref(),
        };

        info!(
            "Broadcasting {} message(s) from {} via {} signer (gas {})",
            request.msgs().len(),
            pending.addresses.injective_address,
            pipeline.protocol(),
            gas
        );

        match pipeline.broadcast(&pending).await {
            Ok(tx_hash) => {
                info!("Broadcast succeeded: {}", tx_hash);
                Ok(tx_hash)
            }
            Err(e) => {
                warn!("Broadcast failed: {}", e);
                Err(e)
            }
        }
    }
}
