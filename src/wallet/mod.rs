//! Signer capabilities.
//!
//! A wallet is either an EVM-style signer (EIP-712 over the prepared payload,
//! submitted through the web3 gateway) or a native signer (SIGN_MODE_DIRECT,
//! submitted to a node). [`WalletStrategy`] holds exactly one of them.

pub mod eip712;
pub mod keys;
pub mod local;
pub mod signer;

pub use keys::InjectiveWallet;
pub use local::{LocalEvmSigner, LocalNativeSigner};
pub use signer::TransactionSigner;

use async_trait::async_trait;
use std::sync::Arc;

use crate::chain::proto::{SignDoc, TxRaw};
use crate::chain::{GasAmount, Message};
use crate::error::BroadcastResult;
use crate::indexer::{PreparedTransaction, Web3BroadcastRequest, Web3BroadcastResponse};

#[async_trait]
pub trait EvmSigner: Send + Sync {
    /// `0x` addresses this signer can sign for
    async fn accounts(&self) -> BroadcastResult<Vec<String>>;

    /// Sign the prepared EIP-712 payload, returning a `0x` hex signature.
    /// A declined signature is [`crate::BroadcastError::SigningRejected`].
    async fn sign_transaction(&self, prepared: &PreparedTransaction, address: &str) -> BroadcastResult<String>;

    async fn send_transaction(&self, request: Web3BroadcastRequest) -> BroadcastResult<Web3BroadcastResponse>;
}

#[async_trait]
pub trait NativeSigner: Send + Sync {
    /// `inj1` addresses this signer can sign for
    async fn accounts(&self) -> BroadcastResult<Vec<String>>;

    async fn sign_transaction(&self, request: CosmosSignRequest, address: &str) -> BroadcastResult<DirectSignResponse>;

    /// Submit a fully signed transaction, returning its hash
    async fn send_transaction(&self, tx: TxRaw, options: SendTxOptions) -> BroadcastResult<String>;
}

/// What a native wallet is asked to sign
#[derive(Debug, Clone, PartialEq)]
pub struct CosmosSignRequest {
    /// Messages in their original form, not wire-encoded
    pub messages: Vec<Message>,
    pub memo: String,
    /// Decimal gas limit
    pub gas: String,
    pub fee_payer: String,
}

impl CosmosSignRequest {
    pub fn gas_amount(&self) -> Option<GasAmount> {
        self.gas.parse().ok().map(GasAmount)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StdSignature {
    pub pub_key: Vec<u8>,
    pub signature: Vec<u8>,
}

/// A native wallet's answer: the document it actually signed (wallets may
/// adjust it) and the signature over it
#[derive(Debug, Clone, PartialEq)]
pub struct DirectSignResponse {
    pub signed: SignDoc,
    pub signature: StdSignature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTxOptions {
    pub chain_id: String,
    pub address: String,
}

/// The configured wallet. Exactly one signer shape is active.
#[derive(Clone)]
pub enum WalletStrategy {
    Evm(Arc<dyn EvmSigner>),
    Native(Arc<dyn NativeSigner>),
}

impl WalletStrategy {
    pub fn evm(signer: impl EvmSigner + 'static) -> Self {
        WalletStrategy::Evm(Arc::new(signer))
    }

    pub fn native(signer: impl NativeSigner + 'static) -> Self {
        WalletStrategy::Native(Arc::new(signer))
    }

    pub async fn accounts(&self) -> BroadcastResult<Vec<String>> {
        match self {
            WalletStrategy::Evm(signer) => signer.accounts().await,
            WalletStrategy::Native(signer) => signer.accounts().await,
        }
    }
}

impl std::fmt::Debug for WalletStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletStrategy::Evm(_) => f.write_str("WalletStrategy::Evm"),
            WalletStrategy::Native(_) => f.write_str("WalletStrategy::Native"),
        }
    }
}
