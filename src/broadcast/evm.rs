use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{BroadcastPipeline, PendingBroadcast, SigningProtocol};
use crate::error::BroadcastResult;
use crate::indexer::Web3BroadcastRequest;
use crate::telemetry::send_and_record;
use crate::wallet::EvmSigner;

/// Prepare, sign the EIP-712 payload, submit through the signer
pub struct EvmPipeline {
    signer: Arc<dyn EvmSigner>,
}

impl EvmPipeline {
    pub fn new(signer: Arc<dyn EvmSigner>) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl BroadcastPipeline for EvmPipeline {
    fn protocol(&self) -> SigningProtocol {
        SigningProtocol::EvmStyle
    }

    async fn broadcast(&self, pending: &PendingBroadcast<'_>) -> BroadcastResult<String> {
        let prepared = pending.prepare().await?;
        let address = &pending.addresses.ethereum_address;

        debug!("{}: requesting signature from {}", pending.labels.sign, address);
        let signature = send_and_record(
            pending.metrics,
            &pending.labels.sign,
            self.signer.sign_transaction(&prepared, address),
        )
        .await?;

        let request = Web3BroadcastRequest {
            chain_id: pending.options.ethereum_chain_id,
            signature,
            tx: prepared,
            messages: pending.wire_messages.clone(),
        };

        debug!("{}: submitting", pending.labels.broadcast);
        let response = send_and_record(
            pending.metrics,
            &pending.labels.broadcast,
            self.signer.send_transaction(request),
        )
        .await?;

        Ok(response.tx_hash)
    }
}
