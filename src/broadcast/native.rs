use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{BroadcastPipeline, PendingBroadcast, SigningProtocol};
use crate::chain::proto::TxRaw;
use crate::error::BroadcastResult;
use crate::indexer::PreparedTransaction;
use crate::telemetry::send_and_record;
use crate::wallet::{CosmosSignRequest, DirectSignResponse, NativeSigner, SendTxOptions};

/// Prepare (for the fee payer), sign natively, assemble both signatures,
/// submit through the signer
pub struct NativePipeline {
    signer: Arc<dyn NativeSigner>,
}

impl NativePipeline {
    pub fn new(signer: Arc<dyn NativeSigner>) -> Self {
        Self { signer }
    }
}

/// The signed transaction with signatures `[fee payer, user]`. Fee-delegation
/// verification matches signatures to signers by position, so this order is
/// fixed.
pub fn assemble_fee_delegated_tx(prepared: &PreparedTransaction, signed: &DirectSignResponse) -> TxRaw {
    TxRaw {
        body_bytes: signed.signed.body_bytes.clone(),
        auth_info_bytes: signed.signed.auth_info_bytes.clone(),
        signatures: vec![prepared.fee_payer_sig.clone(), signed.signature.signature.clone()],
    }
}

#[async_trait]
impl BroadcastPipeline for NativePipeline {
    fn protocol(&self) -> SigningProtocol {
        SigningProtocol::Native
    }

    async fn broadcast(&self, pending: &PendingBroadcast<'_>) -> BroadcastResult<String> {
        let prepared = pending.prepare().await?;
        let address = &pending.addresses.injective_address;

        let sign_request = CosmosSignRequest {
            messages: pending.request.msgs().to_vec(),
            memo: pending.request.memo.clone(),
            gas: pending.gas.to_string(),
            fee_payer: prepared.fee_payer.clone(),
        };

        debug!(
            "{}: requesting direct signature from {} (fee payer {})",
            pending.labels.sign, address, prepared.fee_payer
        );
        let signed = send_and_record(
            pending.metrics,
            &pending.labels.sign,
            self.signer.sign_transaction(sign_request, address),
        )
        .await?;

        let tx = assemble_fee_delegated_tx(&prepared, &signed);
        let options = SendTxOptions {
            chain_id: pending.options.chain_id.clone(),
            address: address.clone(),
        };

        debug!("{}: submitting", pending.labels.broadcast);
        send_and_record(
            pending.metrics,
            &pending.labels.broadcast,
            self.signer.send_transaction(tx, options),
        )
        .await
    }
}
