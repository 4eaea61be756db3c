//! Client for the indexer's transaction service: fee-delegated preparation and
//! web3 (EIP-712) broadcast.

mod types;

pub use types::{PrepareTxRequest, PreparedTransaction, Web3BroadcastRequest, Web3BroadcastResponse};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{BroadcastError, BroadcastResult};

/// The transaction preparation service and its web3 broadcast rail
#[async_trait]
pub trait TransactionApi: Send + Sync {
    /// Failures are reported as [`BroadcastError::Preparation`]
    async fn prepare_tx(&self, request: PrepareTxRequest) -> BroadcastResult<PreparedTransaction>;

    /// Failures are reported as [`BroadcastError::Submission`]
    async fn broadcast_tx(&self, request: Web3BroadcastRequest) -> BroadcastResult<Web3BroadcastResponse>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastTxBody<'a> {
    chain_id: u64,
    /// the prepared EIP-712 payload, as returned by preparation
    tx: &'a str,
    msgs: &'a [Value],
    pub_key: PubKeyBody<'a>,
    signature: &'a str,
    fee_payer: &'a str,
    fee_payer_sig: String,
    mode: &'static str,
}

#[derive(Debug, Serialize)]
struct PubKeyBody<'a> {
    #[serde(rename = "type")]
    key_type: &'a str,
}

#[derive(Clone)]
pub struct IndexerTransactionApi {
    client: Client,
    base_url: String,
}

impl IndexerTransactionApi {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> BroadcastResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BroadcastError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/api/exchange/web3gw/v1/{}", self.base_url, method)
    }
}

#[async_trait]
impl TransactionApi for IndexerTransactionApi {
    async fn prepare_tx(&self, request: PrepareTxRequest) -> BroadcastResult<PreparedTransaction> {
        let preparation = BroadcastError::Preparation;
        debug!("Preparing transaction with {} message(s) for {}", request.messages.len(), request.address);

        let response = self
            .client
            .post(self.url("prepareTx"))
            .json(&request)
            .send()
            .await
            .map_err(|e| preparation(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(preparation(format!("{}: {}", status, error_text)));
        }

        response
            .json::<PreparedTransaction>()
            .await
            .map_err(|e| preparation(format!("Malformed prepare response: {}", e)))
    }

    async fn broadcast_tx(&self, request: Web3BroadcastRequest) -> BroadcastResult<Web3BroadcastResponse> {
        let submission = BroadcastError::Submission;

        let body = BroadcastTxBody {
            chain_id: request.chain_id,
            tx: &request.tx.data,
            msgs: &request.messages,
            pub_key: PubKeyBody {
                key_type: &request.tx.pub_key_type,
            },
            signature: &request.signature,
            fee_payer: &request.tx.fee_payer,
            fee_payer_sig: format!("0x{}", hex::encode(&request.tx.fee_payer_sig)),
            mode: "sync",
        };

        let response = self
            .client
            .post(self.url("broadcastTx"))
            .json(&body)
            .send()
            .await
            .map_err(|e| submission(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(submission(format!("{}: {}", status, error_text)));
        }

        let broadcast: Web3BroadcastResponse = response
            .json()
            .await
            .map_err(|e| submission(format!("Malformed broadcast response: {}", e)))?;

        if broadcast.code != 0 {
            return Err(submission(format!("code {}: {}", broadcast.code, broadcast.raw_log)));
        }

        info!("Web3 broadcast accepted: {}", broadcast.tx_hash);
        Ok(broadcast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::GasAmount;

    fn prepare_request() -> PrepareTxRequest {
        PrepareTxRequest {
            memo: String::new(),
            messages: vec![],
            address: "0x9858effd232b4033e47d90003d41ec34ecaeda94".to_string(),
            chain_id: 1439,
            gas_limit: GasAmount(200_000),
            estimate_gas: false,
        }
    }

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let api = IndexerTransactionApi::new("https://indexer.example/", 5).unwrap();
        assert_eq!(api.url("prepareTx"), "https://indexer.example/api/exchange/web3gw/v1/prepareTx");
    }

    #[tokio::test]
    async fn test_unreachable_indexer_is_a_preparation_error() {
        let api = IndexerTransactionApi::new("http://127.0.0.1:9", 1).unwrap();
        let err = api.prepare_tx(prepare_request()).await.unwrap_err();
        assert!(matches!(err, BroadcastError::Preparation(_)));
    }

    #[tokio::test]
    async fn test_unreachable_indexer_is_a_submission_error_on_broadcast() {
        let api = IndexerTransactionApi::new("http://127.0.0.1:9", 1).unwrap();
        let request = Web3BroadcastRequest {
            chain_id: 1439,
            signature: "0x00".to_string(),
            tx: PreparedTransaction {
                data: "{}".to_string(),
                nonce: 0,
                sign_mode: String::new(),
                pub_key_type: String::new(),
                fee_payer: "inj1fee".to_string(),
                fee_payer_sig: vec![1],
            },
            messages: vec![],
        };
        let err = api.broadcast_tx(request).await.unwrap_err();
        assert!(matches!(err, BroadcastError::Submission(_)));
    }
}
