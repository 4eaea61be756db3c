//! REST client for a chain node (LCD): account lookup, raw transaction
//! submission and polling for inclusion.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use prost::Message;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::account_types::{decode_account_response, AccountInfo};
use super::proto::TxRaw;
use crate::error::{BroadcastError, BroadcastResult};

#[derive(Debug, Serialize)]
struct BroadcastTxBody {
    tx_bytes: String,
    mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct BroadcastTxEnvelope {
    tx_response: TxResponse,
}

#[derive(Debug, Deserialize)]
struct GetTxEnvelope {
    tx_response: TxResponse,
}

/// The subset of `cosmos.base.abci.v1beta1.TxResponse` this crate reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxResponse {
    pub txhash: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default)]
    pub codespace: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub gas_used: String,
}

#[derive(Clone)]
pub struct TxRestClient {
    client: Client,
    endpoint: String,
}

impl TxRestClient {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> BroadcastResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BroadcastError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    /// Query account number and sequence. A fresh account that the chain has
    /// never seen yields zeroes.
    pub async fn query_account(&self, address: &str) -> BroadcastResult<AccountInfo> {
        let url = format!("{}/cosmos/auth/v1beta1/accounts/{}", self.endpoint, address);
        let response = self.client.get(&url).send().await.map_err(http_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            info!("Account not found, using default info for new account: {}", address);
            return Ok(AccountInfo {
                address: address.to_string(),
                ..Default::default()
            });
        }

        let body = checked_text(response).await?;
        let account = decode_account_response(&body)?;
        debug!("Decoded account type: {}", account.account_type());

        match account.get_account_info() {
            Some(info) => Ok(info),
            None => {
                warn!("Account type {} has no base account, using defaults", account.account_type());
                Ok(AccountInfo {
                    address: address.to_string(),
                    ..Default::default()
                })
            }
        }
    }

    /// Submit a signed transaction in sync mode. Returns the hash once the node
    /// has accepted the transaction into its mempool; inclusion is not awaited.
    pub async fn broadcast_tx(&self, tx_raw: &TxRaw) -> BroadcastResult<String> {
        let url = format!("{}/cosmos/tx/v1beta1/txs", self.endpoint);
        let body = BroadcastTxBody {
            tx_bytes: BASE64.encode(tx_raw.encode_to_vec()),
            mode: "BROADCAST_MODE_SYNC",
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BroadcastError::Submission(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BroadcastError::Submission(format!("{}: {}", status, text)));
        }

        let envelope: BroadcastTxEnvelope = response
            .json()
            .await
            .map_err(|e| BroadcastError::Submission(format!("Malformed broadcast response: {}", e)))?;
        let tx_response = envelope.tx_response;

        if tx_response.code != 0 {
            return Err(BroadcastError::Submission(format!(
                "code {} ({}): {}",
                tx_response.code, tx_response.codespace, tx_response.raw_log
            )));
        }

        info!("Transaction accepted by node: {}", tx_response.txhash);
        Ok(tx_response.txhash)
    }

    /// Look up a transaction by hash
    pub async fn fetch_tx(&self, tx_hash: &str) -> BroadcastResult<TxResponse> {
        let url = format!("{}/cosmos/tx/v1beta1/txs/{}", self.endpoint, tx_hash);
        let response = self.client.get(&url).send().await.map_err(http_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BroadcastError::TransactionNotFound(tx_hash.to_string()));
        }

        let body = checked_text(response).await?;
        let envelope: GetTxEnvelope = serde_json::from_str(&body)
            .map_err(|e| BroadcastError::Http(format!("Malformed tx response: {}", e)))?;
        Ok(envelope.tx_response)
    }

    /// Poll until the transaction is included in a block or `timeout` elapses.
    /// A transaction included with a non-zero code is a submission failure.
    pub async fn fetch_tx_poll(
        &self,
        tx_hash: &str,
        interval: Duration,
        timeout: Duration,
    ) -> BroadcastResult<TxResponse> {
        let started = Instant::now();

        loop {
            match self.fetch_tx(tx_hash).await {
                Ok(tx) if tx.code == 0 => return Ok(tx),
                Ok(tx) => {
                    return Err(BroadcastError::Submission(format!(
                        "Transaction {} failed on chain with code {}: {}",
                        tx_hash, tx.code, tx.raw_log
                    )))
                }
                Err(BroadcastError::TransactionNotFound(_)) => {
                    debug!("Transaction {} not yet included", tx_hash);
                }
                Err(e) => warn!("Polling for {} failed: {}", tx_hash, e),
            }

            if started.elapsed() + interval > timeout {
                return Err(BroadcastError::Timeout {
                    operation: format!("inclusion of {}", tx_hash),
                });
            }
            tokio::time::sleep(interval).await;
        }
    }
}

fn http_error(e: reqwest::Error) -> BroadcastError {
    BroadcastError::Http(e.to_string())
}

async fn checked_text(response: reqwest::Response) -> BroadcastResult<String> {
    let status = response.status();
    let text = response.text().await.map_err(http_error)?;
    if !status.is_success() {
        return Err(BroadcastError::Http(format!("{}: {}", status, text)));
    }
    Ok(text)
}

/// Hex-encoded uppercase SHA-256 of the encoded transaction, which is how
/// Tendermint names transactions
pub fn tx_hash(tx_raw: &TxRaw) -> String {
    use sha2::{Digest, Sha256};
    hex::encode_upper(Sha256::digest(tx_raw.encode_to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_hash_format() {
        let tx = TxRaw {
            body_bytes: vec![1, 2, 3],
            auth_info_bytes: vec![4, 5],
            signatures: vec![vec![6], vec![7]],
        };
        let hash = tx_hash(&tx);
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash.to_uppercase());
        assert_eq!(hash, tx_hash(&tx.clone()));
    }

    #[test]
    fn test_decode_tx_response() {
        let body = r#"{"tx_response": {"txhash": "ABC", "code": 5,
            "raw_log": "insufficient funds", "codespace": "sdk", "height": "0"}}"#;
        let envelope: BroadcastTxEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.tx_response.code, 5);
        assert_eq!(envelope.tx_response.raw_log, "insufficient funds");
    }

    #[tokio::test]
    async fn test_poll_times_out_against_unreachable_node() {
        let client = TxRestClient::new("http://127.0.0.1:9", 1).unwrap();
        let err = client
            .fetch_tx_poll("ABC", Duration::from_millis(10), Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, BroadcastError::Timeout { .. }));
    }
}
