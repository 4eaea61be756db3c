//! Explorer REST API: blocks and transactions.
//!
//! Single-record lookups that the server answers with 404 become
//! `BlockNotFound`/`TransactionNotFound`; every other failure is `Http`.

mod types;

pub use types::{Block, ExplorerTransaction, Page, PageQuery, DEFAULT_PAGINATION_TOTAL_COUNT};

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::{BroadcastError, BroadcastResult};
use types::{DataResponse, PagedResponse};

#[derive(Clone)]
pub struct ExplorerApi {
    client: Client,
    endpoint: String,
}

impl ExplorerApi {
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

    /// GET `path`. `Ok(None)` means the server answered 404.
    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> BroadcastResult<Option<T>> {
        let url = format!("{}/{}", self.endpoint, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| BroadcastError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BroadcastError::Http(format!("{} from {}: {}", status, url, text)));
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| BroadcastError::Http(format!("Malformed response from {}: {}", url, e)))
    }

    async fn get_page<T: DeserializeOwned>(&self, path: &str, page: PageQuery) -> BroadcastResult<Page<T>> {
        let response: Option<PagedResponse<T>> = self.get(path, &page.to_query()).await?;
        response
            .map(PagedResponse::into_page)
            .ok_or_else(|| BroadcastError::Http(format!("{} not found", path)))
    }

    /// A block with its transactions, by height or hash
    pub async fn fetch_block(&self, block: &str) -> BroadcastResult<Block> {
        let response: Option<DataResponse<Block>> = self.get(&format!("blocks/{}", block), &[]).await?;
        response
            .map(|r| r.data)
            .ok_or_else(|| BroadcastError::BlockNotFound(block.to_string()))
    }

    /// Latest blocks, without their transactions
    pub async fn fetch_blocks(&self, page: PageQuery) -> BroadcastResult<Page<Block>> {
        let mut blocks = self.fetch_blocks_with_tx(page).await?;
        for block in blocks.data.iter_mut() {
            block.txs.clear();
        }
        Ok(blocks)
    }

    /// Latest blocks with the transactions the listing embeds
    pub async fn fetch_blocks_with_tx(&self, page: PageQuery) -> BroadcastResult<Page<Block>> {
        self.get_page("blocks", page).await
    }

    /// Latest transactions across all accounts
    pub async fn fetch_transactions(&self, page: PageQuery) -> BroadcastResult<Page<ExplorerTransaction>> {
        self.get_page("txs", page).await
    }

    pub async fn fetch_account_transactions(
        &self,
        address: &str,
        page: PageQuery,
    ) -> BroadcastResult<Page<ExplorerTransaction>> {
        self.get_page(&format!("accountTxs/{}", address), page).await
    }

    pub async fn fetch_transaction(&self, tx_hash: &str) -> BroadcastResult<ExplorerTransaction> {
        let response: Option<DataResponse<ExplorerTransaction>> =
            self.get(&format!("txs/{}", tx_hash), &[]).await?;
        response
            .map(|r| r.data)
            .ok_or_else(|| BroadcastError::TransactionNotFound(tx_hash.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers every request with `status` and `body`. Returns the base url
    /// and a request counter.
    async fn serve(status: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}/api/explorer/v1", addr), hits)
    }

    #[tokio::test]
    async fn test_transport_failures_are_http_errors() {
        let explorer = ExplorerApi::new("http://127.0.0.1:9/api/explorer/v1/", 1).unwrap();

        let err = explorer.fetch_block("100").await.unwrap_err();
        assert!(matches!(err, BroadcastError::Http(_)));
        assert!(!err.is_not_found());

        let err = explorer.fetch_transaction("0xabc").await.unwrap_err();
        assert!(matches!(err, BroadcastError::Http(_)));
    }

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let (url, _) = serve("404 Not Found", r#"{"error": "not found"}"#).await;
        let explorer = ExplorerApi::new(url, 5).unwrap();

        let err = explorer.fetch_block("100").await.unwrap_err();
        assert_eq!(err, BroadcastError::BlockNotFound("100".to_string()));
        assert!(err.is_not_found());

        let err = explorer.fetch_transaction("0xabc").await.unwrap_err();
        assert_eq!(err, BroadcastError::TransactionNotFound("0xabc".to_string()));

        // Listings have no record to miss
        let err = explorer.fetch_transactions(PageQuery::default()).await.unwrap_err();
        assert!(matches!(err, BroadcastError::Http(_)));
    }

    #[tokio::test]
    async fn test_server_errors_are_http_errors() {
        let (url, _) = serve("500 Internal Server Error", "{}").await;
        let explorer = ExplorerApi::new(url, 5).unwrap();

        let err = explorer.fetch_block("100").await.unwrap_err();
        assert!(matches!(err, BroadcastError::Http(_)));
        let err = explorer.fetch_transaction("0xabc").await.unwrap_err();
        assert!(matches!(err, BroadcastError::Http(_)));
    }

    #[tokio::test]
    async fn test_blocks_with_tx_is_one_request() {
        let (url, hits) = serve(
            "200 OK",
            r#"{"paging": {"total": 0}, "data": [
                {"height": 11, "num_txs": 1, "txs": [{"hash": "0xaa", "block_number": 11}]},
                {"height": 10, "num_txs": 0, "txs": null}
            ]}"#,
        )
        .await;
        let explorer = ExplorerApi::new(url, 5).unwrap();

        let page = explorer.fetch_blocks_with_tx(PageQuery::limit(2)).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(page.total, DEFAULT_PAGINATION_TOTAL_COUNT);
        assert_eq!(page.data[0].txs[0].hash, "0xaa");
        assert!(page.data[1].txs.is_empty());

        let page = explorer.fetch_blocks(PageQuery::limit(2)).await.unwrap();
        assert!(page.data.iter().all(|block| block.txs.is_empty()));
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let (url, _) = serve("200 OK", r#"{"paging": {"total": 0}, "data": null}"#).await;
        let explorer = ExplorerApi::new(url, 5).unwrap();

        let page = explorer
            .fetch_account_transactions("inj1abc", PageQuery::default())
            .await
            .unwrap();
        assert!(page.data.is_empty());
    }
}
