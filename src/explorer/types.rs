use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Reported instead of a zero total, which the explorer returns for
/// collections it does not count
pub const DEFAULT_PAGINATION_TOTAL_COUNT: u64 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    #[serde(default)]
    pub proposer: String,
    #[serde(default)]
    pub moniker: String,
    #[serde(default)]
    pub block_hash: String,
    #[serde(default)]
    pub parent_hash: String,
    #[serde(default)]
    pub num_txs: u64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub txs: Vec<ExplorerTransaction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorerTransaction {
    pub hash: String,
    #[serde(default)]
    pub block_number: u64,
    #[serde(default)]
    pub block_timestamp: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub codespace: String,
    #[serde(default)]
    pub gas_wanted: u64,
    #[serde(default)]
    pub gas_used: u64,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub tx_type: String,
    #[serde(default)]
    pub messages: Value,
}

impl ExplorerTransaction {
    pub fn succeeded(&self) -> bool {
        self.code == 0
    }
}

/// One page of a collection
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
}

/// `before`/`limit`/`skip` as the explorer understands them. Unset fields
/// use the server's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// Only records below this block height
    pub before: Option<u64>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

impl PageQuery {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn before(mut self, height: u64) -> Self {
        self.before = Some(height);
        self
    }

    pub(crate) fn to_query(self) -> Vec<(&'static str, String)> {
        let mut query = vec![];
        if let Some(before) = self.before {
            query.push(("before", before.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(skip) = self.skip {
            query.push(("skip", skip.to_string()));
        }
        query
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Paging {
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct PagedResponse<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub data: Vec<T>,
    pub paging: Option<Paging>,
}

impl<T> PagedResponse<T> {
    pub fn into_page(self) -> Page<T> {
        let total = match self.paging.map(|p| p.total) {
            Some(total) if total > 0 => total,
            _ => DEFAULT_PAGINATION_TOTAL_COUNT,
        };
        Page { data: self.data, total }
    }
}

/// Empty collections come back as `"data": null`
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
pub(crate) struct DataResponse<T> {
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total_falls_back_to_default() {
        let response: PagedResponse<Block> =
            serde_json::from_str(r#"{"paging": {"total": 0}, "data": [{"height": 5}]}"#).unwrap();
        let page = response.into_page();
        assert_eq!(page.total, DEFAULT_PAGINATION_TOTAL_COUNT);
        assert_eq!(page.data[0].height, 5);

        let response: PagedResponse<Block> =
            serde_json::from_str(r#"{"paging": {"total": 42}, "data": []}"#).unwrap();
        assert_eq!(response.into_page().total, 42);
    }

    #[test]
    fn test_null_data_is_an_empty_page() {
        let response: PagedResponse<Block> =
            serde_json::from_str(r#"{"paging": {"total": 0}, "data": null}"#).unwrap();
        let page = response.into_page();
        assert!(page.data.is_empty());
        assert_eq!(page.total, DEFAULT_PAGINATION_TOTAL_COUNT);

        let response: PagedResponse<ExplorerTransaction> = serde_json::from_str(r#"{"paging": {"total": 3}}"#).unwrap();
        assert!(response.into_page().data.is_empty());
    }

    #[test]
    fn test_page_query() {
        assert!(PageQuery::default().to_query().is_empty());
        assert_eq!(PageQuery::limit(10).to_query(), vec![("limit", "10".to_string())]);
        assert_eq!(
            PageQuery::limit(10).before(500).to_query(),
            vec![("before", "500".to_string()), ("limit", "10".to_string())]
        );
    }

    #[test]
    fn test_transaction_outcome() {
        let tx: ExplorerTransaction =
            serde_json::from_str(r#"{"hash": "0xabc", "block_number": 10, "code": 5}"#).unwrap();
        assert!(!tx.succeeded());
    }
}
