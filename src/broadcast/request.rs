use crate::chain::{GasAmount, Message};
use crate::error::{BroadcastError, BroadcastResult};

/// One broadcast: a non-empty, ordered batch of messages from one account
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastRequest {
    msgs: Vec<Message>,
    pub memo: String,
    /// Explicit gas limit. When absent the broadcaster's estimator decides.
    pub gas_limit: Option<GasAmount>,
    /// `0x` or `inj1` address of the signing account
    pub address: String,
    /// Metrics grouping, e.g. `swap` yields `swapPrepareTx`
    pub bucket: Option<String>,
}

impl BroadcastRequest {
    pub fn new(msgs: impl Into<Vec<Message>>, address: impl Into<String>) -> BroadcastResult<Self> {
        let msgs = msgs.into();
        if msgs.is_empty() {
            return Err(BroadcastError::InvalidRequest(
                "at least one message is required".to_string(),
            ));
        }

        Ok(Self {
            msgs,
            memo: String::new(),
            gas_limit: None,
            address: address.into(),
            bucket: None,
        })
    }

    pub fn single(msg: impl Into<Message>, address: impl Into<String>) -> Self {
        Self {
            msgs: vec![msg.into()],
            memo: String::new(),
            gas_limit: None,
            address: address.into(),
            bucket: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_gas_limit(mut self, gas: impl Into<GasAmount>) -> Self {
        self.gas_limit = Some(gas.into());
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn msgs(&self) -> &[Message] {
        &self.msgs
    }
}

/// Metrics labels for the three network-bound steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLabels {
    pub prepare: String,
    pub sign: String,
    pub broadcast: String,
}

impl StepLabels {
    pub fn new(bucket: &str) -> Self {
        Self {
            prepare: format!("{}PrepareTx", bucket),
            sign: format!("{}SignTx", bucket),
            broadcast: format!("{}BroadcastTx", bucket),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::messages::MsgSend;
    use crate::chain::Coin;

    fn send() -> Message {
        MsgSend::new("inj1a", "inj1b", vec![Coin::new("1", "inj")]).into()
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let err = BroadcastRequest::new(Vec::<Message>::new(), "inj1a").unwrap_err();
        assert!(matches!(err, BroadcastError::InvalidRequest(_)));
    }

    #[test]
    fn test_builder() {
        let request = BroadcastRequest::new(vec![send(), send()], "inj1a")
            .unwrap()
            .with_memo("batch")
            .with_gas_limit(150_000)
            .with_bucket("swap");
        assert_eq!(request.msgs().len(), 2);
        assert_eq!(request.gas_limit, Some(GasAmount(150_000)));
        assert_eq!(request.bucket.as_deref(), Some("swap"));
        assert_eq!(BroadcastRequest::single(send(), "inj1a").msgs().len(), 1);
    }

    #[test]
    fn test_step_labels() {
        let labels = StepLabels::new("swap");
        assert_eq!(labels.prepare, "swapPrepareTx");
        assert_eq!(labels.sign, "swapSignTx");
        assert_eq!(labels.broadcast, "swapBroadcastTx");
    }
}
