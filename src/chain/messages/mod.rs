mod bank;
mod exchange;
mod gov;
mod staking;
mod wasm;

pub use bank::MsgSend;
pub use exchange::MsgDeposit;
pub use gov::{MsgVote, VoteOption};
pub use staking::MsgDelegate;
pub use wasm::MsgExecuteContractCompat;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chain::proto::{self, Any};

/// A message in the EVM-style wire form (amino JSON with an `@type` key), as the
/// transaction preparation service and EIP-712 signers expect it.
pub type WireMessage = Value;

/// Broad message families, used for gas estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Standard,
    Exchange,
    Governance,
    Contract,
}

/// Common behaviour of every message this crate can broadcast
pub trait ChainMessage {
    /// Protobuf type url, e.g. `/cosmos.bank.v1beta1.MsgSend`
    fn type_url(&self) -> &'static str;

    fn kind(&self) -> MessageKind;

    /// Fields of the amino JSON form, without the `@type` key
    fn web3_fields(&self) -> Value;

    /// Protobuf encoding wrapped in `Any`, for SIGN_MODE_DIRECT bodies
    fn to_any(&self) -> Any;

    fn to_web3(&self) -> WireMessage {
        let mut fields = self.web3_fields();
        if let Value::Object(map) = &mut fields {
            map.insert("@type".to_string(), Value::String(self.type_url().to_string()));
        }
        fields
    }
}

/// A denominated amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(amount: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    pub(crate) fn to_proto(&self) -> proto::Coin {
        proto::Coin {
            denom: self.denom.clone(),
            amount: self.amount.clone(),
        }
    }
}

/// Every message the broadcaster accepts.
///
/// Deserialises from `{"type": "send", ...}` so message batches can be read
/// from JSON files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Send(MsgSend),
    Delegate(MsgDelegate),
    ExecuteContract(MsgExecuteContractCompat),
    Deposit(MsgDeposit),
    Vote(MsgVote),
}

impl Message {
    fn inner(&self) -> &dyn ChainMessage {
        match self {
            Message::Send(msg) => msg,
            Message::Delegate(msg) => msg,
            Message::ExecuteContract(msg) => msg,
            Message::Deposit(msg) => msg,
            Message::Vote(msg) => msg,
        }
    }

    pub fn type_url(&self) -> &'static str {
        self.inner().type_url()
    }

    pub fn kind(&self) -> MessageKind {
        self.inner().kind()
    }

    pub fn to_web3(&self) -> WireMessage {
        self.inner().to_web3()
    }

    pub fn to_any(&self) -> Any {
        self.inner().to_any()
    }
}

macro_rules! impl_from_msg {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(impl From<$ty> for Message {
            fn from(msg: $ty) -> Self {
                Message::$variant(msg)
            }
        })*
    };
}

impl_from_msg! {
    Send => MsgSend,
    Delegate => MsgDelegate,
    ExecuteContract => MsgExecuteContractCompat,
    Deposit => MsgDeposit,
    Vote => MsgVote,
}

/// Encode messages to their EVM-style wire form, preserving order
pub fn to_web3_messages(messages: &[Message]) -> Vec<WireMessage> {
    messages.iter().map(Message::to_web3).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_from_json() {
        let json = r#"[
            {"type": "send", "from_address": "inj1a", "to_address": "inj1b",
             "amount": [{"denom": "inj", "amount": "1000"}]},
            {"type": "delegate", "delegator_address": "inj1a",
             "validator_address": "injvaloper1v", "amount": {"denom": "inj", "amount": "5"}}
        ]"#;
        let messages: Vec<Message> = serde_json::from_str(json).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].type_url(), "/cosmos.bank.v1beta1.MsgSend");
        assert_eq!(messages[1].type_url(), "/cosmos.staking.v1beta1.MsgDelegate");
    }

    #[test]
    fn test_web3_encoding_preserves_order() {
        let messages: Vec<Message> = vec![
            MsgDelegate::new("inj1a", "injvaloper1v", Coin::new("5", "inj")).into(),
            MsgSend::new("inj1a", "inj1b", vec![Coin::new("1", "inj")]).into(),
        ];
        let wire = to_web3_messages(&messages);
        assert_eq!(wire[0]["@type"], "/cosmos.staking.v1beta1.MsgDelegate");
        assert_eq!(wire[1]["@type"], "/cosmos.bank.v1beta1.MsgSend");
    }
}
