use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ChainMessage, Coin, MessageKind};
use crate::chain::proto::{self, Any};

/// Transfer of one or more coins between two accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSend {
    pub from_address: String,
    pub to_address: String,
    pub amount: Vec<Coin>,
}

impl MsgSend {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: Vec<Coin>) -> Self {
        Self {
            from_address: from.into(),
            to_address: to.into(),
            amount,
        }
    }
}

impl ChainMessage for MsgSend {
    fn type_url(&self) -> &'static str {
        "/cosmos.bank.v1beta1.MsgSend"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Standard
    }

    fn web3_fields(&self) -> Value {
        json!({
            "from_address": self.from_address,
            "to_address": self.to_address,
            "amount": self.amount,
        })
    }

    fn to_any(&self) -> Any {
        let msg = proto::MsgSend {
            from_address: self.from_address.clone(),
            to_address: self.to_address.clone(),
            amount: self.amount.iter().map(Coin::to_proto).collect(),
        };
        Any::pack(self.type_url(), &msg)
    }
}
