use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ChainMessage, Coin, MessageKind};
use crate::chain::proto::{self, Any};

/// Move funds from the bank balance into an exchange subaccount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDeposit {
    pub sender: String,
    pub subaccount_id: String,
    pub amount: Coin,
}

impl ChainMessage for MsgDeposit {
    fn type_url(&self) -> &'static str {
        "/injective.exchange.v1beta1.MsgDeposit"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Exchange
    }

    fn web3_fields(&self) -> Value {
        json!({
            "sender": self.sender,
            "subaccount_id": self.subaccount_id,
            "amount": self.amount,
        })
    }

    fn to_any(&self) -> Any {
        let msg = proto::MsgDeposit {
            sender: self.sender.clone(),
            subaccount_id: self.subaccount_id.clone(),
            amount: Some(self.amount.to_proto()),
        };
        Any::pack(self.type_url(), &msg)
    }
}
