use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ChainMessage, Coin, MessageKind};
use crate::chain::proto::{self, Any};

/// Stake INJ with a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDelegate {
    pub delegator_address: String,
    pub validator_address: String,
    pub amount: Coin,
}

impl MsgDelegate {
    pub fn new(delegator: impl Into<String>, validator: impl Into<String>, amount: Coin) -> Self {
        Self {
            delegator_address: delegator.into(),
            validator_address: validator.into(),
            amount,
        }
    }
}

impl ChainMessage for MsgDelegate {
    fn type_url(&self) -> &'static str {
        "/cosmos.staking.v1beta1.MsgDelegate"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Standard
    }

    fn web3_fields(&self) -> Value {
        json!({
            "delegator_address": self.delegator_address,
            "validator_address": self.validator_address,
            "amount": self.amount,
        })
    }

    fn to_any(&self) -> Any {
        let msg = proto::MsgDelegate {
            delegator_address: self.delegator_address.clone(),
            validator_address: self.validator_address.clone(),
            amount: Some(self.amount.to_proto()),
        };
        Any::pack(self.type_url(), &msg)
    }
}
