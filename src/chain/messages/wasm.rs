use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ChainMessage, Coin, MessageKind};
use crate::chain::proto::{self, Any};

/// CosmWasm execution in Injective's EIP-712 friendly form: the contract message
/// is carried as a JSON string and funds as a comma-separated coin list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgExecuteContractCompat {
    pub sender: String,
    pub contract: String,
    pub msg: Value,
    #[serde(default)]
    pub funds: Vec<Coin>,
}

impl MsgExecuteContractCompat {
    pub fn new(sender: impl Into<String>, contract: impl Into<String>, msg: Value) -> Self {
        Self {
            sender: sender.into(),
            contract: contract.into(),
            msg,
            funds: vec![],
        }
    }

    pub fn with_funds(mut self, funds: Vec<Coin>) -> Self {
        self.funds = funds;
        self
    }

    /// `"0"` when no funds are attached, as the chain expects
    fn funds_string(&self) -> String {
        if self.funds.is_empty() {
            return "0".to_string();
        }
        self.funds
            .iter()
            .map(|coin| format!("{}{}", coin.amount, coin.denom))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl ChainMessage for MsgExecuteContractCompat {
    fn type_url(&self) -> &'static str {
        "/injective.wasmx.v1.MsgExecuteContractCompat"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Contract
    }

    fn web3_fields(&self) -> Value {
        json!({
            "sender": self.sender,
            "contract": self.contract,
            "msg": self.msg.to_string(),
            "funds": self.funds_string(),
        })
    }

    fn to_any(&self) -> Any {
        let msg = proto::MsgExecuteContractCompat {
            sender: self.sender.clone(),
            contract: self.contract.clone(),
            msg: self.msg.to_string(),
            funds: self.funds_string(),
        };
        Any::pack(self.type_url(), &msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funds_string() {
        let msg = MsgExecuteContractCompat::new("inj1s", "inj1c", json!({"claim": {}}));
        assert_eq!(msg.funds_string(), "0");

        let msg = msg.with_funds(vec![Coin::new("10", "inj"), Coin::new("3", "peggy0xdac")]);
        assert_eq!(msg.funds_string(), "10inj,3peggy0xdac");
    }

    #[test]
    fn test_contract_msg_is_stringified() {
        let msg = MsgExecuteContractCompat::new("inj1s", "inj1c", json!({"claim": {"epoch": 3}}));
        let web3 = msg.to_web3();
        assert_eq!(web3["msg"], r#"{"claim":{"epoch":3}}"#);
        assert_eq!(web3["@type"], "/injective.wasmx.v1.MsgExecuteContractCompat");
    }
}
