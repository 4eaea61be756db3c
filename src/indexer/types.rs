use serde::{Deserialize, Deserializer, Serialize};

use crate::chain::{GasAmount, WireMessage};

/// Input of transaction preparation. Messages are always in their EVM-style
/// wire form, whichever protocol ends up signing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareTxRequest {
    pub memo: String,
    #[serde(rename = "message")]
    pub messages: Vec<WireMessage>,
    /// `0x` address of the account the fee payer sponsors
    pub address: String,
    /// EVM chain id, as used in the EIP-712 domain
    pub chain_id: u64,
    pub gas_limit: GasAmount,
    pub estimate_gas: bool,
}

/// Handle returned by preparation. Created per request, never cached.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedTransaction {
    /// EIP-712 typed data (JSON text) describing the transaction
    pub data: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub sign_mode: String,
    #[serde(default)]
    pub pub_key_type: String,
    pub fee_payer: String,
    /// The relayer's signature over the transaction, decoded from `0x` hex
    #[serde(deserialize_with = "de_hex_bytes")]
    pub fee_payer_sig: Vec<u8>,
}

/// Submission of an EIP-712 signed transaction through the web3 gateway
#[derive(Debug, Clone, PartialEq)]
pub struct Web3BroadcastRequest {
    pub chain_id: u64,
    /// `0x` hex `r || s || v` signature
    pub signature: String,
    pub tx: PreparedTransaction,
    pub messages: Vec<WireMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Web3BroadcastResponse {
    pub tx_hash: String,
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub raw_log: String,
}

fn de_hex_bytes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(deserializer)?;
    hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
}
