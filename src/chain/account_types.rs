//! Polymorphic account decoding for the auth module's REST responses.
//!
//! `/cosmos/auth/v1beta1/accounts/{address}` returns the account wrapped in an
//! `@type`-tagged object. Injective accounts are usually `EthAccount`, which
//! nests a `BaseAccount`; vesting accounts nest it one level deeper.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;

use crate::error::{BroadcastError, BroadcastResult};

#[derive(Debug, Clone, Deserialize)]
pub struct BaseAccount {
    pub address: String,
    #[serde(default)]
    pub pub_key: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "de_u64_string")]
    pub account_number: u64,
    #[serde(default, deserialize_with = "de_u64_string")]
    pub sequence: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaseVestingAccount {
    pub base_account: BaseAccount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "@type")]
pub enum Account {
    #[serde(rename = "/cosmos.auth.v1beta1.BaseAccount")]
    Base(BaseAccount),

    #[serde(rename = "/injective.types.v1beta1.EthAccount")]
    Eth {
        base_account: BaseAccount,
        #[serde(default)]
        code_hash: Option<String>,
    },

    #[serde(
        rename = "/cosmos.vesting.v1beta1.ContinuousVestingAccount",
        alias = "/cosmos.vesting.v1beta1.DelayedVestingAccount",
        alias = "/cosmos.vesting.v1beta1.PeriodicVestingAccount",
        alias = "/cosmos.vesting.v1beta1.PermanentLockedAccount"
    )]
    Vesting { base_vesting_account: BaseVestingAccount },

    #[serde(other)]
    Unsupported,
}

/// The fields a signer needs from any account type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub address: String,
    pub account_number: u64,
    pub sequence: u64,
    /// Raw key bytes, once the account has signed at least one transaction
    pub pub_key: Option<Vec<u8>>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account: Account,
}

impl Account {
    pub fn base(&self) -> Option<&BaseAccount> {
        match self {
            Account::Base(base) => Some(base),
            Account::Eth { base_account, .. } => Some(base_account),
            Account::Vesting { base_vesting_account } => Some(&base_vesting_account.base_account),
            Account::Unsupported => None,
        }
    }

    pub fn account_type(&self) -> &'static str {
        match self {
            Account::Base(_) => "BaseAccount",
            Account::Eth { .. } => "EthAccount",
            Account::Vesting { .. } => "VestingAccount",
            Account::Unsupported => "Unsupported",
        }
    }

    pub fn get_account_info(&self) -> Option<AccountInfo> {
        self.base().map(|base| AccountInfo {
            address: base.address.clone(),
            account_number: base.account_number,
            sequence: base.sequence,
            pub_key: base.pub_key_bytes(),
        })
    }
}

impl BaseAccount {
    /// `{"@type": "...PubKey", "key": "<base64>"}` to raw key bytes
    pub fn pub_key_bytes(&self) -> Option<Vec<u8>> {
        let key = self.pub_key.as_ref()?.get("key")?.as_str()?;
        BASE64.decode(key).ok()
    }
}

/// Decode the body of an account query
pub fn decode_account_response(body: &str) -> BroadcastResult<Account> {
    serde_json::from_str::<AccountResponse>(body)
        .map(|response| response.account)
        .map_err(|e| BroadcastError::Http(format!("Failed to decode account: {}", e)))
}

/// Cosmos REST encodes 64-bit integers as strings
fn de_u64_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s.parse().map_err(serde::de::Error::custom),
        StringOrNumber::Number(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_eth_account() {
        let body = r#"{"account": {
            "@type": "/injective.types.v1beta1.EthAccount",
            "base_account": {
                "address": "inj1hkhdaj2a2clmq5jq6mspsggqs32vynpk228q3r",
                "pub_key": null,
                "account_number": "12345",
                "sequence": "7"
            },
            "code_hash": "xdJGAYb3IzySfn2y3McDwOUAtlPKgic7e/rYBF2FpHA="
        }}"#;
        let account = decode_account_response(body).unwrap();
        assert_eq!(account.account_type(), "EthAccount");
        let info = account.get_account_info().unwrap();
        assert_eq!(info.account_number, 12345);
        assert_eq!(info.sequence, 7);
        assert_eq!(info.pub_key, None);
    }

    #[test]
    fn test_decode_pub_key() {
        let body = r#"{"account": {
            "@type": "/cosmos.auth.v1beta1.BaseAccount",
            "address": "inj1fee",
            "pub_key": {"@type": "/injective.crypto.v1beta1.ethsecp256k1.PubKey", "key": "AQID"},
            "account_number": 4,
            "sequence": "1"
        }}"#;
        let info = decode_account_response(body).unwrap().get_account_info().unwrap();
        assert_eq!(info.pub_key, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_decode_base_and_vesting_accounts() {
        let body = r#"{"account": {"@type": "/cosmos.auth.v1beta1.BaseAccount",
            "address": "inj1a", "account_number": "3", "sequence": "0"}}"#;
        let info = decode_account_response(body).unwrap().get_account_info().unwrap();
        assert_eq!(info.account_number, 3);

        let body = r#"{"account": {"@type": "/cosmos.vesting.v1beta1.DelayedVestingAccount",
            "base_vesting_account": {"base_account": {"address": "inj1v",
            "account_number": "9", "sequence": "4"}}}}"#;
        let account = decode_account_response(body).unwrap();
        assert_eq!(account.account_type(), "VestingAccount");
        assert_eq!(account.get_account_info().unwrap().sequence, 4);
    }

    #[test]
    fn test_unknown_account_type() {
        let body = r#"{"account": {"@type": "/some.module.v1.ModuleAccount", "name": "x"}}"#;
        let account = decode_account_response(body).unwrap();
        assert!(account.get_account_info().is_none());
    }
}
