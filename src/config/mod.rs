use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::telemetry::TelemetryConfig;

/// Environment variable holding the mnemonic for the local wallet.
/// Never store sensitive keys in config files!
pub const MNEMONIC_ENV: &str = "INJ_MNEMONIC";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Cosmos chain id, e.g. "injective-888" for testnet
    pub chain_id: String,
    /// EVM chain id used in EIP-712 domains (1439 on testnet, 1 on mainnet)
    pub ethereum_chain_id: u64,
    /// Indexer transaction service (prepare / web3 broadcast)
    pub indexer_endpoint: String,
    /// Explorer REST API
    pub explorer_endpoint: String,
    /// Chain node REST (LCD) endpoint
    pub rest_endpoint: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    pub metrics_enabled: bool,
    /// Bucket used to group metrics labels when the caller does not pass one
    pub default_bucket: String,
    /// Gas price in the smallest unit, e.g. "500000000inj"
    pub gas_price: String,
    pub poll_interval_ms: u64,
    pub poll_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                chain_id: "injective-888".to_string(),
                ethereum_chain_id: 1439,
                indexer_endpoint: "https://testnet.sentry.exchange.grpc-web.injective.network".to_string(),
                explorer_endpoint: "https://testnet.sentry.exchange.grpc-web.injective.network/api/explorer/v1".to_string(),
                rest_endpoint: "https://testnet.sentry.lcd.injective.network:443".to_string(),
                request_timeout_secs: 30,
            },
            broadcast: BroadcastConfig {
                metrics_enabled: false,
                default_bucket: "tx".to_string(),
                gas_price: "500000000inj".to_string(),
                poll_interval_ms: 1000,
                poll_timeout_secs: 60,
            },
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values that would only fail later, mid-broadcast
    pub fn validate(&self) -> Result<()> {
        if self.network.chain_id.is_empty() {
            bail!("network.chain_id must not be empty");
        }
        if self.network.ethereum_chain_id == 0 {
            bail!("network.ethereum_chain_id must be non-zero");
        }
        if self.network.request_timeout_secs == 0 {
            bail!("network.request_timeout_secs must be at least 1");
        }
        if !self.broadcast.gas_price.ends_with(|c: char| c.is_ascii_alphabetic()) {
            bail!("broadcast.gas_price must carry a denom, e.g. 500000000inj");
        }
        Ok(())
    }

    /// The immutable options handed to the broadcaster
    pub fn broadcast_options(&self) -> BroadcastOptions {
        BroadcastOptions {
            chain_id: self.network.chain_id.clone(),
            ethereum_chain_id: self.network.ethereum_chain_id,
        }
    }
}

/// Chain identifiers a broadcaster is bound to. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastOptions {
    pub chain_id: String,
    pub ethereum_chain_id: u64,
}

impl BroadcastOptions {
    pub fn new(chain_id: impl Into<String>, ethereum_chain_id: u64) -> Self {
        Self {
            chain_id: chain_id.into(),
            ethereum_chain_id,
        }
    }
}
