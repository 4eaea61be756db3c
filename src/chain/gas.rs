//! Gas amounts and the message-based gas estimator

use serde::{Deserialize, Serialize};
use std::fmt;

use super::messages::{Message, MessageKind};

/// Default gas limit for a standard message
pub const DEFAULT_GAS_LIMIT: u64 = 400_000;
/// Exchange messages are cheap and frequent, so they get a tighter limit
pub const DEFAULT_EXCHANGE_GAS_LIMIT: u64 = 200_000;
/// Governance messages touch a lot of state
pub const DEFAULT_GOVERNANCE_GAS_LIMIT: u64 = 5 * DEFAULT_GAS_LIMIT;

/// A gas amount. This is the one representation used inside the crate; it goes
/// out as a JSON number to transaction preparation and as a decimal string
/// (`to_string()`) to native sign requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GasAmount(pub u64);

impl GasAmount {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for GasAmount {
    fn from(value: u64) -> Self {
        GasAmount(value)
    }
}

impl fmt::Display for GasAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps a batch of messages to a gas limit. Implementations must be pure.
pub trait GasEstimator: Send + Sync {
    fn estimate(&self, messages: &[Message]) -> GasAmount;
}

/// Sums a fixed per-message limit chosen by message kind
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageGasEstimator;

impl MessageGasEstimator {
    pub fn gas_for_kind(kind: MessageKind) -> u64 {
        match kind {
            MessageKind::Exchange => DEFAULT_EXCHANGE_GAS_LIMIT,
            MessageKind::Governance => DEFAULT_GOVERNANCE_GAS_LIMIT,
            MessageKind::Standard | MessageKind::Contract => DEFAULT_GAS_LIMIT,
        }
    }
}

impl GasEstimator for MessageGasEstimator {
    fn estimate(&self, messages: &[Message]) -> GasAmount {
        let total = messages
            .iter()
            .map(|msg| Self::gas_for_kind(msg.kind()))
            .fold(0u64, u64::saturating_add);

        GasAmount(total.max(DEFAULT_EXCHANGE_GAS_LIMIT))
    }
}
