// Library exports for inj_broadcast

pub mod broadcast;
pub mod chain;
pub mod config;
pub mod error;
pub mod explorer;
pub mod indexer;
pub mod telemetry;
pub mod wallet;

// Re-export main types for convenience
pub use broadcast::{BroadcastRequest, MsgBroadcaster, SigningProtocol};
pub use config::{BroadcastOptions, Config};
pub use error::{BroadcastError, BroadcastResult};
pub use wallet::{InjectiveWallet, WalletStrategy};
