pub mod account_types;
pub mod address;
pub mod gas;
pub mod messages;
pub mod proto;
pub mod tx_client;

pub use account_types::{Account, AccountInfo};
pub use address::{resolve_addresses, ResolvedAddresses};
pub use gas::{GasAmount, GasEstimator, MessageGasEstimator};
pub use messages::{Coin, Message, WireMessage};
pub use tx_client::{TxResponse, TxRestClient};
