//! Error types for the broadcast pipeline and its collaborators

use thiserror::Error;

/// Errors surfaced by a broadcast and by the REST collaborators around it.
///
/// Each collaborator classifies its own failures into one of these kinds; the
/// orchestrator forwards them untouched so callers can tell a cancelled
/// signature apart from a node rejection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("Invalid broadcast request: {0}")]
    InvalidRequest(String),

    #[error("Address {address} is neither a 0x hex nor an inj bech32 address")]
    AddressResolution { address: String },

    #[error("Transaction preparation failed: {0}")]
    Preparation(String),

    #[error("Signing rejected: {0}")]
    SigningRejected(String),

    #[error("Transaction submission failed: {0}")]
    Submission(String),

    #[error("Block {0} not found")]
    BlockNotFound(String),

    #[error("Transaction {0} not found")]
    TransactionNotFound(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out waiting for {operation}")]
    Timeout { operation: String },
}

impl BroadcastError {
    /// True when the user (or the wallet on their behalf) declined to sign.
    /// Callers should treat this as a cancellation, not as a fault to retry.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, BroadcastError::SigningRejected(_))
    }

    /// True for record lookups that reached the server but found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BroadcastError::BlockNotFound(_) | BroadcastError::TransactionNotFound(_)
        )
    }
}

/// Result type for broadcast operations
pub type BroadcastResult<T> = Result<T, BroadcastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(BroadcastError::SigningRejected("Request rejected".into()).is_user_rejection());
        assert!(!BroadcastError::Submission("out of gas".into()).is_user_rejection());
        assert!(BroadcastError::TransactionNotFound("ABCD".into()).is_not_found());
        assert!(!BroadcastError::Http("502".into()).is_not_found());
    }

    #[test]
    fn test_error_messages_keep_origin() {
        let err = BroadcastError::Submission("account sequence mismatch, expected 5, got 4".into());
        assert!(err.to_string().contains("expected 5, got 4"));

        let err = BroadcastError::AddressResolution { address: "cosmos1xyz".into() };
        assert!(err.to_string().contains("cosmos1xyz"));
    }
}
