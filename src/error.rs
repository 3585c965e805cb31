//! Error types shared by the tracker core.

use thiserror::Error;

/// Recoverable failures reported back to the user at the failing operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// Non-numeric or zero magnitude, empty name, bad price, ...
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Import JSON that does not parse or lacks a required top-level array.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("unknown item: {0}")]
    UnknownItem(String),

    #[error("already owned: {0}")]
    AlreadyOwned(String),

    #[error("insufficient funds: need {price} points, have {score}")]
    InsufficientFunds { price: u64, score: i64 },
}

impl From<serde_json::Error> for TrackerError {
    fn from(e: serde_json::Error) -> Self {
        TrackerError::MalformedDocument(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
