//! Error types for thread extraction.

/// Result type alias for thread extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Thread extraction error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value that should be an e-mail address is not one.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A document snapshot is structurally invalid.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Snapshot JSON could not be decoded.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
