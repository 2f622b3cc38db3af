//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The generation capability cannot serve requests right now.
    #[error("Writing assistant unavailable: {reason}")]
    CapabilityUnavailable {
        /// What is wrong.
        reason: String,
        /// What the user can do about it.
        remediation: String,
    },

    /// The generation capability failed while producing text.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Preferences could not be read or written.
    #[error("Preferences error: {0}")]
    Preferences(String),

    /// Thread extraction failed.
    #[error("Thread error: {0}")]
    Thread(#[from] replywise_thread::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Message suitable for showing to the user, including remediation
    /// steps where there are any.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::CapabilityUnavailable {
                reason,
                remediation,
            } => format!("{reason}. {remediation}"),
            other => other.to_string(),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
