//! The on-device text generation capability.
//!
//! The model itself is a black box behind [`GenerationCapability`]. A
//! capability hands out sessions; a session takes prompts one at a time and
//! must be destroyed when the caller is done with it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Whether the model can serve requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Availability {
    /// Ready now.
    Available,
    /// Supported, but the model has not been downloaded.
    Downloadable,
    /// The model is downloading.
    Downloading,
    /// Not supported in this environment.
    Unavailable,
}

impl Availability {
    /// Converts a non-ready state into a user-facing error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityUnavailable`] unless the state is
    /// [`Availability::Available`].
    pub fn ensure_available(self) -> Result<()> {
        let (reason, remediation) = match self {
            Self::Available => return Ok(()),
            Self::Downloadable => (
                "The on-device language model has not been downloaded",
                "Enable the built-in AI model in your browser settings and let it download",
            ),
            Self::Downloading => (
                "The on-device language model is still downloading",
                "Wait for the download to finish and try again",
            ),
            Self::Unavailable => (
                "This browser does not provide an on-device language model",
                "Use a browser version with built-in AI support and enable it",
            ),
        };
        Err(Error::CapabilityUnavailable {
            reason: reason.to_string(),
            remediation: remediation.to_string(),
        })
    }
}

/// Sampling options for a single prompt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptOptions {
    /// Sampling temperature.
    pub temperature: f32,
    /// Top-k sampling cutoff.
    pub top_k: u32,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 3,
        }
    }
}

/// Provider of generation sessions.
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    /// Probes whether the model can be used.
    async fn availability(&self) -> Availability;

    /// Starts a session primed with `system_prompt`.
    async fn create_session(&self, system_prompt: &str) -> Result<Box<dyn GenerationSession>>;
}

/// One conversation with the model. Prompts are issued sequentially.
#[async_trait]
pub trait GenerationSession: Send {
    /// Sends a prompt and waits for the full response.
    async fn prompt(&mut self, text: &str, options: &PromptOptions) -> Result<String>;

    /// Releases the session.
    async fn destroy(self: Box<Self>);
}

/// Probes availability and opens a session.
///
/// # Errors
///
/// Returns [`Error::CapabilityUnavailable`] when the model is not ready, or
/// the capability's own error if the session cannot be created.
pub async fn open_session(
    capability: &dyn GenerationCapability,
    system_prompt: &str,
) -> Result<Box<dyn GenerationSession>> {
    let availability = capability.availability().await;
    debug!("Generation capability availability: {availability:?}");
    availability.ensure_available()?;
    capability.create_session(system_prompt).await
}
