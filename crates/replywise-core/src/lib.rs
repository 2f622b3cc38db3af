//! # replywise-core
//!
//! Drafting logic for the replywise writing assistant.
//!
//! This crate provides:
//! - **Conversation analysis** - who the next message goes to and whether it
//!   is a reply, a follow-up or a new conversation
//! - **Prompt assembly** - deterministic prompts, with stricter identity rules
//!   on retries, and script-based language detection
//! - **Output validation** - identity, placeholder and signature checks on
//!   generated text, plus signature repair
//! - **Compose pipeline** - one generation session per request with a bounded
//!   retry policy and a user confirmation step
//! - **Summaries** - thread summaries with optional action items
//! - **Preferences** - tone, length, greetings and closings from an async store
//!
//! The generation capability and the preferences store are traits; the host
//! supplies implementations.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod compose;
pub mod conversation;
mod error;
pub mod generation;
pub mod insertion;
pub mod language;
pub mod preferences;
pub mod prompt;
pub mod retry;
pub mod summarize;
pub mod validation;

pub use compose::{
    ComposeMode, ComposeOutcome, ComposeRequest, Composer, ComposerConfig, DEFAULT_CONTEXT_MESSAGES,
    Draft,
};
pub use conversation::{
    ConversationState, PLACEHOLDER_RECIPIENT, RecipientSource, Situation, analyze,
};
pub use error::{Error, Result};
pub use generation::{Availability, GenerationCapability, GenerationSession, PromptOptions};
pub use insertion::{InsertionNode, NOTIFICATIONS, Notification, insertion_plan};
pub use language::{Language, detect_language};
pub use preferences::{
    JsonFilePreferencesStore, Length, MemoryPreferencesStore, PreferencesStore, Tone,
    UserPreferences, load_preferences, save_preferences,
};
pub use prompt::{PromptInput, compose_prompt, system_prompt};
pub use retry::{Attempt, Decision, MAX_ATTEMPTS, RetryPolicy};
pub use summarize::{Summarizer, ThreadSummary};
pub use validation::{
    IntentCategory, Issue, IssueKind, Severity, ValidationContext, ValidationResult,
    repair_signature, repair_signature_with, validate, validate_with,
};
