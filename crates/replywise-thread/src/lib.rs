//! # replywise-thread
//!
//! Reconstructs an e-mail conversation from a webmail page.
//!
//! ## Features
//!
//! - **Document access**: a narrow [`DocumentTree`] trait over the host page,
//!   plus an owned [`Snapshot`] that hosts can send as JSON
//! - **Message extraction**: sender, recipients, body and correlation ids for
//!   every message, with the signed-in user resolved from page signals
//! - **Anchor resolution**: which message a compose field replies to, via a
//!   seven-step priority chain
//! - **Normalisation**: lowercased addresses and display names that are never
//!   empty and never an address
//!
//! ## Quick Start
//!
//! ```ignore
//! use replywise_thread::{DomThreadSource, ExtractorConfig, Snapshot, ThreadSource};
//!
//! let doc = Snapshot::from_json(&json_from_host)?;
//! let source = DomThreadSource::new(&doc, ExtractorConfig::default());
//! let extraction = source.list_messages()?;
//!
//! for message in &extraction.messages {
//!     println!("{} -> {} recipients", message.sender, message.recipients.len());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
mod anchor;
mod config;
mod document;
mod error;
mod extract;
mod message;
mod source;

pub use anchor::{AnchorHint, AnchorMatch, AnchorStrategy, resolve_anchor, resolve_cached};
pub use config::{DEFAULT_BODY_CHAR_LIMIT, ExtractorConfig, Selectors};
pub use document::{DocumentTree, Element, NodeId, Snapshot};
pub use error::{Error, Result};
pub use extract::{DomThreadSource, Extraction, Warning, truncate_chars};
pub use message::{Message, MessageIds, Participant, Recipients};
pub use source::{StaticThreadSource, ThreadSource};
