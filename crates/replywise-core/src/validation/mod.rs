//! Post-generation checks on drafted text.
//!
//! The model sometimes swaps sender and recipient: it greets the user, talks
//! about the user in the third person, or signs with the recipient's name.
//! [`validate`] collects every problem it can see; [`repair_signature`]
//! fixes the signature case in place. Both are heuristics over plain text.

mod check;
mod model;
mod names;
mod repair;

pub use check::{ValidationContext, validate, validate_with};
pub use model::{IntentCategory, Issue, IssueKind, Severity, ValidationResult};
pub use repair::{repair_signature, repair_signature_with};
