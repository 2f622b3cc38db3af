//! Conversation state analysis.
//!
//! Decides, from an ordered message list and the signed-in user's address,
//! who the next message should go to and what kind of message it is:
//! a conversation starter, a nudge after the user's own unanswered message,
//! or a reply to someone else.
//!
//! Webmail pages expose senders and recipients inconsistently between sent
//! and received messages, so recipient resolution walks a cascade of
//! increasingly permissive signals and checks each result against one hard
//! rule: the recipient is never the user, unless the thread holds no other
//! address at all.

mod analyze;
mod model;

pub use analyze::analyze;
pub use model::{ConversationState, PLACEHOLDER_RECIPIENT, RecipientSource, Situation};
