//! Conversation state data model.

use replywise_thread::{Message, Participant};
use serde::{Deserialize, Serialize};

/// Address used when no recipient can be found anywhere.
pub const PLACEHOLDER_RECIPIENT: &str = "recipient@unknown.invalid";

/// Which step of the resolution cascade produced the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipientSource {
    /// Sender of a target message the user did not write.
    TargetSender,
    /// Recipient of a target message the user wrote.
    TargetRecipient,
    /// First other party found scanning the whole thread.
    ThreadSearch,
    /// Any non-user recipient of the target.
    TargetRecipientFallback,
    /// Sender of the target, accepted without validation.
    TargetSenderLastResort,
    /// Nothing found; a placeholder address is used.
    Placeholder,
}

impl RecipientSource {
    /// Short name for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TargetSender => "target_sender",
            Self::TargetRecipient => "target_recipient",
            Self::ThreadSearch => "thread_search",
            Self::TargetRecipientFallback => "target_recipient_fallback",
            Self::TargetSenderLastResort => "target_sender_last_resort",
            Self::Placeholder => "placeholder",
        }
    }
}

/// The addressing situation of the next message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Situation {
    /// No prior messages: a fresh conversation.
    ConversationStarter,
    /// The user wrote the two most recent messages and is nudging again.
    FollowUp,
    /// The user wrote the latest message and nobody has replied yet.
    AwaitingReply,
    /// Replying to a message someone else wrote.
    RespondingTo,
}

/// Derived state for one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Index of the message being replied to.
    pub target_index: Option<usize>,
    /// The message being replied to.
    pub target: Option<Message>,
    /// There is nothing to reply to.
    pub conversation_starter: bool,
    /// The user wrote the target message.
    pub last_sender_was_user: bool,
    /// The user wrote the target and the message before it.
    pub is_follow_up_by_user: bool,
    /// The user wrote the target and nothing follows it.
    pub awaiting_reply: bool,
    /// Author of the target when it was not the user.
    pub responding_to: Option<Participant>,
    /// Who the next message goes to. `None` only for conversation starters.
    pub recipient: Option<Participant>,
    /// How `recipient` was found.
    pub recipient_source: Option<RecipientSource>,
}

impl ConversationState {
    /// State for an empty thread.
    #[must_use]
    pub const fn starter() -> Self {
        Self {
            target_index: None,
            target: None,
            conversation_starter: true,
            last_sender_was_user: false,
            is_follow_up_by_user: false,
            awaiting_reply: false,
            responding_to: None,
            recipient: None,
            recipient_source: None,
        }
    }

    /// The addressing situation.
    #[must_use]
    pub const fn situation(&self) -> Situation {
        if self.conversation_starter {
            Situation::ConversationStarter
        } else if self.is_follow_up_by_user {
            Situation::FollowUp
        } else if self.awaiting_reply {
            Situation::AwaitingReply
        } else {
            Situation::RespondingTo
        }
    }

    /// Whether the recipient is the placeholder address.
    #[must_use]
    pub fn recipient_is_placeholder(&self) -> bool {
        matches!(self.recipient_source, Some(RecipientSource::Placeholder))
    }

    /// Recipient address, if any.
    #[must_use]
    pub fn recipient_email(&self) -> Option<&str> {
        self.recipient.as_ref().map(|p| p.email.as_str())
    }
}
