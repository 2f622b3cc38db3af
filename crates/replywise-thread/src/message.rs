//! Thread message model.

use serde::{Deserialize, Serialize};

use crate::address::{clean_display_name, normalize_email, same_address};
use crate::error::{Error, Result};

/// An address together with the name shown for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Lowercased e-mail address.
    pub email: String,
    /// Cleaned display name (never empty, never contains `@`).
    pub display_name: String,
}

impl Participant {
    /// Creates a participant, normalising the address and cleaning the name.
    ///
    /// # Errors
    ///
    /// Returns an error if `email` does not contain an e-mail address.
    pub fn new(email: &str, display_name: &str) -> Result<Self> {
        let email =
            normalize_email(email).ok_or_else(|| Error::InvalidAddress(email.to_string()))?;
        let display_name = clean_display_name(display_name, &email);
        Ok(Self {
            email,
            display_name,
        })
    }

    /// Creates a participant whose display name is derived from the address.
    ///
    /// # Errors
    ///
    /// Returns an error if `email` does not contain an e-mail address.
    pub fn from_address(email: &str) -> Result<Self> {
        Self::new(email, "")
    }

    /// Checks whether this participant has the given address.
    #[must_use]
    pub fn has_address(&self, email: &str) -> bool {
        same_address(&self.email, email)
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.display_name, self.email)
    }
}

/// Ordered, address-deduplicated recipient list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipients(Vec<Participant>);

impl Recipients {
    /// Creates an empty recipient list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a recipient unless one with the same address is present.
    ///
    /// Returns `true` if the recipient was added.
    pub fn insert(&mut self, participant: Participant) -> bool {
        if self.contains(&participant.email) {
            return false;
        }
        self.0.push(participant);
        true
    }

    /// Checks whether an address is already listed.
    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        self.0.iter().any(|p| p.has_address(email))
    }

    /// Returns the first recipient.
    #[must_use]
    pub fn first(&self) -> Option<&Participant> {
        self.0.first()
    }

    /// Returns the first recipient whose address differs from `email`.
    #[must_use]
    pub fn first_other_than(&self, email: &str) -> Option<&Participant> {
        self.0.iter().find(|p| !p.has_address(email))
    }

    /// Iterates over recipients in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Participant> {
        self.0.iter()
    }

    /// Number of recipients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no recipients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Participant> for Recipients {
    fn from_iter<I: IntoIterator<Item = Participant>>(iter: I) -> Self {
        let mut recipients = Self::new();
        for participant in iter {
            recipients.insert(participant);
        }
        recipients
    }
}

impl<'a> IntoIterator for &'a Recipients {
    type Item = &'a Participant;
    type IntoIter = std::slice::Iter<'a, Participant>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Correlation keys used to find a message again after the page re-renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageIds {
    /// Durable message id.
    pub durable: Option<String>,
    /// Legacy message id.
    pub legacy: Option<String>,
    /// Structural position id.
    pub position: Option<String>,
}

impl MessageIds {
    /// Returns `true` if no key is known.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.durable.is_none() && self.legacy.is_none() && self.position.is_none()
    }
}

/// One entry of a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Lowercased sender address.
    pub sender: String,
    /// Cleaned sender display name.
    pub sender_display_name: String,
    /// Recipients in page order.
    pub recipients: Recipients,
    /// Plain-text body, already truncated to the extractor's cap.
    pub body_text: String,
    /// Keys for re-locating this message.
    pub ids: MessageIds,
    /// Whether the local user sent this message.
    pub is_authored_by_local_user: bool,
}

impl Message {
    /// Creates a message from a sender address and display name.
    ///
    /// # Errors
    ///
    /// Returns an error if `sender` does not contain an e-mail address.
    pub fn new(sender: &str, display_name: &str) -> Result<Self> {
        let Participant {
            email,
            display_name,
        } = Participant::new(sender, display_name)?;
        Ok(Self {
            sender: email,
            sender_display_name: display_name,
            recipients: Recipients::new(),
            body_text: String::new(),
            ids: MessageIds::default(),
            is_authored_by_local_user: false,
        })
    }

    /// Adds a recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if `email` does not contain an e-mail address.
    pub fn to(mut self, email: &str, display_name: &str) -> Result<Self> {
        self.recipients.insert(Participant::new(email, display_name)?);
        Ok(self)
    }

    /// Sets the body text.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body_text = body.into();
        self
    }

    /// Sets the correlation keys.
    #[must_use]
    pub fn with_ids(mut self, ids: MessageIds) -> Self {
        self.ids = ids;
        self
    }

    /// Recomputes authorship against the local user's address.
    ///
    /// With no known local user every message is treated as someone else's.
    pub fn mark_authorship(&mut self, local_user: Option<&str>) {
        self.is_authored_by_local_user =
            local_user.is_some_and(|address| same_address(&self.sender, address));
    }

    /// Returns the sender as a participant.
    #[must_use]
    pub fn sender_participant(&self) -> Participant {
        Participant {
            email: self.sender.clone(),
            display_name: self.sender_display_name.clone(),
        }
    }

    /// Checks whether any of this message's correlation keys matches.
    #[must_use]
    pub fn matches_ids(&self, ids: &MessageIds) -> bool {
        let eq = |a: &Option<String>, b: &Option<String>| matches!((a, b), (Some(a), Some(b)) if a == b);
        eq(&self.ids.durable, &ids.durable)
            || eq(&self.ids.legacy, &ids.legacy)
            || eq(&self.ids.position, &ids.position)
    }
}
