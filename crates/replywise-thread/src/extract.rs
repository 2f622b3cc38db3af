//! Reading a conversation out of a document tree.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::address::{clean_display_name, find_email, find_emails, normalize_email};
use crate::anchor::{AnchorHint, AnchorMatch, resolve_anchor};
use crate::config::ExtractorConfig;
use crate::document::DocumentTree;
use crate::message::{Message, MessageIds, Participant, Recipients};

/// Non-fatal problems found during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Warning {
    /// The signed-in user's address could not be found; authorship is
    /// unknown for every message.
    LocalUserUnresolved,
    /// A message element had no recognisable sender and was skipped.
    MessageWithoutSender {
        /// Position of the element among message elements.
        position: usize,
    },
}

impl Warning {
    /// Human-readable description for the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::LocalUserUnresolved => {
                "Could not determine your e-mail address; replies may be addressed incorrectly"
                    .to_string()
            }
            Self::MessageWithoutSender { position } => {
                format!("Skipped message {} because its sender could not be read", position + 1)
            }
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Result of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Messages in thread order, oldest first.
    pub messages: Vec<Message>,
    /// The signed-in user, if found.
    pub local_user: Option<Participant>,
    /// Degraded-path notices.
    pub warnings: Vec<Warning>,
}

impl Extraction {
    /// Builds an extraction from already-known messages, recomputing
    /// authorship against `local_user`.
    #[must_use]
    pub fn from_messages(mut messages: Vec<Message>, local_user: Option<Participant>) -> Self {
        let address = local_user.as_ref().map(|p| p.email.as_str());
        for message in &mut messages {
            message.mark_authorship(address);
        }
        let warnings = if local_user.is_none() {
            vec![Warning::LocalUserUnresolved]
        } else {
            Vec::new()
        };
        Self {
            messages,
            local_user,
            warnings,
        }
    }

    /// The local user's address, if resolved.
    #[must_use]
    pub fn local_address(&self) -> Option<&str> {
        self.local_user.as_ref().map(|p| p.email.as_str())
    }
}

/// Extracts messages from any [`DocumentTree`].
pub struct DomThreadSource<'a, D: DocumentTree> {
    doc: &'a D,
    config: ExtractorConfig,
}

impl<'a, D: DocumentTree> DomThreadSource<'a, D> {
    /// Creates a source over `doc`.
    #[must_use]
    pub const fn new(doc: &'a D, config: ExtractorConfig) -> Self {
        Self { doc, config }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Reads every message and the local user from the page.
    #[must_use]
    pub fn extract(&self) -> Extraction {
        self.extract_with_nodes().0
    }

    /// Finds the message a compose field replies to.
    #[must_use]
    pub fn anchor(&self, hint: &AnchorHint<D::Node>) -> Option<AnchorMatch> {
        let (extraction, nodes) = self.extract_with_nodes();
        resolve_anchor(
            self.doc,
            &self.config.selectors,
            &nodes,
            &extraction.messages,
            hint,
        )
    }

    /// Extraction plus, for each message, the element it was read from.
    #[must_use]
    pub fn extract_with_nodes(&self) -> (Extraction, Vec<D::Node>) {
        let local_user = self.resolve_local_user();
        let mut warnings = Vec::new();
        if local_user.is_none() {
            warn!("Local user address could not be resolved; authorship unknown");
            warnings.push(Warning::LocalUserUnresolved);
        }
        let local_address = local_user.as_ref().map(|p| p.email.as_str());

        let mut messages = Vec::new();
        let mut nodes = Vec::new();
        for (position, node) in self.message_nodes().into_iter().enumerate() {
            match self.read_message(node) {
                Some(mut message) => {
                    message.mark_authorship(local_address);
                    messages.push(message);
                    nodes.push(node);
                }
                None => {
                    debug!("Message element {position} has no readable sender");
                    warnings.push(Warning::MessageWithoutSender { position });
                }
            }
        }

        debug!(
            "Extracted {} messages ({} authored by local user)",
            messages.len(),
            messages.iter().filter(|m| m.is_authored_by_local_user).count()
        );

        (
            Extraction {
                messages,
                local_user,
                warnings,
            },
            nodes,
        )
    }

    /// Outermost message elements in document order.
    fn message_nodes(&self) -> Vec<D::Node> {
        let selector = &self.config.selectors.message;
        let all = self
            .doc
            .query_by_attribute(self.doc.root(), selector, None);
        all.iter()
            .copied()
            .filter(|&node| {
                !all.iter()
                    .any(|&other| other != node && self.doc.contains(other, node))
            })
            .collect()
    }

    fn read_message(&self, node: D::Node) -> Option<Message> {
        let selectors = &self.config.selectors;
        let sender = self.read_sender(node)?;

        let mut recipients = Recipients::new();
        for area in self.doc.query_by_attribute(node, &selectors.recipients, None) {
            for participant in self.read_recipients(area) {
                recipients.insert(participant);
            }
        }

        let ids = MessageIds {
            durable: self.doc.attribute(node, &selectors.message).filter(|v| !v.is_empty()),
            legacy: self.doc.attribute(node, &selectors.legacy_id).filter(|v| !v.is_empty()),
            position: self.doc.attribute(node, &selectors.position_id).filter(|v| !v.is_empty()),
        };

        Some(Message {
            sender: sender.email,
            sender_display_name: sender.display_name,
            recipients,
            body_text: self.read_body(node),
            ids,
            is_authored_by_local_user: false,
        })
    }

    /// Sender element first, then the first address-bearing element.
    fn read_sender(&self, node: D::Node) -> Option<Participant> {
        let selectors = &self.config.selectors;
        let candidates = self
            .doc
            .query_by_attribute(node, &selectors.sender, None)
            .into_iter()
            .chain(self.doc.query_by_attribute(node, &selectors.address, None));

        candidates
            .filter_map(|candidate| self.participant_at(candidate))
            .next()
    }

    /// Explicit address attributes win; otherwise addresses in the text.
    fn read_recipients(&self, area: D::Node) -> Vec<Participant> {
        let explicit: Vec<Participant> = self
            .doc
            .query_by_attribute(area, &self.config.selectors.address, None)
            .into_iter()
            .filter_map(|node| self.participant_at(node))
            .collect();
        if !explicit.is_empty() {
            return explicit;
        }

        find_emails(&self.doc.text_content(area))
            .into_iter()
            .map(|email| Participant {
                display_name: clean_display_name("", &email),
                email,
            })
            .collect()
    }

    /// Reads an address and name from one element.
    fn participant_at(&self, node: D::Node) -> Option<Participant> {
        let selectors = &self.config.selectors;
        let text = self.doc.text_content(node);
        let email = self
            .doc
            .attribute(node, &selectors.address)
            .and_then(|v| normalize_email(&v))
            .or_else(|| find_email(&text))?;
        let raw_name = self
            .doc
            .attribute(node, &selectors.name)
            .unwrap_or(text);
        Some(Participant {
            display_name: clean_display_name(&raw_name, &email),
            email,
        })
    }

    fn read_body(&self, node: D::Node) -> String {
        let Some(body) = self
            .doc
            .query_by_attribute(node, &self.config.selectors.body, None)
            .into_iter()
            .next()
        else {
            return String::new();
        };

        let text = self
            .doc
            .inner_html(body)
            .and_then(|html| match htmd::convert(&html) {
                Ok(converted) => Some(converted),
                Err(e) => {
                    debug!("HTML body conversion failed, using text content: {e}");
                    None
                }
            })
            .unwrap_or_else(|| self.doc.text_content(body));

        truncate_chars(text.trim(), self.config.body_char_limit)
    }

    /// Finds the signed-in account: explicit attribute, then an account
    /// label, then the document title.
    fn resolve_local_user(&self) -> Option<Participant> {
        let selectors = &self.config.selectors;
        let root = self.doc.root();

        if let Some(participant) = self
            .doc
            .query_by_attribute(root, &selectors.account, None)
            .into_iter()
            .find_map(|node| {
                let email = self
                    .doc
                    .attribute(node, &selectors.account)
                    .and_then(|v| normalize_email(&v))?;
                let name = self.doc.attribute(node, &selectors.name).unwrap_or_default();
                Some(Participant {
                    display_name: clean_display_name(&name, &email),
                    email,
                })
            })
        {
            debug!("Local user resolved from account attribute");
            return Some(participant);
        }

        if let Some(participant) = self
            .doc
            .query_by_attribute(root, &selectors.account_label, None)
            .into_iter()
            .filter_map(|node| self.doc.attribute(node, &selectors.account_label))
            .find_map(|label| parse_account_label(&label, &selectors.account_label_prefix))
        {
            debug!("Local user resolved from account label");
            return Some(participant);
        }

        let from_title = self.doc.title().and_then(|title| {
            let email = find_email(&title)?;
            Some(Participant {
                display_name: clean_display_name("", &email),
                email,
            })
        });
        if from_title.is_some() {
            debug!("Local user resolved from document title");
        }
        from_title
    }
}

/// Parses labels like `Google Account: Bob Jones (bob@x.com)`.
fn parse_account_label(label: &str, prefix: &str) -> Option<Participant> {
    let rest = label.trim().strip_prefix(prefix)?;
    let email = find_email(rest)?;
    let name = rest.split('(').next().unwrap_or_default();
    Some(Participant {
        display_name: clean_display_name(name, &email),
        email,
    })
}

/// Truncates to at most `limit` characters.
#[must_use]
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_on_char_boundary() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_parse_account_label() {
        let p = parse_account_label("Google Account: Bob Jones  (Bob@X.com)", "Google Account:")
            .unwrap();
        assert_eq!(p.email, "bob@x.com");
        assert_eq!(p.display_name, "Bob Jones");
        assert!(parse_account_label("Settings", "Google Account:").is_none());
    }

    #[test]
    fn test_from_messages_without_local_user_warns() {
        let mut authored = Message::new("bob@x.com", "Bob").unwrap();
        authored.is_authored_by_local_user = true;
        let extraction = Extraction::from_messages(vec![authored], None);
        assert!(!extraction.messages[0].is_authored_by_local_user);
        assert_eq!(extraction.warnings, vec![Warning::LocalUserUnresolved]);
    }
}
