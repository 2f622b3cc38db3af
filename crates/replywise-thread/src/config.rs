//! Extractor configuration.

use serde::{Deserialize, Serialize};

/// Default cap on body characters kept per message.
pub const DEFAULT_BODY_CHAR_LIMIT: usize = 3000;

/// Attribute names the extractor looks for.
///
/// Defaults follow the markup of a Gmail-style conversation view. Hosts with
/// different markup override individual fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Marks a message container; its value is the durable message id.
    pub message: String,
    /// Legacy message id on the container.
    pub legacy_id: String,
    /// Structural position id on the container.
    pub position_id: String,
    /// Marks the sender element inside a message.
    pub sender: String,
    /// Marks the recipient area inside a message.
    pub recipients: String,
    /// Marks the body element inside a message.
    pub body: String,
    /// Carries an e-mail address on any element.
    pub address: String,
    /// Carries a display name next to an address.
    pub name: String,
    /// Carries the signed-in account address.
    pub account: String,
    /// Accessible label that may contain the account name and address.
    pub account_label: String,
    /// Text that introduces the account inside `account_label`.
    pub account_label_prefix: String,
    /// Anchor index cached on a compose field by a previous pass.
    pub cached_index: String,
    /// Durable id cached on a compose field.
    pub cached_durable_id: String,
    /// Legacy id cached on a compose field.
    pub cached_legacy_id: String,
    /// Position id cached on a compose field.
    pub cached_position_id: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            message: "data-message-id".to_string(),
            legacy_id: "data-legacy-message-id".to_string(),
            position_id: "id".to_string(),
            sender: "data-sender".to_string(),
            recipients: "data-recipients".to_string(),
            body: "data-message-body".to_string(),
            address: "email".to_string(),
            name: "name".to_string(),
            account: "data-account-email".to_string(),
            account_label: "aria-label".to_string(),
            account_label_prefix: "Google Account:".to_string(),
            cached_index: "data-replywise-anchor-index".to_string(),
            cached_durable_id: "data-replywise-anchor-id".to_string(),
            cached_legacy_id: "data-replywise-anchor-legacy-id".to_string(),
            cached_position_id: "data-replywise-anchor-position".to_string(),
        }
    }
}

/// Settings for a thread extraction pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Attribute names.
    pub selectors: Selectors,
    /// Maximum body characters kept per message.
    pub body_char_limit: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            selectors: Selectors::default(),
            body_char_limit: DEFAULT_BODY_CHAR_LIMIT,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: ExtractorConfig =
            serde_json::from_str(r#"{"selectors": {"sender": "data-from"}}"#).unwrap();
        assert_eq!(config.selectors.sender, "data-from");
        assert_eq!(config.selectors.message, "data-message-id");
        assert_eq!(config.body_char_limit, DEFAULT_BODY_CHAR_LIMIT);
    }
}
