//! How a draft is written into the host's compose field.
//!
//! The host replaces the field's content with the nodes from
//! [`insertion_plan`] and then dispatches [`NOTIFICATIONS`] so the page
//! notices the change.

use serde::{Deserialize, Serialize};

/// One node to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertionNode {
    /// A text node holding one line.
    Text(String),
    /// A line-break element.
    LineBreak,
}

/// Events the host dispatches on the field after insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Notification {
    /// The `input` event.
    Input,
    /// The `change` event.
    Change,
}

impl Notification {
    /// DOM event name.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Change => "change",
        }
    }
}

/// Notifications to dispatch, in order.
pub const NOTIFICATIONS: [Notification; 2] = [Notification::Input, Notification::Change];

/// Splits `text` into text nodes separated by line breaks.
///
/// Empty lines produce no text node, so a blank line shows up as two
/// consecutive breaks. `\r\n` is treated as `\n`.
#[must_use]
pub fn insertion_plan(text: &str) -> Vec<InsertionNode> {
    let mut nodes = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            nodes.push(InsertionNode::LineBreak);
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if !line.is_empty() {
            nodes.push(InsertionNode::Text(line.to_string()));
        }
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> InsertionNode {
        InsertionNode::Text(s.to_string())
    }

    #[test]
    fn test_lines_and_breaks() {
        assert_eq!(
            insertion_plan("Hi Alice,\n\nSee you.\r\nBob"),
            vec![
                text("Hi Alice,"),
                InsertionNode::LineBreak,
                InsertionNode::LineBreak,
                text("See you."),
                InsertionNode::LineBreak,
                text("Bob"),
            ]
        );
    }

    #[test]
    fn test_empty_text() {
        assert!(insertion_plan("").is_empty());
        assert_eq!(insertion_plan("\n"), vec![InsertionNode::LineBreak]);
    }

    #[test]
    fn test_notification_order() {
        let names: Vec<_> = NOTIFICATIONS.iter().map(Notification::event_name).collect();
        assert_eq!(names, vec!["input", "change"]);
    }
}
