//! Anchor resolution: which message a compose field is replying to.
//!
//! Signals are tried cheapest and most specific first. Cached values from an
//! earlier pass beat tree walks, and explicit ids beat structural proximity,
//! which breaks whenever the page re-lays itself out.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Selectors;
use crate::document::DocumentTree;
use crate::message::{Message, MessageIds};

/// How far up from the compose field the sibling walk may climb.
const MAX_SIBLING_WALK_DEPTH: usize = 6;

/// The step of the priority chain that located the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorStrategy {
    /// Structural index cached on the compose field.
    CachedIndex,
    /// Cached durable message id.
    DurableId,
    /// Cached legacy message id.
    LegacyId,
    /// Cached structural position id.
    PositionId,
    /// The compose field sits inside a message element.
    Containment,
    /// Nearest enclosing element that looks like a message.
    EnclosingMessage,
    /// Nearest preceding sibling that is or contains a message.
    PrecedingSibling,
}

impl AnchorStrategy {
    /// Short name for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CachedIndex => "cached_index",
            Self::DurableId => "durable_id",
            Self::LegacyId => "legacy_id",
            Self::PositionId => "position_id",
            Self::Containment => "containment",
            Self::EnclosingMessage => "enclosing_message",
            Self::PrecedingSibling => "preceding_sibling",
        }
    }
}

/// A resolved anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorMatch {
    /// Index into the extracted message list.
    pub index: usize,
    /// Which signal found it.
    pub strategy: AnchorStrategy,
}

impl AnchorMatch {
    /// Attribute/value pairs the host should store on the compose field so
    /// the next pass can take the cached path.
    #[must_use]
    pub fn cache_entries(&self, messages: &[Message], selectors: &Selectors) -> Vec<(String, String)> {
        let mut entries = vec![(selectors.cached_index.clone(), self.index.to_string())];
        if let Some(message) = messages.get(self.index) {
            let ids = &message.ids;
            for (name, value) in [
                (&selectors.cached_durable_id, &ids.durable),
                (&selectors.cached_legacy_id, &ids.legacy),
                (&selectors.cached_position_id, &ids.position),
            ] {
                if let Some(value) = value {
                    entries.push((name.clone(), value.clone()));
                }
            }
        }
        entries
    }
}

/// What is known about a compose field when looking for its anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorHint<N> {
    /// Index cached by a previous pass.
    pub cached_index: Option<usize>,
    /// Correlation keys cached by a previous pass.
    pub cached_ids: MessageIds,
    /// The compose field itself, for structural strategies.
    pub compose: Option<N>,
}

impl<N> Default for AnchorHint<N> {
    fn default() -> Self {
        Self {
            cached_index: None,
            cached_ids: MessageIds::default(),
            compose: None,
        }
    }
}

impl<N: Copy> AnchorHint<N> {
    /// Hint with only a structural starting point.
    #[must_use]
    pub fn for_compose(compose: N) -> Self {
        Self {
            compose: Some(compose),
            ..Self::default()
        }
    }

    /// Reads cached values stored on the compose field by an earlier pass.
    #[must_use]
    pub fn from_compose_node<D>(doc: &D, compose: N, selectors: &Selectors) -> Self
    where
        D: DocumentTree<Node = N>,
    {
        let cached_index = doc
            .attribute(compose, &selectors.cached_index)
            .and_then(|v| v.trim().parse().ok());
        Self {
            cached_index,
            cached_ids: MessageIds {
                durable: doc.attribute(compose, &selectors.cached_durable_id),
                legacy: doc.attribute(compose, &selectors.cached_legacy_id),
                position: doc.attribute(compose, &selectors.cached_position_id),
            },
            compose: Some(compose),
        }
    }
}

/// Resolves the cached (non-structural) part of the chain.
#[must_use]
pub fn resolve_cached<N>(messages: &[Message], hint: &AnchorHint<N>) -> Option<AnchorMatch> {
    if let Some(index) = hint.cached_index.filter(|&i| i < messages.len()) {
        return Some(AnchorMatch {
            index,
            strategy: AnchorStrategy::CachedIndex,
        });
    }

    let ids = &hint.cached_ids;
    let by_key = |strategy: AnchorStrategy, key: &Option<String>, pick: fn(&MessageIds) -> &Option<String>| {
        let key = key.as_ref()?;
        messages
            .iter()
            .position(|m| pick(&m.ids).as_ref() == Some(key))
            .map(|index| AnchorMatch { index, strategy })
    };

    by_key(AnchorStrategy::DurableId, &ids.durable, |i| &i.durable)
        .or_else(|| by_key(AnchorStrategy::LegacyId, &ids.legacy, |i| &i.legacy))
        .or_else(|| by_key(AnchorStrategy::PositionId, &ids.position, |i| &i.position))
}

/// Runs the full seven-step chain.
///
/// `message_nodes[i]` must be the element `messages[i]` was read from.
/// Returns `None` when nothing matched, meaning the reply goes at the end of
/// the thread.
#[must_use]
pub fn resolve_anchor<D: DocumentTree>(
    doc: &D,
    selectors: &Selectors,
    message_nodes: &[D::Node],
    messages: &[Message],
    hint: &AnchorHint<D::Node>,
) -> Option<AnchorMatch> {
    let found = resolve_cached(messages, hint).or_else(|| {
        let compose = hint.compose?;
        let structural = |strategy, index: Option<usize>| index.map(|index| AnchorMatch { index, strategy });

        structural(
            AnchorStrategy::Containment,
            containing_message(doc, message_nodes, compose),
        )
        .or_else(|| {
            structural(
                AnchorStrategy::EnclosingMessage,
                enclosing_message(doc, selectors, message_nodes, messages, compose),
            )
        })
        .or_else(|| {
            structural(
                AnchorStrategy::PrecedingSibling,
                preceding_sibling_message(doc, message_nodes, compose),
            )
        })
    });

    match found {
        Some(anchor) => debug!(
            "Anchor resolved to message {} via {}",
            anchor.index,
            anchor.strategy.as_str()
        ),
        None => debug!("No anchor found, replying at end of thread"),
    }
    found
}

/// Innermost message element containing the compose field.
fn containing_message<D: DocumentTree>(
    doc: &D,
    message_nodes: &[D::Node],
    compose: D::Node,
) -> Option<usize> {
    message_nodes
        .iter()
        .enumerate()
        .rev()
        .find(|(_, node)| doc.contains(**node, compose))
        .map(|(index, _)| index)
}

/// Walks ancestors looking for something carrying a message or legacy id
/// that matches an extracted message.
fn enclosing_message<D: DocumentTree>(
    doc: &D,
    selectors: &Selectors,
    message_nodes: &[D::Node],
    messages: &[Message],
    compose: D::Node,
) -> Option<usize> {
    let mut current = doc.parent(compose);
    while let Some(node) = current {
        if let Some(index) = message_nodes.iter().position(|&n| n == node) {
            return Some(index);
        }
        let ids = MessageIds {
            durable: doc.attribute(node, &selectors.message),
            legacy: doc.attribute(node, &selectors.legacy_id),
            position: None,
        };
        if !ids.is_empty()
            && let Some(index) = messages.iter().position(|m| m.matches_ids(&ids))
        {
            return Some(index);
        }
        current = doc.parent(node);
    }
    None
}

/// Walks backwards through the previous siblings of the compose field's
/// containers, returning the last message found in the nearest one.
fn preceding_sibling_message<D: DocumentTree>(
    doc: &D,
    message_nodes: &[D::Node],
    compose: D::Node,
) -> Option<usize> {
    let mut container = Some(compose);
    for _ in 0..MAX_SIBLING_WALK_DEPTH {
        let Some(start) = container else { break };
        let mut sibling = doc.previous_sibling(start);
        while let Some(node) = sibling {
            let last_inside = message_nodes
                .iter()
                .enumerate()
                .rev()
                .find(|(_, m)| doc.contains(node, **m))
                .map(|(index, _)| index);
            if last_inside.is_some() {
                return last_inside;
            }
            sibling = doc.previous_sibling(node);
        }
        container = doc.parent(start);
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::document::{Element, NodeId, Snapshot};

    fn message(id: &str) -> Message {
        Message::new("a@x.com", "A").unwrap().with_ids(MessageIds {
            durable: Some(format!("d-{id}")),
            legacy: Some(format!("l-{id}")),
            position: Some(format!("p-{id}")),
        })
    }

    #[test]
    fn test_cached_index_wins() {
        let messages = vec![message("1"), message("2")];
        let hint: AnchorHint<()> = AnchorHint {
            cached_index: Some(0),
            cached_ids: MessageIds {
                durable: Some("d-2".into()),
                ..MessageIds::default()
            },
            compose: None,
        };
        let found = resolve_cached(&messages, &hint).unwrap();
        assert_eq!(found.index, 0);
        assert_eq!(found.strategy, AnchorStrategy::CachedIndex);
    }

    #[test]
    fn test_out_of_range_index_falls_through_to_ids() {
        let messages = vec![message("1"), message("2")];
        let hint: AnchorHint<()> = AnchorHint {
            cached_index: Some(7),
            cached_ids: MessageIds {
                durable: Some("d-nope".into()),
                legacy: Some("l-2".into()),
                position: Some("p-1".into()),
            },
            compose: None,
        };
        let found = resolve_cached(&messages, &hint).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.strategy, AnchorStrategy::LegacyId);
    }

    #[test]
    fn test_position_id_is_last_cached_step() {
        let messages = vec![message("1"), message("2")];
        let hint: AnchorHint<()> = AnchorHint {
            cached_ids: MessageIds {
                position: Some("p-2".into()),
                ..MessageIds::default()
            },
            ..AnchorHint::default()
        };
        let found = resolve_cached(&messages, &hint).unwrap();
        assert_eq!(found.strategy, AnchorStrategy::PositionId);
        assert_eq!(found.index, 1);
    }

    fn thread_doc() -> (Snapshot, Vec<NodeId>, NodeId) {
        let mut doc = Snapshot::new();
        let list = doc.append(doc.root(), Element::new("div")).unwrap();
        let m1 = doc
            .append(list, Element::new("div").attr("data-message-id", "d-1"))
            .unwrap();
        let m2 = doc
            .append(list, Element::new("div").attr("data-message-id", "d-2"))
            .unwrap();
        let reply_area = doc.append(list, Element::new("div")).unwrap();
        (doc, vec![m1, m2], reply_area)
    }

    #[test]
    fn test_containment() {
        let (mut doc, nodes, _) = thread_doc();
        let compose = doc.append(nodes[0], Element::new("textarea")).unwrap();
        let messages = vec![message("1"), message("2")];

        let found = resolve_anchor(
            &doc,
            &Selectors::default(),
            &nodes,
            &messages,
            &AnchorHint::for_compose(compose),
        )
        .unwrap();
        assert_eq!(found.index, 0);
        assert_eq!(found.strategy, AnchorStrategy::Containment);
    }

    #[test]
    fn test_enclosing_message_by_legacy_attribute() {
        let mut doc = Snapshot::new();
        let wrapper = doc
            .append(
                doc.root(),
                Element::new("div").attr("data-legacy-message-id", "l-1"),
            )
            .unwrap();
        let compose = doc.append(wrapper, Element::new("textarea")).unwrap();
        let messages = vec![message("1"), message("2")];

        let found = resolve_anchor(
            &doc,
            &Selectors::default(),
            &[],
            &messages,
            &AnchorHint::for_compose(compose),
        )
        .unwrap();
        assert_eq!(found.index, 0);
        assert_eq!(found.strategy, AnchorStrategy::EnclosingMessage);
    }

    #[test]
    fn test_preceding_sibling() {
        let (mut doc, nodes, reply_area) = thread_doc();
        let compose = doc.append(reply_area, Element::new("textarea")).unwrap();
        let messages = vec![message("1"), message("2")];

        let found = resolve_anchor(
            &doc,
            &Selectors::default(),
            &nodes,
            &messages,
            &AnchorHint::for_compose(compose),
        )
        .unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.strategy, AnchorStrategy::PrecedingSibling);
    }

    #[test]
    fn test_no_signal_means_end_of_thread() {
        let mut doc = Snapshot::new();
        let compose = doc.append(doc.root(), Element::new("textarea")).unwrap();
        let messages = vec![message("1")];
        let found = resolve_anchor(
            &doc,
            &Selectors::default(),
            &[],
            &messages,
            &AnchorHint::for_compose(compose),
        );
        assert!(found.is_none());
    }

    #[test]
    fn test_hint_from_compose_node_and_cache_entries() {
        let selectors = Selectors::default();
        let messages = vec![message("1"), message("2")];
        let anchor = AnchorMatch {
            index: 1,
            strategy: AnchorStrategy::PrecedingSibling,
        };

        let mut element = Element::new("textarea");
        for (name, value) in anchor.cache_entries(&messages, &selectors) {
            element = element.attr(name, value);
        }
        let mut doc = Snapshot::new();
        let compose = doc.append(doc.root(), element).unwrap();

        let hint = AnchorHint::from_compose_node(&doc, compose, &selectors);
        assert_eq!(hint.cached_index, Some(1));
        assert_eq!(hint.cached_ids.durable.as_deref(), Some("d-2"));
        assert_eq!(hint.compose, Some(compose));
    }
}
