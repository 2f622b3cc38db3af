//! The seam between page markup and the portable conversation logic.

use crate::anchor::{AnchorHint, AnchorMatch, resolve_cached};
use crate::document::DocumentTree;
use crate::error::Result;
use crate::extract::{DomThreadSource, Extraction};
use crate::message::{Message, Participant};

/// Anything that can list a thread's messages and locate a reply anchor.
pub trait ThreadSource {
    /// Node handle used by structural anchor hints.
    type Node: Copy + Eq + std::fmt::Debug;

    /// Lists the thread's messages, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read at all. Partial or
    /// degraded reads are reported through [`Extraction::warnings`].
    fn list_messages(&self) -> Result<Extraction>;

    /// Finds the message a pending reply is anchored to.
    fn find_anchor(&self, hint: &AnchorHint<Self::Node>) -> Option<AnchorMatch>;
}

impl<D: DocumentTree> ThreadSource for DomThreadSource<'_, D> {
    type Node = D::Node;

    fn list_messages(&self) -> Result<Extraction> {
        Ok(self.extract())
    }

    fn find_anchor(&self, hint: &AnchorHint<D::Node>) -> Option<AnchorMatch> {
        self.anchor(hint)
    }
}

/// A fixed message list, for fixtures and hosts that scrape elsewhere.
///
/// Only the cached steps of the anchor chain apply; there is no tree to walk.
#[derive(Debug, Clone, Default)]
pub struct StaticThreadSource {
    extraction: Extraction,
}

impl StaticThreadSource {
    /// Creates a source, recomputing authorship against `local_user`.
    #[must_use]
    pub fn new(messages: Vec<Message>, local_user: Option<Participant>) -> Self {
        Self {
            extraction: Extraction::from_messages(messages, local_user),
        }
    }
}

impl ThreadSource for StaticThreadSource {
    type Node = ();

    fn list_messages(&self) -> Result<Extraction> {
        Ok(self.extraction.clone())
    }

    fn find_anchor(&self, hint: &AnchorHint<()>) -> Option<AnchorMatch> {
        resolve_cached(&self.extraction.messages, hint)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::anchor::AnchorStrategy;

    #[test]
    fn test_static_source_marks_authorship() {
        let source = StaticThreadSource::new(
            vec![
                Message::new("alice@x.com", "Alice").unwrap(),
                Message::new("bob@x.com", "Bob").unwrap(),
            ],
            Some(Participant::new("Bob@X.com", "Bob").unwrap()),
        );

        let extraction = source.list_messages().unwrap();
        assert!(!extraction.messages[0].is_authored_by_local_user);
        assert!(extraction.messages[1].is_authored_by_local_user);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_static_source_cached_anchor() {
        let source = StaticThreadSource::new(vec![Message::new("a@x.com", "A").unwrap()], None);
        let hint = AnchorHint {
            cached_index: Some(0),
            ..AnchorHint::default()
        };
        assert_eq!(
            source.find_anchor(&hint).map(|a| a.strategy),
            Some(AnchorStrategy::CachedIndex)
        );
        assert!(source.find_anchor(&AnchorHint::default()).is_none());
    }
}
