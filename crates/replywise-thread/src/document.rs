//! Read-only access to the host page's document tree.
//!
//! The extractor never talks to a concrete DOM. Hosts implement
//! [`DocumentTree`] over whatever they have; [`Snapshot`] is an owned,
//! serialisable tree that hosts can ship across a process boundary as JSON
//! and that tests build directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Traversal and query capability over a page's structure.
///
/// The source is best-effort: any query may come back empty.
pub trait DocumentTree {
    /// Handle to a node. Handles are only valid for the tree that issued them.
    type Node: Copy + Eq + std::fmt::Debug;

    /// The root node.
    fn root(&self) -> Self::Node;

    /// The document title, if any.
    fn title(&self) -> Option<String>;

    /// Descendants of `scope` (excluding `scope`) carrying attribute `name`,
    /// optionally restricted to an exact `value`, in document order.
    fn query_by_attribute(
        &self,
        scope: Self::Node,
        name: &str,
        value: Option<&str>,
    ) -> Vec<Self::Node>;

    /// Attribute value of a node.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    /// Parent node.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The sibling immediately before `node`.
    fn previous_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Concatenated text of the node and its descendants.
    fn text_content(&self, node: Self::Node) -> String;

    /// Raw markup of the node's content, when the host can supply it.
    fn inner_html(&self, _node: Self::Node) -> Option<String> {
        None
    }

    /// Whether `node` is `ancestor` or lies inside it.
    fn contains(&self, ancestor: Self::Node, node: Self::Node) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Nearest inclusive ancestor carrying attribute `name`.
    fn closest_with_attribute(&self, node: Self::Node, name: &str) -> Option<Self::Node> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.attribute(n, name).is_some() {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }
}

/// Handle into a [`Snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the snapshot's arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    html: Option<String>,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Element description used to build or deserialise a [`Snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name.
    #[serde(default)]
    pub tag: String,
    /// Attributes.
    #[serde(default, rename = "attrs")]
    pub attributes: BTreeMap<String, String>,
    /// Text directly owned by this element (before its children).
    #[serde(default)]
    pub text: String,
    /// Inner markup, if captured.
    #[serde(default)]
    pub html: Option<String>,
    /// Child elements.
    #[serde(default)]
    pub children: Vec<Element>,
}

impl Element {
    /// Creates an element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets the element's own text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the inner markup.
    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Appends a child element.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    title: Option<String>,
    root: Element,
}

/// Owned, arena-backed document tree.
#[derive(Debug, Clone)]
pub struct Snapshot {
    title: Option<String>,
    nodes: Vec<NodeData>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshot {
    /// Creates a snapshot holding only an empty `body` root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: None,
            nodes: vec![NodeData {
                tag: "body".to_string(),
                ..NodeData::default()
            }],
        }
    }

    /// Creates a snapshot with a title.
    #[must_use]
    pub fn with_title(title: impl Into<String>) -> Self {
        let mut snapshot = Self::new();
        snapshot.title = Some(title.into());
        snapshot
    }

    /// Parses a JSON snapshot of the form `{"title": ..., "root": Element}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SnapshotFile = serde_json::from_str(json)?;
        let mut snapshot = Self {
            title: file.title,
            nodes: Vec::new(),
        };
        snapshot.push_element(None, file.root);
        Ok(snapshot)
    }

    /// Appends `element` (and its children) under `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` does not belong to this snapshot.
    pub fn append(&mut self, parent: NodeId, element: Element) -> Result<NodeId> {
        if parent.0 >= self.nodes.len() {
            return Err(Error::InvalidSnapshot(format!(
                "parent node {} does not exist",
                parent.0
            )));
        }
        Ok(self.push_element(Some(parent.0), element))
    }

    /// Number of nodes in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the snapshot only holds its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Tag name of a node.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|n| n.tag.as_str())
    }

    fn push_element(&mut self, parent: Option<usize>, element: Element) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData {
            tag: element.tag,
            attributes: element.attributes,
            text: element.text,
            html: element.html,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(index);
        }
        for child in element.children {
            self.push_element(Some(index), child);
        }
        NodeId(index)
    }

    fn collect_text(&self, index: usize, out: &mut Vec<String>) {
        let node = &self.nodes[index];
        let own = node.text.trim();
        if !own.is_empty() {
            out.push(own.to_string());
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }

    fn collect_matching(
        &self,
        index: usize,
        name: &str,
        value: Option<&str>,
        out: &mut Vec<NodeId>,
    ) {
        for &child in &self.nodes[index].children {
            let matched = self.nodes[child]
                .attributes
                .get(name)
                .is_some_and(|v| value.is_none_or(|want| v == want));
            if matched {
                out.push(NodeId(child));
            }
            self.collect_matching(child, name, value, out);
        }
    }
}

impl DocumentTree for Snapshot {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn query_by_attribute(&self, scope: NodeId, name: &str, value: Option<&str>) -> Vec<NodeId> {
        let mut out = Vec::new();
        if scope.0 < self.nodes.len() {
            self.collect_matching(scope.0, name, value, &mut out);
        }
        out
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.get(node.0)?.attributes.get(name).cloned()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent.map(NodeId)
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(node.0)?.parent?;
        let siblings = &self.nodes[parent].children;
        let position = siblings.iter().position(|&c| c == node.0)?;
        position.checked_sub(1).map(|p| NodeId(siblings[p]))
    }

    fn text_content(&self, node: NodeId) -> String {
        if node.0 >= self.nodes.len() {
            return String::new();
        }
        let mut parts = Vec::new();
        self.collect_text(node.0, &mut parts);
        parts.join("\n")
    }

    fn inner_html(&self, node: NodeId) -> Option<String> {
        self.nodes.get(node.0)?.html.clone()
    }
}
