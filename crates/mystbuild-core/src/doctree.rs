// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Arena-backed source document tree.
//!
//! A [`DocTree`] holds an already-parsed document (sections, titles,
//! paragraphs, inline markup, references, ...) as a flat arena of
//! [`SourceNode`]s addressed by [`NodeId`]. Node identity is the arena index:
//! two structurally identical nodes are always distinct entries.
//!
//! # NodeId Assignment
//!
//! Trees loaded with [`DocTree::from_json`] assign ids in **pre-order**:
//! the root is `NodeId(0)`, parents receive lower ids than their children and
//! left siblings lower ids than right siblings.
//!
//! # JSON Form
//!
//! ```json
//! {"type": "document", "children": [
//!   {"type": "paragraph", "children": [{"type": "Text", "text": "Hello"}]}
//! ]}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type tag of literal text nodes.
pub const TEXT_TAG: &str = "Text";

/// Stable identity of a node inside one [`DocTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Arena index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload of a single source node: type tag, attributes and literal text.
///
/// Children are owned by the [`DocTree`], not by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceNode {
    /// Concrete node type (`"section"`, `"paragraph"`, `"Text"`, ...).
    #[serde(rename = "type")]
    pub tag: String,
    /// Node attributes (`refid`, `internal`, `classes`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
    /// Literal text, only meaningful for [`TEXT_TAG`] nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl SourceNode {
    /// Create an element node with the given type tag.
    pub fn element(tag: impl Into<String>) -> Self {
        SourceNode {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            text: None,
        }
    }

    /// Create a literal text node.
    pub fn text(value: impl Into<String>) -> Self {
        SourceNode {
            tag: TEXT_TAG.to_string(),
            attributes: BTreeMap::new(),
            text: Some(value.into()),
        }
    }

    /// Set an attribute, builder style.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone)]
struct Slot {
    node: SourceNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Nested wire form used when loading a tree from JSON.
#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    children: Vec<RawNode>,
}

/// A source document tree.
///
/// The tree always has a root (created by [`DocTree::new`]); nodes are only
/// ever appended, never removed, so every [`NodeId`] handed out stays valid.
#[derive(Debug, Clone)]
pub struct DocTree {
    slots: Vec<Slot>,
}

impl DocTree {
    /// Create a tree consisting of a single root node.
    pub fn new(root: SourceNode) -> Self {
        DocTree {
            slots: vec![Slot {
                node: root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Load a tree from its nested JSON form.
    pub fn from_json(value: Value) -> serde_json::Result<Self> {
        let raw: RawNode = serde_json::from_value(value)?;
        Ok(Self::from_raw(raw))
    }

    /// Parse a tree from JSON text.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        let raw: RawNode = serde_json::from_str(text)?;
        Ok(Self::from_raw(raw))
    }

    /// Parse a tree from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        let raw: RawNode = serde_json::from_slice(bytes)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawNode) -> Self {
        let RawNode {
            tag,
            attributes,
            text,
            children,
        } = raw;
        let mut tree = DocTree::new(SourceNode {
            tag,
            attributes,
            text,
        });

        // Children are pushed in reverse so they pop in document order, which
        // yields pre-order ids.
        let root = tree.root();
        let mut pending: Vec<(NodeId, RawNode)> =
            children.into_iter().rev().map(|c| (root, c)).collect();
        while let Some((parent, raw)) = pending.pop() {
            let RawNode {
                tag,
                attributes,
                text,
                children,
            } = raw;
            let id = tree.append(
                parent,
                SourceNode {
                    tag,
                    attributes,
                    text,
                },
            );
            pending.extend(children.into_iter().rev().map(|c| (id, c)));
        }
        tree
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append `node` as the last child of `parent`, returning its id.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn append(&mut self, parent: NodeId, node: SourceNode) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots[parent.index()].children.push(id);
        self.slots.push(Slot {
            node,
            parent: Some(parent),
            children: Vec::new(),
        });
        id
    }

    /// Borrow a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id.index() < self.slots.len(), "node {} out of range", id);
        NodeRef { tree: self, id }
    }

    /// Number of nodes in the tree (always at least one).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A borrowed view of one node in a [`DocTree`].
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t DocTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    fn slot(&self) -> &'t Slot {
        &self.tree.slots[self.id.index()]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tag(&self) -> &'t str {
        &self.slot().node.tag
    }

    pub fn text(&self) -> Option<&'t str> {
        self.slot().node.text.as_deref()
    }

    pub fn attributes(&self) -> &'t BTreeMap<String, Value> {
        &self.slot().node.attributes
    }

    pub fn attr(&self, key: &str) -> Option<&'t Value> {
        self.slot().node.attributes.get(key)
    }

    /// String attribute value, `None` when absent or not a string.
    pub fn attr_str(&self, key: &str) -> Option<&'t str> {
        self.attr(key).and_then(Value::as_str)
    }

    /// Boolean attribute value; absent attributes read as `false`.
    ///
    /// Accepts JSON booleans as well as the `0`/`1` integers docutils writes
    /// for flag attributes.
    pub fn attr_flag(&self, key: &str) -> bool {
        match self.attr(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(Value::String(s)) => matches!(s.as_str(), "true" | "True" | "1"),
            _ => false,
        }
    }

    /// List attribute (`classes`, `ids`, `names`, ...) as strings.
    ///
    /// A single string value is treated as a one-element list.
    pub fn attr_list(&self, key: &str) -> Vec<&'t str> {
        match self.attr(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(s)) => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.slot().parent.map(|id| self.tree.get(id))
    }

    pub fn child_ids(&self) -> &'t [NodeId] {
        &self.slot().children
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        let tree = self.tree;
        self.slot().children.iter().map(move |&id| tree.get(id))
    }

    pub fn is_text(&self) -> bool {
        self.tag() == TEXT_TAG
    }

    /// Concatenated text of every `Text` node in this subtree, in order.
    pub fn astext(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            let node = self.tree.get(id);
            if let Some(text) = node.text() {
                out.push_str(text);
            }
            stack.extend(node.child_ids().iter().rev());
        }
        out
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("tag", &self.tag())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DocTree {
        DocTree::from_json(json!({
            "type": "document",
            "children": [
                {"type": "section", "attributes": {"ids": ["intro"]}, "children": [
                    {"type": "title", "children": [{"type": "Text", "text": "Intro"}]},
                    {"type": "paragraph", "children": [
                        {"type": "Text", "text": "Hello, "},
                        {"type": "emphasis", "children": [{"type": "Text", "text": "world"}]}
                    ]}
                ]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_ids_are_assigned_in_pre_order() {
        let tree = sample();
        let tags: Vec<&str> = (0..tree.len() as u32)
            .map(|i| tree.get(NodeId(i)).tag())
            .collect();
        assert_eq!(
            tags,
            vec![
                "document", "section", "title", "Text", "paragraph", "Text", "emphasis", "Text"
            ]
        );
    }

    #[test]
    fn test_children_keep_document_order() {
        let tree = sample();
        let section = tree.get(NodeId(1));
        let tags: Vec<&str> = section.children().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["title", "paragraph"]);
        assert_eq!(section.parent().map(|p| p.id()), Some(tree.root()));
    }

    #[test]
    fn test_astext_concatenates_subtree_text() {
        let tree = sample();
        assert_eq!(tree.get(NodeId(4)).astext(), "Hello, world");
        assert_eq!(tree.get(tree.root()).astext(), "IntroHello, world");
    }

    #[test]
    fn test_attribute_accessors() {
        let mut tree = DocTree::new(SourceNode::element("document"));
        let root = tree.root();
        let r = tree.append(
            root,
            SourceNode::element("reference")
                .with_attr("internal", 1)
                .with_attr("refid", "sec-1")
                .with_attr("classes", json!(["a", "b"])),
        );
        let node = tree.get(r);
        assert!(node.attr_flag("internal"));
        assert!(!node.attr_flag("missing"));
        assert_eq!(node.attr_str("refid"), Some("sec-1"));
        assert_eq!(node.attr_list("classes"), vec!["a", "b"]);
        assert_eq!(node.attr_list("refid"), vec!["sec-1"]);
    }

    #[test]
    fn test_identical_nodes_are_distinct() {
        let mut tree = DocTree::new(SourceNode::element("document"));
        let root = tree.root();
        let a = tree.append(root, SourceNode::element("paragraph"));
        let b = tree.append(root, SourceNode::element("paragraph"));
        assert_ne!(a, b);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_missing_type_is_rejected() {
        let err = DocTree::from_json(json!({"children": []}));
        assert!(err.is_err());
    }
}
