// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Result tree nodes (MyST mdast).
//!
//! An [`MdNode`] serializes as a flat JSON object: `type` first, then the
//! node's fields, then `children` when the node is a container.
//!
//! ```json
//! {"type": "heading", "depth": 1, "children": [{"type": "text", "value": "Intro"}]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One node of the result tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MdNode {
    /// Node type (`root`, `block`, `heading`, `text`, ...).
    #[serde(rename = "type")]
    pub node_type: String,
    /// Type-specific fields (`depth`, `url`, `value`, `id`, `kind`, ...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Ordered children; `None` for leaves such as `text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MdNode>>,
}

impl MdNode {
    /// Create a container node with an empty child list.
    pub fn parent(node_type: impl Into<String>) -> Self {
        MdNode {
            node_type: node_type.into(),
            fields: Map::new(),
            children: Some(Vec::new()),
        }
    }

    /// Create a leaf node (no `children` field).
    pub fn leaf(node_type: impl Into<String>) -> Self {
        MdNode {
            node_type: node_type.into(),
            fields: Map::new(),
            children: None,
        }
    }

    /// Create a `text` leaf carrying `value`.
    pub fn text(value: impl Into<String>) -> Self {
        MdNode::leaf("text").with("value", value.into())
    }

    /// Set a field, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The anchor id stamped onto this node, if any.
    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    /// Children, empty for leaves.
    pub fn children(&self) -> &[MdNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Pre-order iterator over this node and all its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Convert to a JSON value.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

// Children are moved onto a heap stack before they drop, so a long chain of
// nested containers never recurses through the derived drop glue.
impl Drop for MdNode {
    fn drop(&mut self) {
        let Some(children) = self.children.as_mut() else {
            return;
        };
        if children.iter().all(|child| child.children().is_empty()) {
            return;
        }
        let mut stack = std::mem::take(children);
        while let Some(mut node) = stack.pop() {
            if let Some(grandchildren) = node.children.as_mut() {
                stack.append(grandchildren);
            }
        }
    }
}

/// Iterator returned by [`MdNode::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a MdNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a MdNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
