// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Errors raised while transforming a document tree.
//!
//! Every variant is fatal for the traversal it occurs in: the walk stops at
//! the failing node and no partial result tree is returned. Other traversals
//! (other documents) are unaffected.

use thiserror::Error;

use crate::doctree::NodeId;

/// Errors that abort a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// No rule is registered for the node's type tag.
    #[error("no rule registered for node type '{tag}' (node {node})")]
    UnhandledNodeType { tag: String, node: NodeId },

    /// A reference that does not point inside the document.
    #[error("unsupported reference kind: {}", refuri.as_deref().unwrap_or("<no refuri>"))]
    UnsupportedReferenceKind { refuri: Option<String>, node: NodeId },

    /// A rule needed an attribute the node does not carry.
    #[error("'{tag}' node {node} is missing required attribute '{attribute}'")]
    MissingAttribute {
        tag: String,
        attribute: &'static str,
        node: NodeId,
    },

    /// The source tree nests deeper than the result tree may.
    #[error("node {node} is nested deeper than the limit of {limit} levels")]
    TooDeep { limit: usize, node: NodeId },

    /// The walk finished without any rule publishing a root result.
    #[error("traversal produced no root result")]
    MissingRoot,

    /// A second root result was produced or published.
    #[error("traversal produced more than one root result")]
    DuplicateRoot,
}

impl TransformError {
    /// Stable machine-readable code for JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            TransformError::UnhandledNodeType { .. } => "UnhandledNodeType",
            TransformError::UnsupportedReferenceKind { .. } => "UnsupportedReferenceKind",
            TransformError::MissingAttribute { .. } => "MissingAttribute",
            TransformError::TooDeep { .. } => "TooDeep",
            TransformError::MissingRoot => "MissingRoot",
            TransformError::DuplicateRoot => "DuplicateRoot",
        }
    }

    /// The source node the error is attributed to, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            TransformError::UnhandledNodeType { node, .. }
            | TransformError::UnsupportedReferenceKind { node, .. }
            | TransformError::MissingAttribute { node, .. }
            | TransformError::TooDeep { node, .. } => Some(*node),
            TransformError::MissingRoot | TransformError::DuplicateRoot => None,
        }
    }
}

pub type TransformResult<T> = Result<T, TransformError>;
