// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor trait definitions for document tree traversal.

use crate::doctree::NodeRef;

/// Result of visiting a node - controls traversal behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisitResult {
    /// Continue traversal into children.
    ///
    /// After visiting children, `leave` will be called for this node.
    #[default]
    Continue,

    /// Skip children, continue with siblings.
    ///
    /// The walker will not descend into this node's children, but `leave`
    /// will still be called for this node.
    SkipChildren,
}

/// Read-only traversal of a [`DocTree`](crate::doctree::DocTree).
///
/// Returning an error from either method stops the walk immediately; no
/// further `visit` or `leave` calls are made.
pub trait Visitor<'t> {
    type Error;

    /// Called in pre-order, before any child of `node`.
    fn visit(&mut self, node: NodeRef<'t>) -> Result<VisitResult, Self::Error>;

    /// Called in post-order, after every child of `node` has been left.
    fn leave(&mut self, _node: NodeRef<'t>) -> Result<(), Self::Error> {
        Ok(())
    }
}
