// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Contexts handed to rules during the enter and exit phases.

use crate::doctree::{DocTree, NodeId, NodeRef};
use crate::error::{TransformError, TransformResult};
use crate::mdast::MdNode;

use super::assembler::ResultId;

/// Deferred one-shot action applied to the next result produced in the
/// registering node's parent scope.
///
/// Receives the node that produced the result and the result itself; returns
/// `true` once it has applied. An action returning `false` stays registered
/// and is offered the following sibling's result.
pub type SiblingAction = Box<dyn FnMut(NodeRef<'_>, &mut MdNode) -> bool>;

/// Per-traversal counters rules read and update.
///
/// Lives in the engine, never on the source tree, so two traversals of the
/// same tree never observe each other's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalState {
    /// Number of headings whose subtree is currently open.
    pub heading_depth: u32,
    /// Number of sections whose subtree is currently open.
    pub section_depth: u32,
    pub(crate) root: Option<ResultId>,
}

impl TraversalState {
    /// Nesting level for a heading entered now.
    ///
    /// Counts enclosing headings as well as enclosing sections, so both a
    /// heading nested inside another heading's subtree and a title of a
    /// nested section land one level deeper.
    pub fn next_heading_level(&self) -> u32 {
        (self.heading_depth + 1).max(self.section_depth)
    }
}

/// Context for a rule's enter phase.
pub struct EnterContext<'a> {
    pub(crate) tree: &'a DocTree,
    pub(crate) parent: Option<NodeId>,
    pub(crate) state: &'a mut TraversalState,
    pub(crate) registered: Vec<SiblingAction>,
}

impl<'a> EnterContext<'a> {
    /// The innermost open ancestor of the node being entered.
    pub fn parent_node(&self) -> Option<NodeRef<'a>> {
        self.parent.map(|id| self.tree.get(id))
    }

    pub fn state(&self) -> &TraversalState {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut TraversalState {
        &mut *self.state
    }

    /// Register an action for the next result produced among the following
    /// siblings of the node being entered.
    ///
    /// Has no effect for the root, which has no parent scope.
    pub fn set_sibling_action<F>(&mut self, action: F)
    where
        F: FnMut(NodeRef<'_>, &mut MdNode) -> bool + 'static,
    {
        if self.parent.is_some() {
            self.registered.push(Box::new(action));
        }
    }
}

/// Context for a suspended rule's exit phase.
pub struct ExitContext<'a> {
    pub(crate) node: NodeId,
    pub(crate) produced: Option<ResultId>,
    pub(crate) state: &'a mut TraversalState,
}

impl ExitContext<'_> {
    /// The node being left.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The result this node produced on enter, now fully populated.
    pub fn produced(&self) -> Option<ResultId> {
        self.produced
    }

    pub fn state(&self) -> &TraversalState {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut TraversalState {
        &mut *self.state
    }

    /// Expose this node's result as the traversal root.
    pub fn publish_root(&mut self) -> TransformResult<()> {
        let produced = self.produced.ok_or(TransformError::MissingRoot)?;
        if self.state.root.is_some() {
            return Err(TransformError::DuplicateRoot);
        }
        self.state.root = Some(produced);
        Ok(())
    }
}
