// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Result tree assembly.
//!
//! The [`Assembler`] owns every result node produced during a traversal in an
//! arena addressed by [`ResultId`]. A stack of open results mirrors the chain
//! of ancestors that produced a result; each new result is attached as the
//! last child of the top of that stack. The first result attached with an
//! empty stack becomes the root.
//!
//! Nodes stay in the arena (and stay mutable) until [`Assembler::materialize`]
//! turns the arena into an owned [`MdNode`] tree.

use std::fmt;

use crate::error::{TransformError, TransformResult};
use crate::mdast::MdNode;

/// Identity of a result node inside one [`Assembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultId(pub(crate) u32);

impl ResultId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[derive(Debug)]
struct Slot {
    node: MdNode,
    children: Vec<ResultId>,
}

/// Stack-driven builder for the result tree.
#[derive(Debug, Default)]
pub struct Assembler {
    slots: Vec<Slot>,
    open: Vec<ResultId>,
    root: Option<ResultId>,
}

impl Assembler {
    pub fn new() -> Self {
        Assembler::default()
    }

    /// The innermost open result, `None` only before the root is attached.
    pub fn current_parent(&self) -> Option<ResultId> {
        self.open.last().copied()
    }

    /// Append `node` to the current parent's children (or capture it as the
    /// root) and open it.
    pub fn attach(&mut self, node: MdNode) -> TransformResult<ResultId> {
        let parent = self.current_parent();
        if parent.is_none() && self.root.is_some() {
            return Err(TransformError::DuplicateRoot);
        }

        let id = ResultId(self.slots.len() as u32);
        self.slots.push(Slot {
            node,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.slots[parent.index()].children.push(id),
            None => self.root = Some(id),
        }
        self.open.push(id);
        Ok(id)
    }

    /// Close the innermost open result.
    pub fn close(&mut self) -> Option<ResultId> {
        self.open.pop()
    }

    /// The first result attached without a parent.
    pub fn root(&self) -> Option<ResultId> {
        self.root
    }

    pub fn node(&self, id: ResultId) -> &MdNode {
        &self.slots[id.index()].node
    }

    pub fn node_mut(&mut self, id: ResultId) -> &mut MdNode {
        &mut self.slots[id.index()].node
    }

    /// Ids of the children attached to `id` so far, in attach order.
    pub fn children_of(&self, id: ResultId) -> &[ResultId] {
        &self.slots[id.index()].children
    }

    /// Number of currently open results.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Total number of results attached.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Build the owned tree rooted at `root`.
    ///
    /// Children are always attached after their parent, so every child has a
    /// higher id than its parent; walking the arena backwards finishes each
    /// child before its parent needs it.
    pub fn materialize(self, root: ResultId) -> Option<MdNode> {
        let mut built: Vec<Option<MdNode>> = Vec::with_capacity(self.slots.len());
        built.resize_with(self.slots.len(), || None);

        for (index, slot) in self.slots.into_iter().enumerate().rev() {
            let Slot { mut node, children } = slot;
            if !children.is_empty() {
                let list = node.children.get_or_insert_with(Vec::new);
                list.extend(children.iter().filter_map(|c| built[c.index()].take()));
            }
            built[index] = Some(node);
        }

        built.get_mut(root.index()).and_then(Option::take)
    }
}
