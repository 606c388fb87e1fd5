// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The traversal engine.
//!
//! A [`Traversal`] walks a [`DocTree`] once, dispatching every node to the
//! rule registered for its type tag:
//!
//! 1. **Enter**: look up the rule, run its enter phase, offer the produced
//!    result to the sibling actions pending in the parent's scope, push the
//!    node (and its result, if any) onto the ancestor stacks, and record the
//!    node's visitation record.
//! 2. **Children** are walked unless the rule asked to skip them.
//! 3. **Exit**: remove the node's record, run the suspended rule's exit phase
//!    if there is one, pop the stacks and drop any sibling actions still
//!    pending in the node's own scope.
//!
//! # Dangling sibling actions
//!
//! An action still pending when its parent's scope closes is dropped silently:
//! the anchor is simply not attached. Each drop is logged at `debug` and
//! counted in [`TraversalStats::dangling_actions`].
//!
//! # Depth limit
//!
//! The walk itself is iterative, but the materialized [`MdNode`] tree is
//! compared and serialized recursively. A node deeper than [`MAX_DEPTH`]
//! levels fails the traversal with [`TransformError::TooDeep`].

use std::collections::HashMap;

use tracing::{debug, trace};

use super::assembler::{Assembler, ResultId};
use super::context::{EnterContext, ExitContext, SiblingAction, TraversalState};
use crate::doctree::{DocTree, NodeId, NodeRef};
use crate::error::{TransformError, TransformResult};
use crate::mdast::MdNode;
use crate::rules::{Resume, RuleSet};
use crate::visitor::{walk, VisitResult, Visitor};

/// Deepest source nesting a traversal accepts, counting the root as level 1.
pub const MAX_DEPTH: usize = 512;

/// Transient state of one open node, removed when the node is left.
struct VisitationRecord {
    resume: Option<Resume>,
    produced: Option<ResultId>,
}

/// Counters describing one completed traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Source nodes entered.
    pub nodes_visited: usize,
    /// Result nodes attached to the output tree.
    pub results_produced: usize,
    /// Sibling actions that fired and reported success.
    pub sibling_actions_applied: usize,
    /// Sibling actions dropped because their scope closed first.
    pub dangling_actions: usize,
    /// Deepest ancestor chain seen.
    pub max_depth: usize,
    /// Visitation records still present after the walk.
    pub open_records: usize,
    /// Sibling action scopes still present after the walk.
    pub pending_actions: usize,
}

/// The output of a successful traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformation {
    pub root: MdNode,
    pub stats: TraversalStats,
}

/// One-shot traversal of a source tree.
///
/// [`Traversal::run`] consumes the traversal, so an instance can never be
/// restarted or reused for another tree.
pub struct Traversal<'t> {
    tree: &'t DocTree,
    rules: &'t RuleSet,
    ancestors: Vec<NodeId>,
    assembler: Assembler,
    visits: HashMap<NodeId, VisitationRecord>,
    sibling_actions: HashMap<NodeId, Vec<SiblingAction>>,
    state: TraversalState,
    stats: TraversalStats,
}

impl<'t> Traversal<'t> {
    pub fn new(tree: &'t DocTree, rules: &'t RuleSet) -> Self {
        Traversal {
            tree,
            rules,
            ancestors: Vec::new(),
            assembler: Assembler::new(),
            visits: HashMap::new(),
            sibling_actions: HashMap::new(),
            state: TraversalState::default(),
            stats: TraversalStats::default(),
        }
    }

    /// Walk the whole tree and return the published root.
    ///
    /// Any rule failure aborts the walk; no partial tree is returned.
    pub fn run(mut self) -> TransformResult<Transformation> {
        let tree = self.tree;
        walk(tree, &mut self)?;

        let root = self.state.root.ok_or(TransformError::MissingRoot)?;
        if self.assembler.root() != Some(root) {
            return Err(TransformError::DuplicateRoot);
        }

        let mut stats = self.stats;
        stats.results_produced = self.assembler.len();
        stats.open_records = self.visits.len();
        stats.pending_actions = self.sibling_actions.len();
        debug_assert_eq!(stats.open_records, 0);
        debug_assert_eq!(stats.pending_actions, 0);

        let root = self
            .assembler
            .materialize(root)
            .ok_or(TransformError::MissingRoot)?;
        debug!(
            nodes = stats.nodes_visited,
            results = stats.results_produced,
            dangling = stats.dangling_actions,
            "traversal complete"
        );
        Ok(Transformation { root, stats })
    }

    /// Offer `result` to the actions pending in `parent`'s scope, dropping
    /// the ones that applied.
    fn fire_sibling_actions(&mut self, parent: NodeId, node: NodeRef<'t>, result: &mut MdNode) {
        let Some(pending) = self.sibling_actions.get_mut(&parent) else {
            return;
        };
        let before = pending.len();
        pending.retain_mut(|action| !action(node, &mut *result));
        self.stats.sibling_actions_applied += before - pending.len();
        if pending.is_empty() {
            self.sibling_actions.remove(&parent);
        }
    }
}

impl<'t> Visitor<'t> for Traversal<'t> {
    type Error = TransformError;

    fn visit(&mut self, node: NodeRef<'t>) -> TransformResult<VisitResult> {
        if self.ancestors.len() >= MAX_DEPTH {
            return Err(TransformError::TooDeep {
                limit: MAX_DEPTH,
                node: node.id(),
            });
        }
        let rules = self.rules;
        let rule = rules
            .get(node.tag())
            .ok_or_else(|| TransformError::UnhandledNodeType {
                tag: node.tag().to_string(),
                node: node.id(),
            })?;
        trace!(node = %node.id(), tag = node.tag(), "enter");

        let parent = self.ancestors.last().copied();
        let mut cx = EnterContext {
            tree: self.tree,
            parent,
            state: &mut self.state,
            registered: Vec::new(),
        };
        let visit = rule.enter(node, &mut cx)?;
        let registered = cx.registered;

        let mut produced = visit.produced;
        if let (Some(parent), Some(result)) = (parent, produced.as_mut()) {
            self.fire_sibling_actions(parent, node, result);
        }
        // Registered after firing so a node never feeds its own action.
        if let Some(parent) = parent {
            if !registered.is_empty() {
                self.sibling_actions
                    .entry(parent)
                    .or_default()
                    .extend(registered);
            }
        }

        self.ancestors.push(node.id());
        self.stats.nodes_visited += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.ancestors.len());

        let produced = match produced {
            Some(result) => Some(self.assembler.attach(result)?),
            None => None,
        };
        self.visits.insert(
            node.id(),
            VisitationRecord {
                resume: visit.resume,
                produced,
            },
        );

        Ok(if visit.descend {
            VisitResult::Continue
        } else {
            VisitResult::SkipChildren
        })
    }

    fn leave(&mut self, node: NodeRef<'t>) -> TransformResult<()> {
        let Some(record) = self.visits.remove(&node.id()) else {
            return Ok(());
        };

        if let Some(resume) = record.resume {
            let mut cx = ExitContext {
                node: node.id(),
                produced: record.produced,
                state: &mut self.state,
            };
            resume(&mut cx)?;
        }

        if record.produced.is_some() {
            self.assembler.close();
        }

        if let Some(dangling) = self.sibling_actions.remove(&node.id()) {
            debug!(
                scope = %node.id(),
                tag = node.tag(),
                count = dangling.len(),
                "dropping sibling actions with no following result"
            );
            self.stats.dangling_actions += dangling.len();
        }

        self.ancestors.pop();
        trace!(node = %node.id(), tag = node.tag(), "exit");
        Ok(())
    }
}

/// Transform `tree` with `rules`.
pub fn transform(tree: &DocTree, rules: &RuleSet) -> TransformResult<Transformation> {
    Traversal::new(tree, rules).run()
}
