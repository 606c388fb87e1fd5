// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Node transformation rules and the rule registry.
//!
//! A [`Rule`] handles one source node type. On enter it returns a [`Visit`]:
//!
//! - **Simple** rules return `Visit::node(result)` or `Visit::none()` and are
//!   done; leaving the node is a no-op.
//! - **Suspending** rules attach an exit continuation with
//!   [`Visit::on_exit`]. The engine runs it when the node is left, after every
//!   descendant has been transformed and attached.
//!
//! ```
//! use mystbuild_core::doctree::NodeRef;
//! use mystbuild_core::error::TransformResult;
//! use mystbuild_core::mdast::MdNode;
//! use mystbuild_core::rules::{RuleSet, Visit};
//! use mystbuild_core::transform::EnterContext;
//!
//! fn figure(_node: NodeRef<'_>, cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
//!     cx.state_mut().section_depth += 1;
//!     Ok(Visit::node(MdNode::parent("container")).on_exit(|cx| {
//!         cx.state_mut().section_depth -= 1;
//!         Ok(())
//!     }))
//! }
//!
//! let mut rules = RuleSet::standard();
//! rules.register("figure", figure);
//! assert!(rules.contains("figure"));
//! ```

mod standard;

use std::collections::HashMap;
use std::fmt;

use crate::doctree::NodeRef;
use crate::error::TransformResult;
use crate::mdast::MdNode;
use crate::transform::{EnterContext, ExitContext};

pub use standard::AdmonitionKind;

/// Exit-phase continuation of a suspending rule.
pub type Resume = Box<dyn FnOnce(&mut ExitContext<'_>) -> TransformResult<()>>;

/// What a rule did on enter.
#[must_use]
pub struct Visit {
    /// Result node to attach, if any.
    pub produced: Option<MdNode>,
    /// Work to run when the node is left.
    pub resume: Option<Resume>,
    /// Whether the engine should walk the node's children.
    pub descend: bool,
}

impl Visit {
    /// Produce `node` and descend into children.
    pub fn node(node: MdNode) -> Self {
        Visit {
            produced: Some(node),
            resume: None,
            descend: true,
        }
    }

    /// Produce nothing and descend into children.
    pub fn none() -> Self {
        Visit {
            produced: None,
            resume: None,
            descend: true,
        }
    }

    /// Suspend: run `resume` when the node is left.
    pub fn on_exit<F>(mut self, resume: F) -> Self
    where
        F: FnOnce(&mut ExitContext<'_>) -> TransformResult<()> + 'static,
    {
        self.resume = Some(Box::new(resume));
        self
    }

    /// Do not walk the node's children.
    pub fn skip_children(mut self) -> Self {
        self.descend = false;
        self
    }

    pub fn is_suspended(&self) -> bool {
        self.resume.is_some()
    }
}

impl fmt::Debug for Visit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Visit")
            .field("produced", &self.produced)
            .field("suspended", &self.is_suspended())
            .field("descend", &self.descend)
            .finish()
    }
}

/// Transformation logic for one source node type.
///
/// Rules are shared by every traversal that uses the same [`RuleSet`], so
/// they carry no per-traversal state of their own; counters belong in
/// [`TraversalState`](crate::transform::TraversalState).
pub trait Rule: Send + Sync {
    fn enter(&self, node: NodeRef<'_>, cx: &mut EnterContext<'_>) -> TransformResult<Visit>;
}

impl<F> Rule for F
where
    F: Fn(NodeRef<'_>, &mut EnterContext<'_>) -> TransformResult<Visit> + Send + Sync,
{
    fn enter(&self, node: NodeRef<'_>, cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
        self(node, cx)
    }
}

/// Registry mapping node type tags to rules.
pub struct RuleSet {
    rules: HashMap<String, Box<dyn Rule>>,
}

impl RuleSet {
    /// A registry with no rules.
    pub fn empty() -> Self {
        RuleSet {
            rules: HashMap::new(),
        }
    }

    /// The built-in rules for docutils document trees.
    pub fn standard() -> Self {
        let mut rules = RuleSet::empty();
        standard::register_all(&mut rules);
        rules
    }

    /// Register `rule` for `tag`, replacing any existing rule.
    pub fn register(&mut self, tag: impl Into<String>, rule: impl Rule + 'static) -> &mut Self {
        self.rules.insert(tag.into(), Box::new(rule));
        self
    }

    /// Remove the rule for `tag`, returning whether one was registered.
    pub fn unregister(&mut self, tag: &str) -> bool {
        self.rules.remove(tag).is_some()
    }

    pub fn get(&self, tag: &str) -> Option<&dyn Rule> {
        self.rules.get(tag).map(|rule| rule.as_ref())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.rules.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet::standard()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet").field("tags", &self.tags()).finish()
    }
}
