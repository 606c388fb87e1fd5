// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Walk functions for document tree traversal.
//!
//! - **Pre-order**: `visit` is called before descending into children
//! - **Post-order**: `leave` is called after all children have been left
//! - **Document order**: children are visited first to last
//!
//! The walk keeps an explicit work stack instead of recursing, so arbitrarily
//! deep trees cannot exhaust the thread stack.

use super::traits::{VisitResult, Visitor};
use crate::doctree::{DocTree, NodeId};

#[derive(Debug, Clone, Copy)]
enum Step {
    Enter(NodeId),
    Leave(NodeId),
}

/// Walk the whole tree starting at its root.
pub fn walk<'t, V: Visitor<'t>>(tree: &'t DocTree, visitor: &mut V) -> Result<(), V::Error> {
    walk_from(tree, tree.root(), visitor)
}

/// Walk the subtree rooted at `start`.
pub fn walk_from<'t, V: Visitor<'t>>(
    tree: &'t DocTree,
    start: NodeId,
    visitor: &mut V,
) -> Result<(), V::Error> {
    let mut work = vec![Step::Enter(start)];
    while let Some(step) = work.pop() {
        match step {
            Step::Enter(id) => {
                let node = tree.get(id);
                let result = visitor.visit(node)?;
                work.push(Step::Leave(id));
                if result == VisitResult::Continue {
                    work.extend(node.child_ids().iter().rev().map(|&c| Step::Enter(c)));
                }
            }
            Step::Leave(id) => visitor.leave(tree.get(id))?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctree::{NodeRef, SourceNode};
    use std::convert::Infallible;

    /// Records "+tag" on visit and "-tag" on leave.
    struct EventLog {
        events: Vec<String>,
        skip: &'static str,
    }

    impl<'t> Visitor<'t> for EventLog {
        type Error = Infallible;

        fn visit(&mut self, node: NodeRef<'t>) -> Result<VisitResult, Infallible> {
            self.events.push(format!("+{}", node.tag()));
            if node.tag() == self.skip {
                Ok(VisitResult::SkipChildren)
            } else {
                Ok(VisitResult::Continue)
            }
        }

        fn leave(&mut self, node: NodeRef<'t>) -> Result<(), Infallible> {
            self.events.push(format!("-{}", node.tag()));
            Ok(())
        }
    }

    fn tree() -> DocTree {
        let mut tree = DocTree::new(SourceNode::element("document"));
        let root = tree.root();
        let section = tree.append(root, SourceNode::element("section"));
        tree.append(section, SourceNode::element("title"));
        let comment = tree.append(section, SourceNode::element("comment"));
        tree.append(comment, SourceNode::text("hidden"));
        tree.append(root, SourceNode::element("paragraph"));
        tree
    }

    #[test]
    fn test_pre_and_post_order() {
        let mut log = EventLog {
            events: Vec::new(),
            skip: "",
        };
        walk(&tree(), &mut log).unwrap();
        assert_eq!(
            log.events,
            vec![
                "+document", "+section", "+title", "-title", "+comment", "+Text", "-Text",
                "-comment", "-section", "+paragraph", "-paragraph", "-document"
            ]
        );
    }

    #[test]
    fn test_skip_children_still_leaves() {
        let mut log = EventLog {
            events: Vec::new(),
            skip: "comment",
        };
        walk(&tree(), &mut log).unwrap();
        assert!(log.events.contains(&"+comment".to_string()));
        assert!(log.events.contains(&"-comment".to_string()));
        assert!(!log.events.contains(&"+Text".to_string()));
    }

    #[test]
    fn test_error_stops_walk() {
        struct FailOnTitle {
            visited: usize,
        }

        impl<'t> Visitor<'t> for FailOnTitle {
            type Error = String;

            fn visit(&mut self, node: NodeRef<'t>) -> Result<VisitResult, String> {
                self.visited += 1;
                if node.tag() == "title" {
                    return Err("title".to_string());
                }
                Ok(VisitResult::Continue)
            }
        }

        let mut visitor = FailOnTitle { visited: 0 };
        let err = walk(&tree(), &mut visitor).unwrap_err();
        assert_eq!(err, "title");
        assert_eq!(visitor.visited, 3);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut tree = DocTree::new(SourceNode::element("document"));
        let mut parent = tree.root();
        for _ in 0..100_000 {
            parent = tree.append(parent, SourceNode::element("inline"));
        }

        struct Depth {
            current: usize,
            max: usize,
        }

        impl<'t> Visitor<'t> for Depth {
            type Error = Infallible;

            fn visit(&mut self, _node: NodeRef<'t>) -> Result<VisitResult, Infallible> {
                self.current += 1;
                self.max = self.max.max(self.current);
                Ok(VisitResult::Continue)
            }

            fn leave(&mut self, _node: NodeRef<'t>) -> Result<(), Infallible> {
                self.current -= 1;
                Ok(())
            }
        }

        let mut depth = Depth { current: 0, max: 0 };
        walk(&tree, &mut depth).unwrap();
        assert_eq!(depth.max, 100_001);
        assert_eq!(depth.current, 0);
    }
}
