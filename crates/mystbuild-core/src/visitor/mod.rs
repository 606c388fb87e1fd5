// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor infrastructure for document tree traversal.
//!
//! # Traversal Order
//!
//! - **Depth-first, pre-order** for [`Visitor::visit`]
//! - **Post-order** for [`Visitor::leave`]
//! - Children are visited in document order
//!
//! # Visitor Pattern
//!
//! ```
//! use mystbuild_core::doctree::{DocTree, NodeRef, SourceNode};
//! use mystbuild_core::visitor::{walk, VisitResult, Visitor};
//!
//! struct TextCounter {
//!     count: usize,
//! }
//!
//! impl<'t> Visitor<'t> for TextCounter {
//!     type Error = std::convert::Infallible;
//!
//!     fn visit(&mut self, node: NodeRef<'t>) -> Result<VisitResult, Self::Error> {
//!         if node.is_text() {
//!             self.count += 1;
//!         }
//!         Ok(VisitResult::Continue)
//!     }
//! }
//!
//! let mut tree = DocTree::new(SourceNode::element("document"));
//! let root = tree.root();
//! tree.append(root, SourceNode::text("hello"));
//!
//! let mut counter = TextCounter { count: 0 };
//! walk(&tree, &mut counter).unwrap();
//! assert_eq!(counter.count, 1);
//! ```

mod dispatch;
mod traits;

pub use dispatch::{walk, walk_from};
pub use traits::{VisitResult, Visitor};
