// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Document tree transformation engine.
//!
//! This crate turns an already-parsed document tree (docutils-style sections,
//! titles, paragraphs, inline markup, references, admonitions) into a MyST
//! mdast tree ready for JSON serialization.
//!
//! # Overview
//!
//! - **Source trees**: [`DocTree`] is an arena of [`SourceNode`]s addressed by
//!   [`NodeId`](doctree::NodeId), loaded from JSON or built in code.
//! - **Traversal**: [`visitor::walk`] performs a depth-first enter/exit walk;
//!   [`Traversal`] dispatches each node to the [`Rule`](rules::Rule)
//!   registered for its type tag.
//! - **Result trees**: rules produce [`MdNode`]s which the
//!   [`Assembler`](transform::Assembler) attaches in visit order.
//!
//! # Quick Start
//!
//! ```
//! use mystbuild_core::{transform, DocTree, RuleSet};
//! use serde_json::json;
//!
//! let tree = DocTree::from_json(json!({
//!     "type": "document",
//!     "children": [
//!         {"type": "target", "attributes": {"refid": "intro"}},
//!         {"type": "paragraph", "children": [{"type": "Text", "text": "Hello"}]}
//!     ]
//! }))
//! .unwrap();
//!
//! let out = transform(&tree, &RuleSet::standard()).unwrap();
//! assert_eq!(out.root.node_type, "root");
//! assert_eq!(out.root.children()[0].id(), Some("intro"));
//! ```

pub mod doctree;
pub mod error;
pub mod mdast;
pub mod rules;
pub mod transform;
pub mod visitor;

pub use doctree::{DocTree, NodeRef, SourceNode};
pub use error::{TransformError, TransformResult};
pub use mdast::MdNode;
pub use rules::{AdmonitionKind, Rule, RuleSet, Visit};
pub use transform::{transform, Transformation, Traversal, TraversalStats};
