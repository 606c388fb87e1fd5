// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Document tree to mdast transformation.
//!
//! - [`Traversal`] drives the walk and dispatches nodes to rules
//! - [`Assembler`] builds the result tree from the produced nodes
//! - [`EnterContext`] / [`ExitContext`] are what rules see of the traversal

mod assembler;
mod context;
mod engine;

pub use assembler::{Assembler, ResultId};
pub use context::{EnterContext, ExitContext, SiblingAction, TraversalState};
pub use engine::{transform, Transformation, Traversal, TraversalStats, MAX_DEPTH};
