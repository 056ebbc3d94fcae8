//! Decision tree model.
//!
//! The tree is built once by the caller and never changes afterwards:
//!
//! - [`node`]: players, actors, actions and the `DecisionNode` record
//! - [`tree`]: the `DecisionTree` arena and its traversal orders

pub mod node;
#[allow(clippy::module_inception)]
pub mod tree;

pub use node::{Action, Actor, DecisionNode, Player};
pub use tree::{DecisionTree, NodeId, TreeError, ROOT};
