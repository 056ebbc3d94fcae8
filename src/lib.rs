//! # FP Solver
//!
//! A fictitious-play solver for heads-up poker subgames played on an
//! explicit decision tree.
//!
//! ## Features
//!
//! - **Whole-range solving**: strategies are per-node ranges over all 1326 hands
//! - **Exact card removal**: villain and chance nodes weight by compatible combos
//! - **Pluggable equities**: any `EquityOracle`; `EquityTable` ships in memory
//! - **Range notation**: `QQ`, `AK`, `AKs`, `AKo`, `AhKd` in and out
//! - **Parallel evaluation**: per-hand EVs on the rayon pool
//!
//! ## Quick Start
//!
//! ```ignore
//! use fp_solver::{Action, Actor, Board, DecisionNode, DecisionTree, Player, ROOT};
//! use fp_solver::{FPConfig, FPSolver};
//!
//! // 1. Build the tree
//! let root = DecisionNode::new(Actor::PlayerA, 0.5, 1.0, Board::new(), Action::Start);
//! let mut tree = DecisionTree::new(10.0, root);
//! tree.add_node(DecisionNode::new(Actor::Leaf, 0.5, 1.0, Board::new(), Action::Fold(Player::A)), ROOT)?;
//! // ...
//!
//! // 2. Solve against preflop equities
//! let mut solver = FPSolver::new(tree, &equities, FPConfig::default())?;
//! solver.solve()?;
//!
//! // 3. Read the ranges
//! println!("{}", solver.strategy().range(shove).to_notation());
//! ```
//!
//! ## Modules
//!
//! - [`cards`]: cards, hands, boards, ranges and equity lookups
//! - [`tree`]: the decision tree
//! - [`fp`]: backward induction and the fictitious-play loop
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     FPSolver (fictitious play)                  │
//! │  - Range blending          - Convergence diagnostics            │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Backward induction (best response EVs)             │
//! └─────────────────────────────────────────────────────────────────┘
//!         │                     │                     │
//!         ▼                     ▼                     ▼
//!    ┌──────────┐        ┌─────────────┐       ┌─────────────┐
//!    │  Ranges  │        │DecisionTree │       │EquityOracle │
//!    └──────────┘        └─────────────┘       └─────────────┘
//! ```

#![warn(missing_docs)]

/// Cards, hands, boards, ranges and equity oracles.
pub mod cards;

/// Fictitious-play solver module.
///
/// Backward induction, best-response extraction and the solver loop.
pub mod fp;

/// Decision tree module.
pub mod tree;

// Re-export commonly used types at crate root for convenience
pub use cards::{Board, Card, EquityOracle, EquityTable, Hand, Range};
pub use fp::{FPConfig, FPSolver, FPStats, SolveError, StrategyPair};
pub use tree::{Action, Actor, DecisionNode, DecisionTree, NodeId, Player, ROOT};
