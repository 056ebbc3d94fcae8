//! Fictitious-play solver module.
//!
//! # Overview
//!
//! Fictitious play finds an approximate equilibrium of a two-player
//! subgame by repeatedly best-responding to the opponent's running
//! strategy and folding that best response into one's own:
//!
//! 1. Compute A's maximally exploitative EV for every hand at every node
//!    against B's current ranges (backward induction)
//! 2. Read off A's pure best response, hand by hand
//! 3. Blend it into A's running ranges with weight `1/(n+2)`
//! 4. Repeat for B against A's updated ranges
//!
//! Strategies are stored as ranges, so the whole range is solved at once
//! and card removal is applied exactly at every villain and chance node.
//!
//! # Example
//!
//! ```ignore
//! use fp_solver::fp::{FPConfig, FPSolver};
//!
//! let mut solver = FPSolver::new(tree, &equities, FPConfig::default())?;
//! solver.solve()?;
//! println!("{}", solver.strategy().summary(solver.tree()));
//! ```

pub mod config;
pub mod engine;
pub mod solver;
pub mod strategy;

pub use config::{ConfigError, ConvergencePoint, FPConfig, FPStats};
pub use engine::{best_response_ranges, compute_best_response_evs};
pub use solver::{solve, FPSolver, NodeExport, SolutionExport, SolveError};
pub use strategy::{step_weight, update_range, StrategyPair, IMPOSSIBLE_EV};
