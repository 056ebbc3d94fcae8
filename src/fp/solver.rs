//! Fictitious-play solver.
//!
//! Each iteration computes player A's best response to B's running
//! strategy and blends it into A's running strategy, then does the same
//! for B against A's updated strategy. The running strategies are the
//! time-averaged history of best responses and approach an equilibrium.

use std::fmt;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::config::{ConfigError, ConvergencePoint, FPConfig, FPStats};
use super::engine;
use super::strategy::StrategyPair;
use crate::cards::{EquityOracle, OracleError, Range};
use crate::tree::{Action, Actor, DecisionTree, NodeId, Player, TreeError, ROOT};

/// The fictitious-play solver.
///
/// Owns the tree, the equity oracle and both players' running strategies.
///
/// # Example
/// ```ignore
/// use fp_solver::fp::{FPConfig, FPSolver};
///
/// let mut solver = FPSolver::new(tree, &equities, FPConfig::default())?;
/// let stats = solver.solve()?;
/// println!("{} iterations in {:.2}s", stats.iterations, stats.elapsed_seconds);
///
/// let shove_range = solver.strategy().range(shove_node);
/// ```
pub struct FPSolver<O: EquityOracle> {
    tree: DecisionTree,
    oracle: O,
    config: FPConfig,
    strategy: StrategyPair,
    iteration: u64,
    stats: FPStats,
}

impl<O: EquityOracle> FPSolver<O> {
    /// Create a solver where both players start with any two cards.
    pub fn new(tree: DecisionTree, oracle: O, config: FPConfig) -> Result<Self, SolveError> {
        Self::with_starting_ranges(tree, oracle, config, Range::full(), Range::full())
    }

    /// Create a solver with explicit starting ranges.
    ///
    /// Fails if the configuration is invalid or the oracle cannot answer
    /// for one of the tree's showdown boards.
    pub fn with_starting_ranges(
        tree: DecisionTree,
        oracle: O,
        config: FPConfig,
        start_a: Range,
        start_b: Range,
    ) -> Result<Self, SolveError> {
        config.validate()?;
        tree.validate()?;
        if let Some(board) = tree.showdown_boards().into_iter().find(|b| !oracle.supports(b)) {
            return Err(OracleError::Unavailable { board: board.clone() }.into());
        }

        let strategy = StrategyPair::with_starting_ranges(&tree, start_a, start_b);
        Ok(Self {
            tree,
            oracle,
            config,
            strategy,
            iteration: 0,
            stats: FPStats::new(),
        })
    }

    /// Run one iteration: best response and range update for A, then for B.
    pub fn run_iteration(&mut self) -> Result<(), SolveError> {
        self.iteration += 1;

        for hero in Player::BOTH {
            engine::compute_best_response_evs(
                &self.tree,
                &mut self.strategy,
                hero,
                &self.oracle,
                self.config.parallel,
            )?;
            let best_response = engine::best_response_ranges(&self.tree, &self.strategy, hero);
            self.strategy
                .update_ranges(&self.tree, hero, &best_response, self.iteration);
        }
        Ok(())
    }

    /// Run the configured number of iterations.
    pub fn solve(&mut self) -> Result<&FPStats, SolveError> {
        self.solve_with_callback(|_| {})
    }

    /// Run the configured number of iterations, calling `callback` with the
    /// updated statistics every `log_interval` iterations.
    pub fn solve_with_callback<F>(&mut self, mut callback: F) -> Result<&FPStats, SolveError>
    where
        F: FnMut(&FPStats),
    {
        let iterations = self.config.iterations;
        let interval = self.config.log_interval;
        let start_time = Instant::now();
        let elapsed_before = self.stats.elapsed_seconds;
        info!(
            "solving {} nodes for {} iterations (stack {})",
            self.tree.len(),
            iterations,
            self.tree.effective_stack()
        );

        let progress = if self.config.show_progress {
            let pb = ProgressBar::new(iterations);
            if let Ok(style) = ProgressStyle::with_template(
                "  solving [{bar:40}] {pos}/{len} iters [{elapsed} < {eta}, {per_sec}]",
            ) {
                pb.set_style(style);
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        for _ in 0..iterations {
            self.run_iteration()?;
            progress.inc(1);

            if self.iteration % interval == 0 {
                let point = self.convergence_point();
                debug!(
                    "iteration {}: A {:?} B {:?} gap {:?}",
                    point.iteration, point.average_ev_a, point.average_ev_b, point.exploitability
                );
                self.stats.record(point);
                self.update_stats(elapsed_before + start_time.elapsed().as_secs_f64());
                callback(&self.stats);
            }
        }

        progress.finish_and_clear();
        self.update_stats(elapsed_before + start_time.elapsed().as_secs_f64());
        info!(
            "solved {} iterations in {:.2}s ({:.1} it/s)",
            self.stats.iterations, self.stats.elapsed_seconds, self.stats.iterations_per_second
        );
        Ok(&self.stats)
    }

    fn update_stats(&mut self, elapsed_seconds: f64) {
        self.stats.iterations = self.iteration;
        self.stats.elapsed_seconds = elapsed_seconds;
        self.stats.update_rate();
    }

    /// Both players' best-response values at the root and the gap between
    /// their sum and the chips in play.
    pub fn convergence_point(&self) -> ConvergencePoint {
        let average_ev_a = self.average_ev(Player::A, ROOT);
        let average_ev_b = self.average_ev(Player::B, ROOT);
        let exploitability = match (average_ev_a, average_ev_b) {
            (Some(a), Some(b)) => Some(a + b - 2.0 * self.tree.effective_stack()),
            _ => None,
        };
        ConvergencePoint {
            iteration: self.iteration,
            average_ev_a,
            average_ev_b,
            exploitability,
        }
    }

    /// Range-weighted mean EV of `player` at `node`; `None` if no hand in
    /// the player's range can be held there.
    pub fn average_ev(&self, player: Player, node: NodeId) -> Option<f64> {
        let ev = self.strategy.average_ev(&self.tree, player, node);
        if ev.is_none() {
            warn!("{} has no valid combos at node {}", player, node);
        }
        ev
    }

    /// Get the current iteration count.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Get current statistics.
    pub fn stats(&self) -> &FPStats {
        &self.stats
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FPConfig {
        &self.config
    }

    /// Get reference to the tree.
    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }

    /// Get reference to the oracle.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Get reference to the running strategies.
    pub fn strategy(&self) -> &StrategyPair {
        &self.strategy
    }

    /// Consume the solver, keeping the strategies.
    pub fn into_strategy(self) -> StrategyPair {
        self.strategy
    }

    /// Reset the strategies to the uniform random policy and clear stats.
    pub fn reset(&mut self) {
        self.strategy.initialize(&self.tree);
        self.iteration = 0;
        self.stats = FPStats::new();
    }

    /// Export ranges, EV tables and stats for serialization.
    pub fn export(&self) -> SolutionExport {
        let nodes = (0..self.tree.len())
            .map(|id| {
                let node = self.tree.node(id);
                let evs = |player: Player| -> Vec<Option<f64>> {
                    self.strategy
                        .ev_table(player, id)
                        .iter()
                        .map(|&ev| if ev < 0.0 { None } else { Some(ev) })
                        .collect()
                };
                NodeExport {
                    id,
                    parent: self.tree.parent(id),
                    actor: node.actor,
                    action: node.action,
                    board: node.board.to_string(),
                    cip_a: node.cip_a,
                    cip_b: node.cip_b,
                    range: self.strategy.range(id).clone(),
                    ev_a: evs(Player::A),
                    ev_b: evs(Player::B),
                }
            })
            .collect();

        SolutionExport {
            iteration: self.iteration,
            effective_stack: self.tree.effective_stack(),
            nodes,
            stats: self.stats.clone(),
        }
    }
}

/// Solve `tree` for `iterations` iterations with default settings and
/// return the final strategies. Missing starting ranges default to any
/// two cards.
pub fn solve<O: EquityOracle>(
    tree: DecisionTree,
    oracle: O,
    iterations: u64,
    start_a: Option<Range>,
    start_b: Option<Range>,
) -> Result<StrategyPair, SolveError> {
    let config = FPConfig::default().with_iterations(iterations);
    let mut solver = FPSolver::with_starting_ranges(
        tree,
        oracle,
        config,
        start_a.unwrap_or_else(Range::full),
        start_b.unwrap_or_else(Range::full),
    )?;
    solver.solve()?;
    Ok(solver.into_strategy())
}

/// Serializable solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionExport {
    /// Iterations completed.
    pub iteration: u64,
    /// Stack size at the start of the hand.
    pub effective_stack: f64,
    /// One entry per node, in index order.
    pub nodes: Vec<NodeExport>,
    /// Statistics.
    pub stats: FPStats,
}

/// One node of a [`SolutionExport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExport {
    /// Node index.
    pub id: NodeId,
    /// Parent index; `None` for the root.
    pub parent: Option<NodeId>,
    /// Who acts here.
    pub actor: Actor,
    /// Action that led here.
    pub action: Action,
    /// Board in card notation.
    pub board: String,
    /// Chips A has committed.
    pub cip_a: f64,
    /// Chips B has committed.
    pub cip_b: f64,
    /// Range that took the action into this node.
    pub range: Range,
    /// A's EV per hand index; `None` where the hand is impossible.
    pub ev_a: Vec<Option<f64>>,
    /// B's EV per hand index; `None` where the hand is impossible.
    pub ev_b: Vec<Option<f64>>,
}

impl SolutionExport {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Read back from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Errors that abort a solve.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// The configuration is invalid.
    Config(ConfigError),
    /// The equity oracle failed.
    Oracle(OracleError),
    /// The tree is malformed.
    Tree(TreeError),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Config(e) => write!(f, "Configuration error: {}", e),
            SolveError::Oracle(e) => write!(f, "Equity oracle error: {}", e),
            SolveError::Tree(e) => write!(f, "Tree error: {}", e),
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolveError::Config(e) => Some(e),
            SolveError::Oracle(e) => Some(e),
            SolveError::Tree(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SolveError {
    fn from(e: ConfigError) -> Self {
        SolveError::Config(e)
    }
}

impl From<OracleError> for SolveError {
    fn from(e: OracleError) -> Self {
        SolveError::Oracle(e)
    }
}

impl From<TreeError> for SolveError {
    fn from(e: TreeError) -> Self {
        SolveError::Tree(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Board, EquityTable, Hand};
    use crate::tree::DecisionNode;

    fn node(actor: Actor, cip_a: f64, cip_b: f64, action: Action) -> DecisionNode {
        DecisionNode::new(actor, cip_a, cip_b, Board::new(), action)
    }

    /// A shoves or folds from the small blind, B calls or folds.
    fn shove_fold() -> Result<DecisionTree, TreeError> {
        let mut tree = DecisionTree::new(10.0, node(Actor::PlayerA, 0.5, 1.0, Action::Start));
        tree.add_node(node(Actor::Leaf, 0.5, 1.0, Action::Fold(Player::A)), ROOT)?;
        let shove = tree.add_node(node(Actor::PlayerB, 10.0, 1.0, Action::Bet), ROOT)?;
        tree.add_node(node(Actor::Leaf, 10.0, 1.0, Action::Fold(Player::B)), shove)?;
        tree.add_node(node(Actor::Leaf, 10.0, 10.0, Action::Call), shove)?;
        Ok(tree)
    }

    fn high_card_table() -> EquityTable {
        let mut table = EquityTable::new();
        table.insert_with(Board::new(), |hero, villain| {
            let (h, v) = (hero.high().rank(), villain.high().rank());
            match h.cmp(&v) {
                std::cmp::Ordering::Greater => 1.0,
                std::cmp::Ordering::Less => 0.0,
                std::cmp::Ordering::Equal => 0.5,
            }
        });
        table
    }

    #[test]
    fn test_new_validates() {
        let table = high_card_table();
        let bad = FPConfig::new().with_iterations(0);
        assert_eq!(
            FPSolver::new(shove_fold().unwrap(), &table, bad).err(),
            Some(SolveError::Config(ConfigError::ZeroIterations))
        );

        let empty = EquityTable::new();
        assert!(matches!(
            FPSolver::new(shove_fold().unwrap(), &empty, FPConfig::default()),
            Err(SolveError::Oracle(OracleError::Unavailable { .. }))
        ));
    }

    #[test]
    fn test_tree_error_converts() {
        let mut tree = DecisionTree::new(10.0, node(Actor::Leaf, 0.0, 0.0, Action::Start));
        let result: Result<NodeId, SolveError> = tree
            .add_node(node(Actor::Leaf, 0.0, 0.0, Action::Call), ROOT)
            .map_err(SolveError::from);
        assert_eq!(result, Err(SolveError::Tree(TreeError::LeafParent(ROOT))));
    }

    #[test]
    fn test_new_rejects_root_over_stack() {
        let tree = DecisionTree::new(10.0, node(Actor::Leaf, 0.0, 15.0, Action::Fold(Player::B)));
        let table = high_card_table();
        assert_eq!(
            FPSolver::new(tree, &table, FPConfig::default()).err(),
            Some(SolveError::Tree(TreeError::CipExceedsStack { node: ROOT, player: Player::B }))
        );
    }

    #[test]
    fn test_shove_fold_converges_on_aces() {
        let table = high_card_table();
        let config = FPConfig::new().with_iterations(30).with_log_interval(10);
        let mut solver = FPSolver::new(shove_fold().unwrap(), &table, config).unwrap();

        let mut calls = 0;
        let stats = solver.solve_with_callback(|_| calls += 1).unwrap();
        assert_eq!(stats.iterations, 30);
        assert_eq!(stats.history.len(), 3);
        assert!(stats.history.iter().all(|p| p.exploitability.map_or(false, f64::is_finite)));
        assert_eq!(calls, 3);

        // Aces always shove: the fold share shrinks as 1/(n + 2).
        let aa = Hand::parse("AhAs").unwrap();
        let strategy = solver.strategy();
        assert!((strategy.range(1).fraction(aa) - 1.0 / 32.0).abs() < 1e-9);
        assert!(strategy.range(2).fraction(aa) > 0.95);

        // Each player's actions at a node partition the hands that reach it.
        for h in Hand::all() {
            let a = strategy.range(1).fraction(h) + strategy.range(2).fraction(h);
            assert!((a - 1.0).abs() < 1e-9);
            let b = strategy.range(3).fraction(h) + strategy.range(4).fraction(h);
            assert!((b - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_run_iteration_and_reset() {
        let table = high_card_table();
        let config = FPConfig::new().with_parallel(false);
        let mut solver = FPSolver::new(shove_fold().unwrap(), &table, config).unwrap();
        let initial = solver.strategy().clone();

        solver.run_iteration().unwrap();
        assert_eq!(solver.iteration(), 1);
        assert_ne!(solver.strategy().range(2), initial.range(2));
        assert!(solver.average_ev(Player::A, ROOT).is_some());

        solver.reset();
        assert_eq!(solver.iteration(), 0);
        assert_eq!(solver.strategy().range(2), initial.range(2));
    }

    #[test]
    fn test_solve_helper_matches_solver() {
        let table = high_card_table();
        let strategy = solve(shove_fold().unwrap(), &table, 5, None, None).unwrap();

        let config = FPConfig::new().with_iterations(5);
        let mut solver = FPSolver::new(shove_fold().unwrap(), &table, config).unwrap();
        solver.solve().unwrap();
        for id in 0..strategy.len() {
            assert_eq!(strategy.range(id), solver.strategy().range(id));
        }
    }

    #[test]
    fn test_export_marks_impossible_hands() {
        let board = Board::parse("AhKd2c").unwrap();
        let root = DecisionNode::new(Actor::PlayerA, 1.0, 1.0, board.clone(), Action::Start);
        let mut tree = DecisionTree::new(10.0, root);
        tree.add_node(
            DecisionNode::new(Actor::Leaf, 1.0, 1.0, board.clone(), Action::Fold(Player::A)),
            ROOT,
        )
        .unwrap();
        let bet = tree
            .add_node(DecisionNode::new(Actor::PlayerB, 3.0, 1.0, board.clone(), Action::Bet), ROOT)
            .unwrap();
        tree.add_node(
            DecisionNode::new(Actor::Leaf, 3.0, 1.0, board.clone(), Action::Fold(Player::B)),
            bet,
        )
        .unwrap();

        let table = EquityTable::new();
        let config = FPConfig::new().with_iterations(2).with_log_interval(1);
        let mut solver = FPSolver::new(tree, &table, config).unwrap();
        solver.solve().unwrap();

        let export = solver.export();
        assert_eq!(export.iteration, 2);
        assert_eq!(export.nodes.len(), 4);
        assert_eq!(export.nodes[3].parent, Some(bet));
        let blocked = Hand::parse("AhAs").unwrap().index();
        let open = Hand::parse("QhQs").unwrap().index();
        assert_eq!(export.nodes[3].ev_a[blocked], None);
        assert_eq!(export.nodes[3].ev_a[open], Some(11.0));
        assert_eq!(export.nodes[1].ev_a[open], Some(9.0));
        // B can only fold, so betting is worth the fold for A.
        assert_eq!(export.nodes[ROOT].ev_a[open], Some(11.0));

        let json = export.to_json().unwrap();
        assert!(json.contains("null"));
        let back = SolutionExport::from_json(&json).unwrap();
        assert_eq!(back.nodes[3].ev_a[open], Some(11.0));
        assert_eq!(back.nodes[3].ev_a[blocked], None);
        assert_eq!(back.stats.history.len(), 2);
    }
}
