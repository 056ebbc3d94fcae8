//! Best-response evaluation by backward induction.
//!
//! For a fixed hero, one post-order pass over the tree computes hero's
//! maximally exploitative EV for every hand at every node against the
//! villain's current ranges:
//!
//! - **Fold leaf**: the folder loses what they committed, hand independent.
//! - **Showdown leaf**: hero's stack behind plus their equity share of the pot.
//! - **Hero node**: the best child for each hand.
//! - **Villain node**: children weighted by how many villain combos take each
//!   action, with hero's cards removed.
//! - **Nature node**: children weighted by how many villain combos are
//!   compatible with the dealt card(s).
//!
//! Hands that cannot be held at a node get [`IMPOSSIBLE_EV`] and never
//! enter an ancestor's max or weighted average.

use rayon::prelude::*;

use super::strategy::{StrategyPair, IMPOSSIBLE_EV};
use crate::cards::{ComboCounter, EquityOracle, Hand, OracleError, Range, NUM_HANDS};
use crate::tree::{Actor, DecisionTree, NodeId, Player};

/// Fill `strategy`'s EV tables for `hero` at every node.
///
/// Fails only when the oracle cannot answer for a showdown board.
pub fn compute_best_response_evs<O: EquityOracle + ?Sized>(
    tree: &DecisionTree,
    strategy: &mut StrategyPair,
    hero: Player,
    oracle: &O,
    parallel: bool,
) -> Result<(), OracleError> {
    for id in tree.postorder() {
        let table = match tree.node(id).actor {
            Actor::Leaf => match tree.node(id).folder() {
                Some(folder) => fold_evs(tree, id, hero, folder),
                None => showdown_evs(tree, strategy, id, hero, oracle, parallel)?,
            },
            Actor::Nature => nature_evs(tree, strategy, id, hero, parallel),
            actor if actor == Actor::from(hero) => hero_evs(tree, strategy, id, hero, parallel),
            _ => villain_evs(tree, strategy, id, hero, parallel),
        };
        strategy.set_ev_table(hero, id, table);
    }
    Ok(())
}

/// Hero's pure best response, as reach ranges indexed by node.
///
/// At each of hero's nodes every hand goes entirely to the child with the
/// highest EV (the lowest child index on ties), carrying the fraction of
/// the hand that reaches the node. Hands impossible at the node go nowhere.
/// Entries for nodes that do not follow a hero decision stay empty.
pub fn best_response_ranges(
    tree: &DecisionTree,
    strategy: &StrategyPair,
    hero: Player,
) -> Vec<Range> {
    let own = Actor::from(hero);
    let evs = strategy.ev_tables(hero);
    let mut ranges = vec![Range::new(); tree.len()];

    for id in tree.preorder() {
        if tree.node(id).actor != own {
            continue;
        }
        let reach = reach_range(tree, strategy, &ranges, hero, id).clone();
        let children = tree.children(id);
        for (hand, frac) in reach.iter() {
            if frac == 0.0 {
                continue;
            }
            let h = hand.index();
            let mut best: Option<(NodeId, f64)> = None;
            for &child in children {
                let ev = evs[child][h];
                if ev < 0.0 {
                    continue;
                }
                if best.map_or(true, |(_, b)| ev > b) {
                    best = Some((child, ev));
                }
            }
            if let Some((child, _)) = best {
                ranges[child].set_fraction(hand, frac);
            }
        }
    }
    ranges
}

/// Fraction of each hand with which hero arrives at `node` under the best
/// response built so far.
fn reach_range<'a>(
    tree: &DecisionTree,
    strategy: &'a StrategyPair,
    best_response: &'a [Range],
    hero: Player,
    node: NodeId,
) -> &'a Range {
    let own = Actor::from(hero);
    let mut current = node;
    while let Some(parent) = tree.parent(current) {
        if tree.node(parent).actor == own {
            return &best_response[current];
        }
        current = parent;
    }
    strategy.starting_range(hero)
}

/// Evaluate `f` for every hand, on the rayon pool when `parallel` is set.
fn per_hand<F>(parallel: bool, f: F) -> Vec<f64>
where
    F: Fn(Hand) -> f64 + Sync + Send,
{
    if parallel {
        (0..NUM_HANDS).into_par_iter().map(|i| f(Hand::from_index(i))).collect()
    } else {
        Hand::all().map(f).collect()
    }
}

/// Fallible variant of [`per_hand`].
fn try_per_hand<F>(parallel: bool, f: F) -> Result<Vec<f64>, OracleError>
where
    F: Fn(Hand) -> Result<f64, OracleError> + Sync + Send,
{
    if parallel {
        (0..NUM_HANDS).into_par_iter().map(|i| f(Hand::from_index(i))).collect()
    } else {
        Hand::all().map(f).collect()
    }
}

fn fold_evs(tree: &DecisionTree, id: NodeId, hero: Player, folder: Player) -> Vec<f64> {
    let node = tree.node(id);
    let stack = tree.effective_stack();
    let value = if folder == hero {
        stack - node.cip(hero)
    } else {
        stack + node.cip(hero.opponent())
    };
    Hand::all()
        .map(|hand| if node.board.blocks(hand) { IMPOSSIBLE_EV } else { value })
        .collect()
}

fn showdown_evs<O: EquityOracle + ?Sized>(
    tree: &DecisionTree,
    strategy: &StrategyPair,
    id: NodeId,
    hero: Player,
    oracle: &O,
    parallel: bool,
) -> Result<Vec<f64>, OracleError> {
    let node = tree.node(id);
    let board = &node.board;
    let villain_range = strategy.most_recent_range(tree, hero.opponent(), id);
    let counter = villain_range.combo_counter(board.cards());
    let behind = tree.effective_stack() - node.cip(hero);
    let pot = node.cip(hero) + node.cip(hero.opponent());

    try_per_hand(parallel, |hand| {
        if board.blocks(hand) || counter.count_excluding(hand) == 0.0 {
            return Ok(IMPOSSIBLE_EV);
        }
        let equity = oracle.equity(hand, board, villain_range)?;
        Ok(behind + pot * equity)
    })
}

fn hero_evs(
    tree: &DecisionTree,
    strategy: &StrategyPair,
    id: NodeId,
    hero: Player,
    parallel: bool,
) -> Vec<f64> {
    let evs = strategy.ev_tables(hero);
    let children = tree.children(id);
    per_hand(parallel, |hand| {
        children
            .iter()
            .map(|&child| evs[child][hand.index()])
            .filter(|&ev| ev >= 0.0)
            .fold(IMPOSSIBLE_EV, f64::max)
    })
}

fn villain_evs(
    tree: &DecisionTree,
    strategy: &StrategyPair,
    id: NodeId,
    hero: Player,
    parallel: bool,
) -> Vec<f64> {
    let board = &tree.node(id).board;
    let evs = strategy.ev_tables(hero);
    let children: Vec<(NodeId, ComboCounter<'_>)> = tree
        .children(id)
        .iter()
        .map(|&child| (child, strategy.range(child).combo_counter(board.cards())))
        .collect();

    per_hand(parallel, |hand| {
        if board.blocks(hand) {
            return IMPOSSIBLE_EV;
        }
        weighted_average(
            children
                .iter()
                .map(|(child, counter)| (evs[*child][hand.index()], counter.count_excluding(hand))),
        )
    })
}

fn nature_evs(
    tree: &DecisionTree,
    strategy: &StrategyPair,
    id: NodeId,
    hero: Player,
    parallel: bool,
) -> Vec<f64> {
    let board = &tree.node(id).board;
    let evs = strategy.ev_tables(hero);
    let villain_range = strategy.most_recent_range(tree, hero.opponent(), id);
    let children: Vec<(NodeId, ComboCounter<'_>)> = tree
        .children(id)
        .iter()
        .map(|&child| (child, villain_range.combo_counter(tree.node(child).board.cards())))
        .collect();

    per_hand(parallel, |hand| {
        if board.blocks(hand) {
            return IMPOSSIBLE_EV;
        }
        weighted_average(children.iter().map(|(child, counter)| {
            let dealt = tree.node(*child);
            let weight = if dealt.board.blocks(hand) {
                0.0
            } else {
                counter.count_excluding(hand) * dealt.arrival_weight
            };
            (evs[*child][hand.index()], weight)
        }))
    })
}

/// Weighted mean of `(ev, weight)` pairs over possible EVs with positive
/// weight; [`IMPOSSIBLE_EV`] if no weight remains.
fn weighted_average(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let mut summed = 0.0;
    let mut total = 0.0;
    for (ev, weight) in pairs {
        if ev < 0.0 || weight <= 0.0 {
            continue;
        }
        summed += ev * weight;
        total += weight;
    }
    if total > 0.0 {
        summed / total
    } else {
        IMPOSSIBLE_EV
    }
}
