//! Running strategies of both players.
//!
//! A strategy is represented as ranges: `ranges[i]` is the range of hands
//! that took the action leading into node `i`. The player who took it is
//! the actor at node `i`'s parent. Alongside the ranges, the pair holds
//! each player's per-node, per-hand EV table from the latest
//! best-response pass.

use crate::cards::range::COMBO_EPSILON;
use crate::cards::{Hand, Range, NUM_HANDS};
use crate::tree::{Actor, DecisionTree, NodeId, Player};

/// EV table marker for a hand that cannot be held at a node.
///
/// Real EVs are chip counts and never negative, so any negative entry is
/// this marker. Public accessors return `None` instead.
pub const IMPOSSIBLE_EV: f64 = -1.0;

/// Weight kept by the running range on iteration `n` (1-indexed).
///
/// `1 - 1/(n + 2)`: strictly between 0 and 1, rising toward 1.
pub fn step_weight(n: u64) -> f64 {
    1.0 - 1.0 / (n as f64 + 2.0)
}

/// Blend `best_response` into `running`:
/// `running * step(n) + best_response * (1 - step(n))`.
pub fn update_range(running: &mut Range, best_response: &Range, n: u64) {
    running.blend(best_response, step_weight(n));
}

/// Ranges and EV tables for both players over one tree.
#[derive(Debug, Clone)]
pub struct StrategyPair {
    starting: [Range; 2],
    ranges: Vec<Range>,
    evs: [Vec<Vec<f64>>; 2],
}

impl StrategyPair {
    /// Strategies for `tree` where both players start with any two cards.
    pub fn new(tree: &DecisionTree) -> Self {
        Self::with_starting_ranges(tree, Range::full(), Range::full())
    }

    /// Strategies for `tree` from the given starting ranges, initialized to
    /// a uniformly random policy.
    pub fn with_starting_ranges(tree: &DecisionTree, start_a: Range, start_b: Range) -> Self {
        let n = tree.len();
        let mut pair = Self {
            starting: [start_a, start_b],
            ranges: vec![Range::new(); n],
            evs: [vec![vec![0.0; NUM_HANDS]; n], vec![vec![0.0; NUM_HANDS]; n]],
        };
        pair.initialize(tree);
        pair
    }

    /// Reset every range to the uniformly random policy: at a player node
    /// with `k` children each child gets the player's starting range times
    /// the reach so far divided by `k`, minus hands blocked by the board.
    pub fn initialize(&mut self, tree: &DecisionTree) {
        let mut scales = vec![[1.0f64; 2]; tree.len()];
        for id in tree.preorder() {
            let node = tree.node(id);
            let children = tree.children(id);
            let mut scale = scales[id];
            if let Some(player) = node.actor.player() {
                if !children.is_empty() {
                    scale[player.index()] /= children.len() as f64;
                }
                for &child in children {
                    let mut range = self.starting[player.index()].clone();
                    range.scale(scale[player.index()]);
                    range.remove_conflicting(node.board.cards());
                    self.ranges[child] = range;
                }
            }
            for &child in children {
                scales[child] = scale;
            }
        }
    }

    /// Number of nodes covered.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the pair covers no nodes.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Starting range of `player`.
    pub fn starting_range(&self, player: Player) -> &Range {
        &self.starting[player.index()]
    }

    /// Range that took the action into `node`.
    pub fn range(&self, node: NodeId) -> &Range {
        &self.ranges[node]
    }

    /// All per-node ranges.
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// The range `player` holds on arrival at `node`: the range stored at
    /// the nearest node reached by one of `player`'s own actions, or the
    /// starting range if there is none.
    pub fn most_recent_range(&self, tree: &DecisionTree, player: Player, node: NodeId) -> &Range {
        let own = Actor::from(player);
        let mut current = node;
        while let Some(parent) = tree.parent(current) {
            if tree.node(parent).actor == own {
                return &self.ranges[current];
            }
            current = parent;
        }
        self.starting_range(player)
    }

    /// EV of `hand` for `player` at `node`; `None` if the hand cannot be
    /// held there.
    pub fn ev(&self, player: Player, node: NodeId, hand: Hand) -> Option<f64> {
        let ev = self.evs[player.index()][node][hand.index()];
        if ev < 0.0 {
            None
        } else {
            Some(ev)
        }
    }

    /// Raw EV table of `player` at `node`, with [`IMPOSSIBLE_EV`] markers.
    pub fn ev_table(&self, player: Player, node: NodeId) -> &[f64] {
        &self.evs[player.index()][node]
    }

    pub(crate) fn ev_tables(&self, player: Player) -> &[Vec<f64>] {
        &self.evs[player.index()]
    }

    pub(crate) fn set_ev_table(&mut self, player: Player, node: NodeId, table: Vec<f64>) {
        self.evs[player.index()][node] = table;
    }

    /// Blend `best_response` into every range that follows one of
    /// `player`'s decisions. `best_response` is indexed by node.
    pub fn update_ranges(
        &mut self,
        tree: &DecisionTree,
        player: Player,
        best_response: &[Range],
        n: u64,
    ) {
        let own = Actor::from(player);
        for id in 0..tree.len() {
            if tree.node(id).actor != own {
                continue;
            }
            for &child in tree.children(id) {
                update_range(&mut self.ranges[child], &best_response[child], n);
            }
        }
    }

    /// Range-weighted mean EV of `player` at `node` over the hands that
    /// can be held there.
    ///
    /// Returns `None` when the player's range holds no such hand.
    pub fn average_ev(&self, tree: &DecisionTree, player: Player, node: NodeId) -> Option<f64> {
        let range = self.most_recent_range(tree, player, node);
        let table = &self.evs[player.index()][node];
        let mut summed = 0.0;
        let mut combos = 0.0;
        for (ev, &frac) in table.iter().zip(range.as_slice()) {
            if *ev >= 0.0 {
                summed += ev * frac;
                combos += frac;
            }
        }
        if combos <= COMBO_EPSILON {
            None
        } else {
            Some(summed / combos)
        }
    }

    /// One line per non-root node: who acted, how, and how many combos
    /// took that action.
    pub fn summary(&self, tree: &DecisionTree) -> String {
        let mut out = String::new();
        for id in 1..tree.len() {
            let actor = tree.parent_actor(id).unwrap_or(Actor::Nature);
            let node = tree.node(id);
            let line = match actor.player() {
                Some(_) => format!(
                    "{}: {} {} ({:.2} combos)\n",
                    id,
                    actor,
                    node.action,
                    self.ranges[id].total()
                ),
                None => format!("{}: {} {} {}\n", id, actor, node.action, node.board),
            };
            out.push_str(&line);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Board, Card};
    use crate::tree::{Action, DecisionNode, ROOT};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn node(actor: Actor, cip_a: f64, cip_b: f64, action: Action) -> DecisionNode {
        DecisionNode::new(actor, cip_a, cip_b, Board::new(), action)
    }

    /// A: fold / bet; after the bet B: fold / call / raise; after the
    /// raise A: fold / call.
    fn three_level() -> DecisionTree {
        let mut tree = DecisionTree::new(10.0, node(Actor::PlayerA, 1.0, 1.0, Action::Start));
        tree.add_node(node(Actor::Leaf, 1.0, 1.0, Action::Fold(Player::A)), ROOT).unwrap();
        let bet = tree.add_node(node(Actor::PlayerB, 3.0, 1.0, Action::Bet), ROOT).unwrap();
        tree.add_node(node(Actor::Leaf, 3.0, 1.0, Action::Fold(Player::B)), bet).unwrap();
        tree.add_node(node(Actor::Leaf, 3.0, 3.0, Action::Call), bet).unwrap();
        let raise = tree.add_node(node(Actor::PlayerA, 3.0, 10.0, Action::Bet), bet).unwrap();
        tree.add_node(node(Actor::Leaf, 3.0, 10.0, Action::Fold(Player::A)), raise).unwrap();
        tree.add_node(node(Actor::Leaf, 10.0, 10.0, Action::Call), raise).unwrap();
        tree
    }

    fn random_range(rng: &mut StdRng) -> Range {
        let mut range = Range::new();
        for hand in Hand::all() {
            range.set_fraction(hand, rng.gen::<f64>());
        }
        range
    }

    #[test]
    fn test_step_weight() {
        assert!((step_weight(1) - 2.0 / 3.0).abs() < 1e-12);
        assert!((step_weight(8) - 0.9).abs() < 1e-12);
        assert!(step_weight(1_000_000) < 1.0);
        assert!(step_weight(1) > 0.0);
    }

    #[test]
    fn test_update_range_blend_law() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in [1u64, 5, 40] {
            let old = random_range(&mut rng);
            let br = random_range(&mut rng);
            let mut running = old.clone();
            update_range(&mut running, &br, n);
            let w = step_weight(n);
            for hand in Hand::all() {
                let expected = old.fraction(hand) * w + br.fraction(hand) * (1.0 - w);
                assert!((running.fraction(hand) - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_initialize_uniform_policy() {
        let tree = three_level();
        let pair = StrategyPair::new(&tree);
        let aa = Hand::parse("AhAs").unwrap();

        // A's first decision splits in two.
        assert_eq!(pair.range(1).fraction(aa), 0.5);
        assert_eq!(pair.range(2).fraction(aa), 0.5);
        // B's decision splits in three from a full range.
        for child in [3, 4, 5] {
            assert!((pair.range(child).fraction(aa) - 1.0 / 3.0).abs() < 1e-12);
        }
        // A's second decision splits A's remaining half.
        assert_eq!(pair.range(6).fraction(aa), 0.25);
        assert_eq!(pair.range(7).fraction(aa), 0.25);
    }

    #[test]
    fn test_initialize_masks_board() {
        let board = Board::parse("AhKd2c").unwrap();
        let root = DecisionNode::new(Actor::PlayerB, 1.0, 1.0, board.clone(), Action::Start);
        let mut tree = DecisionTree::new(10.0, root);
        tree.add_node(
            DecisionNode::new(Actor::Leaf, 1.0, 1.0, board.clone(), Action::Check),
            ROOT,
        )
        .unwrap();

        let pair = StrategyPair::new(&tree);
        assert_eq!(pair.range(1).fraction(Hand::parse("AhAs").unwrap()), 0.0);
        assert_eq!(pair.range(1).fraction(Hand::parse("QhQs").unwrap()), 1.0);
        assert!((pair.range(1).total() - 1176.0).abs() < 1e-9);
    }

    #[test]
    fn test_nature_passes_scale_through() {
        let flop = Board::parse("2c3d4h").unwrap();
        let root = DecisionNode::new(Actor::PlayerA, 1.0, 1.0, flop.clone(), Action::Start);
        let mut tree = DecisionTree::new(10.0, root);
        tree.add_node(DecisionNode::new(Actor::Leaf, 1.0, 1.0, flop.clone(), Action::Fold(Player::A)), ROOT)
            .unwrap();
        let deal = tree
            .add_node(DecisionNode::new(Actor::Nature, 1.0, 1.0, flop.clone(), Action::Check), ROOT)
            .unwrap();
        let turn = flop.with_card(Card::parse("5s").unwrap());
        let after = tree
            .add_node(DecisionNode::new(Actor::PlayerA, 1.0, 1.0, turn.clone(), Action::Deal), deal)
            .unwrap();
        tree.add_node(DecisionNode::new(Actor::Leaf, 1.0, 1.0, turn.clone(), Action::Check), after)
            .unwrap();
        tree.add_node(DecisionNode::new(Actor::Leaf, 5.0, 1.0, turn, Action::Bet), after)
            .unwrap();

        let pair = StrategyPair::new(&tree);
        let kk = Hand::parse("KhKs").unwrap();
        assert_eq!(pair.range(5).fraction(kk), 0.25);
        assert_eq!(pair.range(5).fraction(Hand::parse("5sKs").unwrap()), 0.0);
    }

    #[test]
    fn test_most_recent_range() {
        let tree = three_level();
        let start_a = Range::from_notation("AA,KK").unwrap();
        let pair = StrategyPair::with_starting_ranges(&tree, start_a.clone(), Range::full());

        // At the root A holds the starting range.
        assert_eq!(pair.most_recent_range(&tree, Player::A, ROOT), &start_a);
        assert_eq!(pair.most_recent_range(&tree, Player::B, 2), &Range::full());
        // Below the bet, A holds the betting range.
        assert_eq!(pair.most_recent_range(&tree, Player::A, 5), pair.range(2));
        assert_eq!(pair.most_recent_range(&tree, Player::B, 7), pair.range(5));
        assert_eq!(pair.most_recent_range(&tree, Player::A, 7), pair.range(7));
    }

    #[test]
    fn test_average_ev_excludes_impossible() {
        let tree = three_level();
        let mut pair = StrategyPair::new(&tree);
        let mut table = vec![IMPOSSIBLE_EV; NUM_HANDS];
        table[Hand::parse("AhAs").unwrap().index()] = 12.0;
        table[Hand::parse("KhKs").unwrap().index()] = 6.0;
        pair.set_ev_table(Player::A, ROOT, table);

        assert_eq!(pair.average_ev(&tree, Player::A, ROOT), Some(9.0));
        assert_eq!(pair.ev(Player::A, ROOT, Hand::parse("2c2d").unwrap()), None);
        assert_eq!(pair.ev(Player::A, ROOT, Hand::parse("AhAs").unwrap()), Some(12.0));
    }

    #[test]
    fn test_average_ev_none_without_combos() {
        let tree = three_level();
        let mut pair = StrategyPair::new(&tree);
        pair.set_ev_table(Player::B, ROOT, vec![IMPOSSIBLE_EV; NUM_HANDS]);
        assert_eq!(pair.average_ev(&tree, Player::B, ROOT), None);

        let empty = StrategyPair::with_starting_ranges(&tree, Range::new(), Range::full());
        assert_eq!(empty.average_ev(&tree, Player::A, ROOT), None);
    }

    #[test]
    fn test_update_ranges_touches_only_own_actions() {
        let tree = three_level();
        let mut pair = StrategyPair::new(&tree);
        let before = pair.clone();
        let best_response = vec![Range::full(); tree.len()];
        pair.update_ranges(&tree, Player::B, &best_response, 1);

        for id in [1, 2, 6, 7] {
            assert_eq!(pair.range(id), before.range(id));
        }
        let aa = Hand::parse("AhAs").unwrap();
        let expected = (1.0 / 3.0) * step_weight(1) + (1.0 - step_weight(1));
        assert!((pair.range(3).fraction(aa) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_summary() {
        let tree = three_level();
        let text = StrategyPair::new(&tree).summary(&tree);
        assert_eq!(text.lines().count(), tree.len() - 1);
        assert!(text.starts_with("1: PlayerA fold (663.00 combos)"));
    }
}
