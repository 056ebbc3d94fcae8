//! Fractional hand ranges.
//!
//! A [`Range`] stores, for every one of the 1326 canonical hands, the
//! fraction of that combo a player holds at some point in the game.
//! Fractions are never clamped: callers keep them in `[0, 1]`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::card::{
    parse_rank, parse_suit, Board, Card, Hand, NUM_CARDS, NUM_HANDS, NUM_RANKS, NUM_SUITS,
    RANK_CHARS,
};
use super::equity::{EquityOracle, OracleError};

/// Combo counts at or below this are treated as empty.
pub const COMBO_EPSILON: f64 = 1e-9;

/// A poker range as per-combo fractions.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    fracs: Vec<f64>,
}

impl Default for Range {
    fn default() -> Self {
        Self::new()
    }
}

impl Range {
    /// Create an empty range.
    pub fn new() -> Self {
        Self { fracs: vec![0.0; NUM_HANDS] }
    }

    /// Create a range holding `frac` of every combo.
    pub fn with_fraction(frac: f64) -> Self {
        Self { fracs: vec![frac; NUM_HANDS] }
    }

    /// "Any two cards": every combo at 1.0.
    pub fn full() -> Self {
        Self::with_fraction(1.0)
    }

    /// Fraction of `hand` held.
    #[inline]
    pub fn fraction(&self, hand: Hand) -> f64 {
        self.fracs[hand.index()]
    }

    /// Set the fraction of `hand`.
    #[inline]
    pub fn set_fraction(&mut self, hand: Hand, frac: f64) {
        self.fracs[hand.index()] = frac;
    }

    /// Set every combo to `frac`.
    pub fn set_all(&mut self, frac: f64) {
        self.fracs.iter_mut().for_each(|f| *f = frac);
    }

    /// Multiply every combo by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.fracs.iter_mut().for_each(|f| *f *= factor);
    }

    /// Replace with `self * keep + other * (1 - keep)`.
    pub fn blend(&mut self, other: &Range, keep: f64) {
        for (f, &o) in self.fracs.iter_mut().zip(other.fracs.iter()) {
            *f = *f * keep + o * (1.0 - keep);
        }
    }

    /// Total number of combos held.
    pub fn total(&self) -> f64 {
        self.fracs.iter().sum()
    }

    /// Iterate over `(hand, fraction)` in hand index order.
    pub fn iter(&self) -> impl Iterator<Item = (Hand, f64)> + '_ {
        Hand::all().zip(self.fracs.iter().copied())
    }

    /// Raw fractions in hand index order.
    pub fn as_slice(&self) -> &[f64] {
        &self.fracs
    }

    /// Zero every combo that shares a card with `cards`.
    pub fn remove_conflicting(&mut self, cards: &[Card]) {
        let dead = card_mask(cards);
        if dead == 0 {
            return;
        }
        for (f, hand) in self.fracs.iter_mut().zip(Hand::all()) {
            if hand_mask(hand) & dead != 0 {
                *f = 0.0;
            }
        }
    }

    /// Number of combos held that share no card with `cards`.
    pub fn count_excluding_conflicts(&self, cards: &[Card]) -> f64 {
        let dead = card_mask(cards);
        self.iter()
            .filter(|(hand, _)| hand_mask(*hand) & dead == 0)
            .map(|(_, f)| f)
            .sum()
    }

    /// Precompute per-card totals so that combo counts excluding any one
    /// hand (on top of `dead`) can be answered in constant time.
    pub fn combo_counter(&self, dead: &[Card]) -> ComboCounter<'_> {
        let dead = card_mask(dead);
        let mut total = 0.0;
        let mut per_card = [0.0; NUM_CARDS];
        for (hand, f) in self.iter() {
            if f == 0.0 || hand_mask(hand) & dead != 0 {
                continue;
            }
            total += f;
            per_card[hand.low().id() as usize] += f;
            per_card[hand.high().id() as usize] += f;
        }
        ComboCounter { range: self, dead, total, per_card }
    }

    /// Set every combo named by `notation` to `value`.
    ///
    /// Terms are comma separated: `QQ` (all pairs of that rank), `AK` (all
    /// sixteen combos), `AKs` / `AKo`, or an explicit `AhKd`. Nothing is
    /// modified if any term is invalid.
    pub fn set_from_notation(&mut self, notation: &str, value: f64) -> Result<(), RangeError> {
        let hands = parse_notation(notation)?;
        for hand in hands {
            self.set_fraction(hand, value);
        }
        Ok(())
    }

    /// Build a range holding 1.0 of every combo named by `notation`.
    pub fn from_notation(notation: &str) -> Result<Self, RangeError> {
        let mut range = Self::new();
        range.set_from_notation(notation, 1.0)?;
        Ok(range)
    }

    /// Average fraction over the combos of a rank class such as AKs (4
    /// combos), AKo (12) or 33 (6, with `suited == false`).
    ///
    /// Returns `None` for a suited pocket pair, which has no combos.
    pub fn ambiguous_fraction(&self, rank1: u8, rank2: u8, suited: bool) -> Option<f64> {
        let hands = class_hands(rank1, rank2, Some(suited));
        if hands.is_empty() {
            return None;
        }
        let sum: f64 = hands.iter().map(|&h| self.fraction(h)).sum();
        Some(sum / hands.len() as f64)
    }

    /// 13x13 snapshot of class fractions. Row and column run from A down
    /// to 2; suited classes sit above the diagonal, offsuit below, pairs on
    /// it.
    pub fn grid(&self) -> [[f64; NUM_RANKS]; NUM_RANKS] {
        let mut grid = [[0.0; NUM_RANKS]; NUM_RANKS];
        for (row, cells) in grid.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                let r1 = (NUM_RANKS - 1 - row) as u8;
                let r2 = (NUM_RANKS - 1 - col) as u8;
                *cell = self.ambiguous_fraction(r1, r2, row < col).unwrap_or(0.0);
            }
        }
        grid
    }

    /// Compact notation for the combos held at exactly 1.0.
    ///
    /// Whole classes use shorthand (`QQ`, `AK`, `AKs`, `AKo`); partial classes
    /// fall back to explicit combos. Fractional combos are not represented.
    pub fn to_notation(&self) -> String {
        let full = |h: &Hand| (self.fraction(*h) - 1.0).abs() < 1e-12;
        let mut terms: Vec<String> = Vec::new();
        let push_class = |terms: &mut Vec<String>, name: String, hands: Vec<Hand>| {
            if hands.iter().all(full) {
                terms.push(name);
            } else {
                terms.extend(hands.iter().filter(|h| full(*h)).map(|h| h.to_string()));
            }
        };

        for hi in (0..NUM_RANKS as u8).rev() {
            for lo in (0..=hi).rev() {
                let (h, l) = (RANK_CHARS[hi as usize], RANK_CHARS[lo as usize]);
                if hi == lo {
                    push_class(&mut terms, format!("{}{}", h, l), class_hands(hi, lo, None));
                    continue;
                }
                let suited = class_hands(hi, lo, Some(true));
                let offsuit = class_hands(hi, lo, Some(false));
                if suited.iter().chain(offsuit.iter()).all(full) {
                    terms.push(format!("{}{}", h, l));
                } else {
                    push_class(&mut terms, format!("{}{}s", h, l), suited);
                    push_class(&mut terms, format!("{}{}o", h, l), offsuit);
                }
            }
        }
        terms.join(",")
    }

    /// Every hand not blocked by `board`, paired with its equity against
    /// `opponent`, best first. Ties keep hand index order. Hands against
    /// which the opponent holds no combos are left out.
    pub fn ranked_by_equity<O: EquityOracle + ?Sized>(
        opponent: &Range,
        board: &Board,
        oracle: &O,
    ) -> Result<Vec<(Hand, f64)>, OracleError> {
        let counter = opponent.combo_counter(board.cards());
        let mut ranked = Vec::with_capacity(NUM_HANDS);
        for hand in Hand::all() {
            if board.blocks(hand) || counter.count_excluding(hand) <= COMBO_EPSILON {
                continue;
            }
            ranked.push((hand, oracle.equity(hand, board, opponent)?));
        }
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        Ok(ranked)
    }

    /// Hold exactly the top `fraction` of all unblocked hands, ranked by
    /// equity against any two cards on `board`; everything else goes to 0.
    pub fn set_to_top_fraction<O: EquityOracle + ?Sized>(
        &mut self,
        fraction: f64,
        board: &Board,
        oracle: &O,
    ) -> Result<(), OracleError> {
        let ranked = Self::ranked_by_equity(&Range::full(), board, oracle)?;
        let remaining = board.cards_remaining();
        let combos = remaining * (remaining - 1) / 2;
        let take = ((fraction * combos as f64).floor() as usize).min(ranked.len());

        self.set_all(0.0);
        for &(hand, _) in ranked.iter().take(take) {
            self.set_fraction(hand, 1.0);
        }
        Ok(())
    }

    /// Step points `(cumulative combos, equity)` of this range's equity
    /// distribution against `villain`, strongest hands first.
    pub fn equity_distribution<O: EquityOracle + ?Sized>(
        &self,
        villain: &Range,
        board: &Board,
        oracle: &O,
    ) -> Result<Vec<(f64, f64)>, OracleError> {
        let mut points = Vec::new();
        let mut combos = 0.0;
        for (hand, equity) in Self::ranked_by_equity(villain, board, oracle)? {
            points.push((combos, equity));
            combos += self.fraction(hand);
            points.push((combos, equity));
        }
        Ok(points)
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Range({:.2} combos)", self.total())
    }
}

/// Constant-time "combos excluding this hand" lookups over a range with
/// a fixed set of dead cards removed.
pub struct ComboCounter<'a> {
    range: &'a Range,
    dead: u64,
    total: f64,
    per_card: [f64; NUM_CARDS],
}

impl ComboCounter<'_> {
    /// Combos held after removing the dead cards.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Combos held that share no card with `hand` or the dead cards.
    pub fn count_excluding(&self, hand: Hand) -> f64 {
        let (lo, hi) = (hand.low().id() as usize, hand.high().id() as usize);
        let mut count = self.total - self.per_card[lo] - self.per_card[hi];
        if hand_mask(hand) & self.dead == 0 {
            count += self.range.fraction(hand);
        }
        if count <= COMBO_EPSILON {
            0.0
        } else {
            count
        }
    }
}

fn card_mask(cards: &[Card]) -> u64 {
    cards
        .iter()
        .filter(|c| c.is_known())
        .fold(0u64, |mask, c| mask | (1u64 << c.id()))
}

#[inline]
fn hand_mask(hand: Hand) -> u64 {
    (1u64 << hand.low().id()) | (1u64 << hand.high().id())
}

/// Distinct hands of a rank class. `suited == None` means every suit
/// combination.
fn class_hands(rank1: u8, rank2: u8, suited: Option<bool>) -> Vec<Hand> {
    let mut hands = Vec::with_capacity(16);
    for s1 in 0..NUM_SUITS as u8 {
        for s2 in 0..NUM_SUITS as u8 {
            if rank1 == rank2 && s1 >= s2 {
                continue;
            }
            match suited {
                Some(true) if s1 != s2 => continue,
                Some(false) if s1 == s2 => continue,
                _ => {}
            }
            hands.push(Hand::new(Card::new(rank1, s1), Card::new(rank2, s2)));
        }
    }
    hands
}

fn parse_notation(notation: &str) -> Result<Vec<Hand>, RangeError> {
    let cleaned = notation.replace(' ', "");
    let mut hands = Vec::new();
    for token in cleaned.split(',') {
        hands.extend(parse_term(token)?);
    }
    Ok(hands)
}

fn parse_term(token: &str) -> Result<Vec<Hand>, RangeError> {
    let chars: Vec<char> = token.chars().collect();
    let rank = |c: char| parse_rank(c).ok_or(RangeError::InvalidRank(c));
    let suit = |c: char| parse_suit(c).ok_or(RangeError::InvalidSuit(c));

    match chars.len() {
        2 => Ok(class_hands(rank(chars[0])?, rank(chars[1])?, None)),
        3 => {
            let (r1, r2) = (rank(chars[0])?, rank(chars[1])?);
            let suited = match chars[2].to_ascii_lowercase() {
                's' => true,
                'o' => false,
                other => return Err(RangeError::InvalidSuffix(other)),
            };
            if suited && r1 == r2 {
                return Err(RangeError::SuitedPair(token.to_string()));
            }
            Ok(class_hands(r1, r2, Some(suited)))
        }
        4 => {
            let c1 = Card::new(rank(chars[0])?, suit(chars[1])?);
            let c2 = Card::new(rank(chars[2])?, suit(chars[3])?);
            if c1 == c2 {
                return Err(RangeError::DuplicateCard(token.to_string()));
            }
            Ok(vec![Hand::new(c1, c2)])
        }
        _ => Err(RangeError::InvalidLength(token.to_string())),
    }
}

/// Errors from range notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// A term that is not 2, 3 or 4 characters long.
    InvalidLength(String),
    /// Unrecognized rank character.
    InvalidRank(char),
    /// Unrecognized suit character.
    InvalidSuit(char),
    /// Third character of a class term is neither 's' nor 'o'.
    InvalidSuffix(char),
    /// A suited pocket pair such as "QQs".
    SuitedPair(String),
    /// An explicit combo naming the same card twice.
    DuplicateCard(String),
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::InvalidLength(t) => {
                write!(f, "Range term '{}' must be 2 to 4 characters", t)
            }
            RangeError::InvalidRank(c) => write!(f, "Invalid rank '{}'", c),
            RangeError::InvalidSuit(c) => write!(f, "Invalid suit '{}'", c),
            RangeError::InvalidSuffix(c) => write!(f, "Invalid suffix '{}', expected 's' or 'o'", c),
            RangeError::SuitedPair(t) => write!(f, "Cannot have suited pocket pair '{}'", t),
            RangeError::DuplicateCard(t) => write!(f, "Combo '{}' repeats a card", t),
        }
    }
}

impl std::error::Error for RangeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::equity::EquityTable;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn card(s: &str) -> Card {
        Card::parse(s).unwrap()
    }

    fn hand(s: &str) -> Hand {
        Hand::parse(s).unwrap()
    }

    fn random_range(seed: u64) -> Range {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut range = Range::new();
        for h in Hand::all() {
            range.set_fraction(h, rng.gen::<f64>());
        }
        range
    }

    /// Higher top rank wins, equal top rank splits.
    fn high_card_table(board: &Board) -> EquityTable {
        let mut table = EquityTable::new();
        table.insert_with(board.clone(), |hero, villain| {
            match hero.high().rank().max(hero.low().rank()).cmp(&villain.high().rank().max(villain.low().rank())) {
                Ordering::Greater => 1.0,
                Ordering::Less => 0.0,
                Ordering::Equal => 0.5,
            }
        });
        table
    }

    #[test]
    fn test_set_all() {
        let mut range = Range::new();
        range.set_all(0.37);
        assert!(Hand::all().all(|h| range.fraction(h) == 0.37));
        assert!((range.total() - 0.37 * NUM_HANDS as f64).abs() < 1e-9);
    }

    #[test]
    fn test_set_fraction_canonicalizes() {
        let mut range = Range::new();
        range.set_fraction(Hand::new(card("Ah"), card("2c")), 0.25);
        assert_eq!(range.fraction(Hand::new(card("2c"), card("Ah"))), 0.25);
        assert_eq!(range.total(), 0.25);
    }

    #[test]
    fn test_scale() {
        let mut range = Range::full();
        range.scale(0.5);
        assert_eq!(range.fraction(hand("AhKd")), 0.5);
    }

    #[test]
    fn test_remove_conflicting() {
        let mut range = Range::full();
        range.remove_conflicting(&[card("Ah"), Card::UNKNOWN]);
        assert_eq!(range.fraction(hand("AhKd")), 0.0);
        assert_eq!(range.fraction(hand("KdAh")), 0.0);
        assert_eq!(range.fraction(hand("AsKd")), 1.0);
        assert_eq!(range.total(), 1275.0);
    }

    #[test]
    fn test_remove_conflicting_idempotent() {
        let dead = [card("Ah"), card("7c"), card("2s")];
        let mut once = random_range(7);
        once.remove_conflicting(&dead);
        let mut twice = once.clone();
        twice.remove_conflicting(&dead);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_count_excluding_conflicts() {
        let range = Range::full();
        assert_eq!(range.count_excluding_conflicts(&[card("Ah"), card("Kd")]), 1225.0);
        assert_eq!(range.count_excluding_conflicts(&[]), NUM_HANDS as f64);
    }

    #[test]
    fn test_combo_counter_matches_direct_count() {
        let range = random_range(11);
        let board = [card("Ah"), card("7c"), card("2s")];
        let counter = range.combo_counter(&board);

        for h in [hand("KdQd"), hand("Ah3c"), hand("7d7h"), hand("TsJs")] {
            let mut dead = board.to_vec();
            dead.extend(h.cards());
            let direct = range.count_excluding_conflicts(&dead);
            assert!((counter.count_excluding(h) - direct).abs() < 1e-9);
        }
        assert!((counter.total() - range.count_excluding_conflicts(&board)).abs() < 1e-9);
    }

    #[test]
    fn test_notation_classes() {
        let range = Range::from_notation("QQ, AK, 98s, T2o").unwrap();
        assert_eq!(range.total(), 6.0 + 16.0 + 4.0 + 12.0);
        assert_eq!(range.fraction(hand("QhQs")), 1.0);
        assert_eq!(range.fraction(hand("9h8h")), 1.0);
        assert_eq!(range.fraction(hand("9h8d")), 0.0);
        assert_eq!(range.fraction(hand("Tc2d")), 1.0);
    }

    #[test]
    fn test_notation_explicit_combo() {
        let mut range = Range::new();
        range.set_from_notation("AhKd", 0.5).unwrap();
        assert_eq!(range.fraction(hand("KdAh")), 0.5);
        assert_eq!(range.total(), 0.5);
    }

    #[test]
    fn test_notation_errors_leave_range_untouched() {
        let mut range = Range::new();
        assert_eq!(
            range.set_from_notation("AK,QQs", 1.0),
            Err(RangeError::SuitedPair("QQs".to_string()))
        );
        assert_eq!(range.total(), 0.0);

        assert!(matches!(range.set_from_notation("AKQJT", 1.0), Err(RangeError::InvalidLength(_))));
        assert!(matches!(range.set_from_notation("", 1.0), Err(RangeError::InvalidLength(_))));
        assert_eq!(range.set_from_notation("AKx", 1.0), Err(RangeError::InvalidSuffix('x')));
        assert_eq!(range.set_from_notation("AZ", 1.0), Err(RangeError::InvalidRank('Z')));
        assert_eq!(range.set_from_notation("AhAx", 1.0), Err(RangeError::InvalidSuit('x')));
        assert!(matches!(range.set_from_notation("AhAh", 1.0), Err(RangeError::DuplicateCard(_))));
        assert_eq!(range.total(), 0.0);
    }

    #[test]
    fn test_ambiguous_fraction() {
        let mut range = Range::new();
        range.set_fraction(hand("AhKh"), 1.0);
        range.set_fraction(hand("AsKs"), 1.0);
        assert_eq!(range.ambiguous_fraction(12, 11, true), Some(0.5));
        assert_eq!(range.ambiguous_fraction(12, 11, false), Some(0.0));
        assert_eq!(range.ambiguous_fraction(12, 12, true), None);

        range.set_from_notation("33", 1.0).unwrap();
        assert_eq!(range.ambiguous_fraction(1, 1, false), Some(1.0));
    }

    #[test]
    fn test_grid_layout() {
        let range = Range::from_notation("AKs,QQ").unwrap();
        let grid = range.grid();
        assert_eq!(grid[0][1], 1.0); // AKs above the diagonal
        assert_eq!(grid[1][0], 0.0); // AKo below it
        assert_eq!(grid[2][2], 1.0); // QQ
        assert_eq!(grid[12][12], 0.0);
    }

    #[test]
    fn test_notation_round_trip() {
        let mut range = Range::from_notation("AA,KQ,T9s,A5o").unwrap();
        range.set_fraction(hand("7h6h"), 1.0);
        range.set_fraction(hand("7c2d"), 1.0);

        let notation = range.to_notation();
        assert!(notation.starts_with("AA,"));
        let rebuilt = Range::from_notation(&notation).unwrap();
        assert_eq!(rebuilt, range);
    }

    #[test]
    fn test_ranked_by_equity() {
        let board = Board::parse("2c3d4h").unwrap();
        let table = high_card_table(&board);
        let ranked = Range::ranked_by_equity(&Range::full(), &board, &table).unwrap();

        assert_eq!(ranked.len(), 1176); // C(49, 2)
        assert!(ranked.iter().all(|(h, _)| !board.blocks(*h)));
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(ranked[0].0.high().rank(), 12);

        // Equal equities keep enumeration order.
        let aces: Vec<usize> = ranked
            .iter()
            .take_while(|(_, e)| (*e - ranked[0].1).abs() < 1e-12)
            .map(|(h, _)| h.index())
            .collect();
        assert!(aces.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ranked_by_equity_skips_hands_without_opponent_combos() {
        let board = Board::parse("2c3d4h").unwrap();
        let table = high_card_table(&board);
        let mut opponent = Range::new();
        opponent.set_fraction(hand("AhAs"), 1.0);
        let ranked = Range::ranked_by_equity(&opponent, &board, &table).unwrap();

        // Every hand holding Ah or As leaves the opponent empty.
        assert_eq!(ranked.len(), 1176 - 95);
        assert!(ranked.iter().all(|(h, _)| !h.contains(card("Ah")) && !h.contains(card("As"))));
    }

    #[test]
    fn test_set_to_top_full_range() {
        let board = Board::parse("2c3d4h").unwrap();
        let table = high_card_table(&board);
        let mut range = Range::new();
        range.set_to_top_fraction(1.0, &board, &table).unwrap();

        for h in Hand::all() {
            let expected = if board.blocks(h) { 0.0 } else { 1.0 };
            assert_eq!(range.fraction(h), expected);
        }
    }

    #[test]
    fn test_set_to_top_fraction_count() {
        let board = Board::parse("2c3d4h").unwrap();
        let table = high_card_table(&board);
        let mut range = Range::full();
        range.set_to_top_fraction(0.1, &board, &table).unwrap();
        assert_eq!(range.total(), 117.0); // floor(0.1 * 1176)
        assert_eq!(range.fraction(hand("AhAs")), 1.0);
    }

    #[test]
    fn test_set_to_top_requires_board() {
        let table = EquityTable::new();
        let mut range = Range::full();
        let err = range.set_to_top_fraction(0.5, &Board::new(), &table);
        assert!(matches!(err, Err(OracleError::Unavailable { .. })));
        assert_eq!(range.total(), NUM_HANDS as f64);
    }

    #[test]
    fn test_equity_distribution() {
        let board = Board::parse("2c3d4h").unwrap();
        let table = high_card_table(&board);
        let hero = Range::from_notation("AA,KK").unwrap();
        let points = hero.equity_distribution(&Range::full(), &board, &table).unwrap();

        assert_eq!(points.len(), 2 * 1176);
        assert_eq!(points.last().unwrap().0, 12.0);
        assert!(points.windows(2).all(|w| w[0].0 <= w[1].0 && w[0].1 >= w[1].1));
    }
}
