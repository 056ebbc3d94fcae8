//! All-in equity lookups.
//!
//! The solver never evaluates showdowns itself. It asks an
//! [`EquityOracle`] for the equity of one hand against a range on a board.
//! [`EquityTable`] is the in-memory implementation: one hand-vs-hand
//! matrix per board, filled in ahead of time by whoever owns the data.

use rustc_hash::FxHashMap;
use std::fmt;

use super::card::{Board, Hand, NUM_HANDS};
use super::range::{Range, COMBO_EPSILON};

/// Source of all-in equities.
///
/// Implementations must be `Sync`: per-hand evaluation may run on the
/// rayon pool.
pub trait EquityOracle: Sync {
    /// Equity in `[0, 1]` of `hero` against `villain` on `board`.
    ///
    /// Villain combos sharing a card with `hero` or `board` are ignored.
    fn equity(&self, hero: Hand, board: &Board, villain: &Range) -> Result<f64, OracleError>;

    /// Whether equities for `board` can be answered at all.
    fn supports(&self, board: &Board) -> bool;
}

impl<O: EquityOracle + ?Sized> EquityOracle for &O {
    fn equity(&self, hero: Hand, board: &Board, villain: &Range) -> Result<f64, OracleError> {
        (**self).equity(hero, board, villain)
    }

    fn supports(&self, board: &Board) -> bool {
        (**self).supports(board)
    }
}

/// Hand-vs-hand equities for a single board.
#[derive(Clone)]
pub struct HandMatrix {
    /// equities[hero * NUM_HANDS + villain]
    equities: Vec<f32>,
}

impl Default for HandMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl HandMatrix {
    /// Create a matrix with every matchup at 0.
    pub fn new() -> Self {
        Self { equities: vec![0.0; NUM_HANDS * NUM_HANDS] }
    }

    /// Equity of `hero` against `villain`.
    #[inline]
    pub fn get(&self, hero: Hand, villain: Hand) -> f64 {
        self.equities[hero.index() * NUM_HANDS + villain.index()] as f64
    }

    /// Set the equity of `hero` against `villain`.
    #[inline]
    pub fn set(&mut self, hero: Hand, villain: Hand, equity: f64) {
        self.equities[hero.index() * NUM_HANDS + villain.index()] = equity as f32;
    }
}

impl fmt::Debug for HandMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandMatrix({} matchups)", self.equities.len())
    }
}

/// In-memory equity oracle keyed by board.
#[derive(Debug, Clone, Default)]
pub struct EquityTable {
    boards: FxHashMap<Board, HandMatrix>,
}

impl EquityTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the matrix for `board`, replacing any previous one.
    pub fn insert(&mut self, board: Board, matrix: HandMatrix) {
        self.boards.insert(board, matrix);
    }

    /// Register `board` with every unblocked, non-overlapping matchup set
    /// from `equity(hero, villain)`.
    pub fn insert_with<F>(&mut self, board: Board, equity: F)
    where
        F: Fn(Hand, Hand) -> f64,
    {
        let mut matrix = HandMatrix::new();
        for hero in Hand::all().filter(|h| !board.blocks(*h)) {
            for villain in Hand::all() {
                if board.blocks(villain) || hero.contains(villain.low()) || hero.contains(villain.high()) {
                    continue;
                }
                matrix.set(hero, villain, equity(hero, villain));
            }
        }
        self.insert(board, matrix);
    }

    /// The matrix for `board`, if loaded.
    pub fn get(&self, board: &Board) -> Option<&HandMatrix> {
        self.boards.get(board)
    }

    /// Number of boards loaded.
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    /// Whether no board is loaded.
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

impl EquityOracle for EquityTable {
    fn equity(&self, hero: Hand, board: &Board, villain: &Range) -> Result<f64, OracleError> {
        let matrix = self
            .boards
            .get(board)
            .ok_or_else(|| OracleError::Unavailable { board: board.clone() })?;
        if board.blocks(hero) {
            return Err(OracleError::ConflictingHand { hand: hero, board: board.clone() });
        }

        let mut weighted = 0.0;
        let mut combos = 0.0;
        for (v, frac) in villain.iter() {
            if frac == 0.0 || board.blocks(v) || hero.contains(v.low()) || hero.contains(v.high()) {
                continue;
            }
            weighted += matrix.get(hero, v) * frac;
            combos += frac;
        }

        if combos <= COMBO_EPSILON {
            return Err(OracleError::EmptyVillainRange { hand: hero });
        }
        Ok(weighted / combos)
    }

    fn supports(&self, board: &Board) -> bool {
        self.boards.contains_key(board)
    }
}

/// Errors raised by an equity oracle.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleError {
    /// No equities are available for this board. Fatal for a solve.
    Unavailable {
        /// The board that was requested.
        board: Board,
    },
    /// The hero hand shares a card with the board.
    ConflictingHand {
        /// Offending hand.
        hand: Hand,
        /// Board it overlaps.
        board: Board,
    },
    /// The villain range holds no combos compatible with the hero hand.
    EmptyVillainRange {
        /// The hero hand.
        hand: Hand,
    },
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Unavailable { board } => {
                write!(f, "No equities available for board {}", board)
            }
            OracleError::ConflictingHand { hand, board } => {
                write!(f, "Hand {} conflicts with board {}", hand, board)
            }
            OracleError::EmptyVillainRange { hand } => {
                write!(f, "Villain range has no combos compatible with {}", hand)
            }
        }
    }
}

impl std::error::Error for OracleError {}
