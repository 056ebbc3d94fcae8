//! Card representation for poker.
//!
//! This module provides the card-level building blocks used by ranges,
//! oracles and the decision tree:
//! - `Card`: A single playing card ordinal, or the unknown placeholder
//! - `Hand`: A canonical pair of hole cards (lower ordinal first)
//! - `Board`: Community cards (0-5 known cards)
//! - `conflicts`: Shared-card detection between any two card collections

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cards in the deck.
pub const NUM_CARDS: usize = 52;

/// Number of ranks (2 through A).
pub const NUM_RANKS: usize = 13;

/// Number of suits.
pub const NUM_SUITS: usize = 4;

/// Number of distinct two-card hands: C(52, 2).
pub const NUM_HANDS: usize = 1326;

/// Rank characters for display, lowest first.
pub const RANK_CHARS: [char; 13] = ['2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A'];

/// Suit characters for display.
pub const SUIT_CHARS: [char; 4] = ['c', 'd', 'h', 's'];

/// Ordinal reserved for a card that has not been dealt yet.
const UNKNOWN_ID: u8 = 255;

/// A single playing card.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    /// Card ordinal 0-51: rank * 4 + suit, or 255 for unknown.
    id: u8,
}

impl Card {
    /// Placeholder for an undealt card. Never conflicts with anything.
    pub const UNKNOWN: Card = Card { id: UNKNOWN_ID };

    /// Create a card from rank (0-12) and suit (0-3), or `None` when
    /// either is out of range.
    pub fn try_new(rank: u8, suit: u8) -> Option<Self> {
        (rank < 13 && suit < 4).then(|| Self::new(rank, suit))
    }

    /// Rank must be 0-12 and suit 0-3.
    #[inline]
    pub(crate) fn new(rank: u8, suit: u8) -> Self {
        debug_assert!(rank < 13, "rank must be 0-12");
        debug_assert!(suit < 4, "suit must be 0-3");
        Self { id: rank * 4 + suit }
    }

    /// `id` must be a real ordinal (0-51).
    #[inline]
    pub(crate) fn from_id(id: u8) -> Self {
        debug_assert!((id as usize) < NUM_CARDS, "card id must be 0-51");
        Self { id }
    }

    /// Parse a card from string like "As", "Kh", "2c". "__", "_" and "*"
    /// parse as [`Card::UNKNOWN`].
    pub fn parse(s: &str) -> Result<Self, CardParseError> {
        if matches!(s, "__" | "_" | "*") {
            return Ok(Self::UNKNOWN);
        }
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 2 {
            return Err(CardParseError::InvalidCard(s.to_string()));
        }
        let rank = parse_rank(chars[0]).ok_or_else(|| CardParseError::InvalidCard(s.to_string()))?;
        let suit = parse_suit(chars[1]).ok_or_else(|| CardParseError::InvalidCard(s.to_string()))?;
        Ok(Self::new(rank, suit))
    }

    /// Get the card's ordinal.
    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Whether this is a real card rather than the unknown placeholder.
    #[inline]
    pub fn is_known(&self) -> bool {
        (self.id as usize) < NUM_CARDS
    }

    /// Get the card's rank (0-12: 2-A).
    #[inline]
    pub fn rank(&self) -> u8 {
        self.id / 4
    }

    /// Get the card's suit (0-3).
    #[inline]
    pub fn suit(&self) -> u8 {
        self.id % 4
    }

    /// Iterate over all 52 real cards in ordinal order.
    pub fn all() -> impl Iterator<Item = Card> {
        (0..NUM_CARDS as u8).map(Card::from_id)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_known() {
            return write!(f, "__");
        }
        write!(
            f,
            "{}{}",
            RANK_CHARS[self.rank() as usize],
            SUIT_CHARS[self.suit() as usize]
        )
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Parse a rank character (case-insensitive) to 0-12.
pub fn parse_rank(c: char) -> Option<u8> {
    RANK_CHARS
        .iter()
        .position(|&r| r == c.to_ascii_uppercase())
        .map(|r| r as u8)
}

/// Parse a suit character (case-insensitive) to 0-3.
pub fn parse_suit(c: char) -> Option<u8> {
    SUIT_CHARS
        .iter()
        .position(|&s| s == c.to_ascii_lowercase())
        .map(|s| s as u8)
}

/// Returns true when the two collections share a real card.
///
/// The unknown placeholder never matches, so undealt board slots are
/// ignored on either side.
pub fn conflicts(cards1: &[Card], cards2: &[Card]) -> bool {
    cards1
        .iter()
        .filter(|c| c.is_known())
        .any(|c| cards2.contains(c))
}

/// A player's two hole cards, canonicalized with the lower ordinal first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hand {
    low: Card,
    high: Card,
}

impl Hand {
    /// Create a hand from two cards in either order, or `None` unless both
    /// are dealt and distinct.
    pub fn try_new(card1: Card, card2: Card) -> Option<Self> {
        (card1.is_known() && card2.is_known() && card1 != card2).then(|| Self::new(card1, card2))
    }

    /// Both cards must be dealt and distinct.
    pub(crate) fn new(card1: Card, card2: Card) -> Self {
        debug_assert!(card1.is_known() && card2.is_known(), "hand cards must be dealt");
        debug_assert!(card1 != card2, "hand cards must differ");
        if card1.id() <= card2.id() {
            Self { low: card1, high: card2 }
        } else {
            Self { low: card2, high: card1 }
        }
    }

    /// Parse a hand from string like "AhKs" or "Ah Ks".
    pub fn parse(s: &str) -> Result<Self, CardParseError> {
        let s = s.replace(' ', "");
        if s.len() != 4 || !s.is_ascii() {
            return Err(CardParseError::InvalidHand(s));
        }
        let c1 = Card::parse(&s[0..2])?;
        let c2 = Card::parse(&s[2..4])?;
        Self::try_new(c1, c2).ok_or(CardParseError::InvalidHand(s))
    }

    /// Rebuild a hand from its index (see [`Hand::index`]), which must be
    /// below `NUM_HANDS`.
    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index < NUM_HANDS);
        let mut low = 0usize;
        let mut remaining = index;
        while remaining >= NUM_CARDS - 1 - low {
            remaining -= NUM_CARDS - 1 - low;
            low += 1;
        }
        Self {
            low: Card::from_id(low as u8),
            high: Card::from_id((low + 1 + remaining) as u8),
        }
    }

    /// Position of this hand in lexicographic (low, high) order, 0-1325.
    #[inline]
    pub fn index(&self) -> usize {
        let lo = self.low.id() as usize;
        let hi = self.high.id() as usize;
        lo * (2 * NUM_CARDS - 1 - lo) / 2 + (hi - lo - 1)
    }

    /// Iterate over all 1326 hands in index order.
    pub fn all() -> impl Iterator<Item = Hand> {
        (0..NUM_CARDS as u8).flat_map(|lo| {
            ((lo + 1)..NUM_CARDS as u8).map(move |hi| Hand {
                low: Card::from_id(lo),
                high: Card::from_id(hi),
            })
        })
    }

    /// Lower-ordinal card.
    #[inline]
    pub fn low(&self) -> Card {
        self.low
    }

    /// Higher-ordinal card.
    #[inline]
    pub fn high(&self) -> Card {
        self.high
    }

    /// Both cards as an array.
    #[inline]
    pub fn cards(&self) -> [Card; 2] {
        [self.low, self.high]
    }

    /// Check if a card is one of these hole cards.
    pub fn contains(&self, card: Card) -> bool {
        self.low == card || self.high == card
    }

    /// Check if hole cards are suited.
    pub fn is_suited(&self) -> bool {
        self.low.suit() == self.high.suit()
    }

    /// Check if hole cards are a pair.
    pub fn is_pair(&self) -> bool {
        self.low.rank() == self.high.rank()
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.low, self.high)
    }
}

impl fmt::Debug for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Community cards on the board.
///
/// Only dealt cards are stored; undealt slots are implied and surface as
/// [`Card::UNKNOWN`] through [`Board::slots`].
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    cards: Vec<Card>,
}

impl Board {
    /// Maximum number of community cards.
    pub const MAX_CARDS: usize = 5;

    /// Create an empty (preflop) board.
    pub fn new() -> Self {
        Self { cards: Vec::with_capacity(Self::MAX_CARDS) }
    }

    /// Create a board from cards. Unknown placeholders are dropped.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let cards: Vec<Card> = cards.into_iter().filter(Card::is_known).collect();
        debug_assert!(cards.len() <= Self::MAX_CARDS);
        Self { cards }
    }

    /// Parse a board from string like "AhKsQd" or "AhKsQd____".
    pub fn parse(s: &str) -> Result<Self, CardParseError> {
        let s = s.replace(' ', "");
        if !s.is_ascii() || s.len() % 2 != 0 || s.len() > 2 * Self::MAX_CARDS {
            return Err(CardParseError::InvalidBoard(s));
        }
        let mut cards = Vec::with_capacity(Self::MAX_CARDS);
        for i in (0..s.len()).step_by(2) {
            let card = Card::parse(&s[i..i + 2])?;
            if card.is_known() {
                if cards.contains(&card) {
                    return Err(CardParseError::InvalidBoard(s));
                }
                cards.push(card);
            }
        }
        Ok(Self { cards })
    }

    /// Number of dealt cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if no card has been dealt.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The dealt cards.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// The 5-slot form, padded with [`Card::UNKNOWN`].
    pub fn slots(&self) -> [Card; 5] {
        let mut slots = [Card::UNKNOWN; 5];
        slots[..self.cards.len()].copy_from_slice(&self.cards);
        slots
    }

    /// A new board with one more card dealt.
    pub fn with_card(&self, card: Card) -> Self {
        debug_assert!(self.cards.len() < Self::MAX_CARDS);
        let mut cards = self.cards.clone();
        cards.push(card);
        Self { cards }
    }

    /// Check if the board contains a specific card.
    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    /// Check if a hand shares a card with the board.
    pub fn blocks(&self, hand: Hand) -> bool {
        conflicts(&hand.cards(), &self.cards)
    }

    /// Number of cards not on the board.
    pub fn cards_remaining(&self) -> usize {
        NUM_CARDS - self.cards.len()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cards.is_empty() {
            return write!(f, "preflop");
        }
        for card in &self.cards {
            write!(f, "{}", card)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self)
    }
}

/// Errors from parsing card, hand or board strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardParseError {
    /// Not a two-character card or unknown placeholder.
    InvalidCard(String),
    /// Not two distinct real cards.
    InvalidHand(String),
    /// Too many cards, odd length, or a repeated card.
    InvalidBoard(String),
}

impl fmt::Display for CardParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardParseError::InvalidCard(s) => write!(f, "Invalid card: '{}'", s),
            CardParseError::InvalidHand(s) => write!(f, "Invalid hand: '{}'", s),
            CardParseError::InvalidBoard(s) => write!(f, "Invalid board: '{}'", s),
        }
    }
}

impl std::error::Error for CardParseError {}
