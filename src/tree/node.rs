//! Decision points of a heads-up game tree.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cards::Board;

/// One of the two seats in the subgame (SB and BB in a blind battle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    /// First seat.
    A,
    /// Second seat.
    B,
}

impl Player {
    /// Both players, A first.
    pub const BOTH: [Player; 2] = [Player::A, Player::B];

    /// The other player.
    pub fn opponent(self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    /// 0 for A, 1 for B.
    pub fn index(self) -> usize {
        match self {
            Player::A => 0,
            Player::B => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::A => write!(f, "PlayerA"),
            Player::B => write!(f, "PlayerB"),
        }
    }
}

/// Who acts at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    /// Player A decides.
    PlayerA,
    /// Player B decides.
    PlayerB,
    /// A card is dealt.
    Nature,
    /// The hand is over (fold or showdown).
    Leaf,
}

impl Actor {
    /// The deciding player, if any.
    pub fn player(self) -> Option<Player> {
        match self {
            Actor::PlayerA => Some(Player::A),
            Actor::PlayerB => Some(Player::B),
            Actor::Nature | Actor::Leaf => None,
        }
    }
}

impl From<Player> for Actor {
    fn from(player: Player) -> Self {
        match player {
            Player::A => Actor::PlayerA,
            Player::B => Actor::PlayerB,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::PlayerA => write!(f, "PlayerA"),
            Actor::PlayerB => write!(f, "PlayerB"),
            Actor::Nature => write!(f, "Nature"),
            Actor::Leaf => write!(f, "Leaf"),
        }
    }
}

/// The action that led into a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// The root: nothing has happened yet.
    Start,
    /// Bet or raise.
    Bet,
    /// Check.
    Check,
    /// Call.
    Call,
    /// The named player folded.
    Fold(Player),
    /// New board card(s) dealt; the node's board shows which.
    Deal,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Start => write!(f, "start"),
            Action::Bet => write!(f, "bet"),
            Action::Check => write!(f, "check"),
            Action::Call => write!(f, "call"),
            Action::Fold(_) => write!(f, "fold"),
            Action::Deal => write!(f, "deal"),
        }
    }
}

/// A decision point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionNode {
    /// Who acts here.
    pub actor: Actor,
    /// Chips player A has committed entering this node.
    pub cip_a: f64,
    /// Chips player B has committed entering this node.
    pub cip_b: f64,
    /// Board at this node; also the key for equity lookups.
    pub board: Board,
    /// Action that led here.
    pub action: Action,
    /// Relative likelihood of this node under a Nature parent (1.0 unless
    /// the run-outs are deliberately biased).
    pub arrival_weight: f64,
}

impl DecisionNode {
    /// Create a node with the default arrival weight.
    pub fn new(actor: Actor, cip_a: f64, cip_b: f64, board: Board, action: Action) -> Self {
        Self {
            actor,
            cip_a,
            cip_b,
            board,
            action,
            arrival_weight: 1.0,
        }
    }

    /// Builder method: set the arrival weight.
    pub fn with_arrival_weight(mut self, weight: f64) -> Self {
        self.arrival_weight = weight;
        self
    }

    /// Chips `player` has committed entering this node.
    pub fn cip(&self, player: Player) -> f64 {
        match player {
            Player::A => self.cip_a,
            Player::B => self.cip_b,
        }
    }

    /// Whether this is a terminal node.
    pub fn is_leaf(&self) -> bool {
        self.actor == Actor::Leaf
    }

    /// The player who folded into this node, if it is a fold.
    pub fn folder(&self) -> Option<Player> {
        match self.action {
            Action::Fold(player) => Some(player),
            _ => None,
        }
    }
}
