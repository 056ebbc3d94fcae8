//! Arena-backed decision tree.
//!
//! Nodes live in a dense vector and refer to each other by index. The
//! root is index 0 and every node is appended after its parent, so the
//! tree is acyclic by construction.

use std::fmt;

use super::node::{Action, Actor, DecisionNode, Player};
use crate::cards::Board;

/// Index of a node in its tree.
pub type NodeId = usize;

/// The root is always the first node.
pub const ROOT: NodeId = 0;

/// An explicit decision tree for a heads-up subgame.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    /// Stack size at the start of the hand, when neither player has
    /// committed chips.
    effective_stack: f64,
    nodes: Vec<DecisionNode>,
    parents: Vec<Option<NodeId>>,
    children: Vec<Vec<NodeId>>,
}

impl DecisionTree {
    /// Create a tree holding only `root`.
    pub fn new(effective_stack: f64, root: DecisionNode) -> Self {
        Self {
            effective_stack,
            nodes: vec![root],
            parents: vec![None],
            children: vec![Vec::new()],
        }
    }

    /// Append `node` as the last child of `parent`.
    pub fn add_node(&mut self, node: DecisionNode, parent: NodeId) -> Result<NodeId, TreeError> {
        let parent_node = self.nodes.get(parent).ok_or(TreeError::UnknownParent(parent))?;
        if parent_node.is_leaf() {
            return Err(TreeError::LeafParent(parent));
        }
        if let Action::Fold(folder) = node.action {
            if parent_node.actor != Actor::from(folder) {
                return Err(TreeError::FoldMismatch {
                    parent,
                    parent_actor: parent_node.actor,
                    folder: folder.into(),
                });
            }
        }
        let id = self.nodes.len();
        self.check_cips(id, &node)?;

        self.nodes.push(node);
        self.parents.push(Some(parent));
        self.children.push(Vec::new());
        self.children[parent].push(id);
        Ok(id)
    }

    /// Check that no node commits more chips than the effective stack.
    ///
    /// [`DecisionTree::add_node`] checks every child, so this only adds
    /// the root.
    pub fn validate(&self) -> Result<(), TreeError> {
        self.nodes
            .iter()
            .enumerate()
            .try_for_each(|(id, node)| self.check_cips(id, node))
    }

    fn check_cips(&self, id: NodeId, node: &DecisionNode) -> Result<(), TreeError> {
        match Player::BOTH.into_iter().find(|&p| node.cip(p) > self.effective_stack) {
            Some(player) => Err(TreeError::CipExceedsStack { node: id, player }),
            None => Ok(()),
        }
    }

    /// Stack size at the start of the hand.
    pub fn effective_stack(&self) -> f64 {
        self.effective_stack
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node at `id`.
    pub fn node(&self, id: NodeId) -> &DecisionNode {
        &self.nodes[id]
    }

    /// All nodes in index order.
    pub fn nodes(&self) -> &[DecisionNode] {
        &self.nodes
    }

    /// Parent of `id`; `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id]
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id]
    }

    /// Who acted to reach `id` (the parent's actor); `None` at the root.
    pub fn parent_actor(&self, id: NodeId) -> Option<Actor> {
        self.parents[id].map(|p| self.nodes[p].actor)
    }

    /// Parents before children, siblings in insertion order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children[id].iter().rev());
        }
        order
    }

    /// Children before parents, siblings in insertion order.
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack = vec![(ROOT, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            stack.extend(self.children[id].iter().rev().map(|&c| (c, false)));
        }
        order
    }

    /// Distinct boards at showdown leaves, where equities are needed.
    pub fn showdown_boards(&self) -> Vec<&Board> {
        let mut boards: Vec<&Board> = Vec::new();
        for node in &self.nodes {
            if node.is_leaf() && node.folder().is_none() && !boards.contains(&&node.board) {
                boards.push(&node.board);
            }
        }
        boards
    }
}

impl fmt::Display for DecisionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DecisionTree (effective stack {})", self.effective_stack)?;
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id];
            let edge = match node.action {
                Action::Deal => format!("deal {}", node.board),
                other => other.to_string(),
            };
            writeln!(
                f,
                "{:indent$}{}: {} ({}, {}) <- {}",
                "",
                id,
                node.actor,
                node.cip_a,
                node.cip_b,
                edge,
                indent = depth * 2
            )?;
            stack.extend(self.children[id].iter().rev().map(|&c| (c, depth + 1)));
        }
        Ok(())
    }
}

/// Errors from building a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The parent index is not in the tree.
    UnknownParent(NodeId),
    /// Leaves cannot have children.
    LeafParent(NodeId),
    /// A fold must be taken by the player acting at the parent.
    FoldMismatch {
        /// Parent index.
        parent: NodeId,
        /// Who acts at the parent.
        parent_actor: Actor,
        /// Who the fold names.
        folder: Actor,
    },
    /// A node commits more chips for `player` than the effective stack.
    CipExceedsStack {
        /// Index the node has or would have had.
        node: NodeId,
        /// Player whose commitment is too large.
        player: Player,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::UnknownParent(id) => write!(f, "Parent node {} is not in the tree", id),
            TreeError::LeafParent(id) => write!(f, "Node {} is a leaf and cannot have children", id),
            TreeError::FoldMismatch { parent, parent_actor, folder } => write!(
                f,
                "Fold by {} cannot follow node {} where {} acts",
                folder, parent, parent_actor
            ),
            TreeError::CipExceedsStack { node, player } => {
                write!(f, "Node {} commits more than the effective stack for {}", node, player)
            }
        }
    }
}

impl std::error::Error for TreeError {}
