//! The code tree: a binary tree overlaid with a frequency-ordered list.
//!
//! Every node of the adaptive Huffman model lives in one arena (`Vec<Node>`)
//! and takes part in two structures at once:
//! - the **tree** (`parent` and the children stored in `NodeKind::Branch`)
//!   which yields the code for each character as a root-to-leaf path
//! - the **list** (`prev`/`next`) which keeps every tree node in
//!   non-decreasing frequency order between two sentinels
//!
//! All links are arena indices, so the rebalancing swap is a handful of
//! index assignments.
//!
//! # Layout
//!
//! ```text
//! HEAD <-> empty(0) <-> ... nodes by frequency ... <-> root <-> TAIL(inf)
//! ```
//!
//! # Invariants (checked by `validate`)
//! - every branch's frequency is the sum of its children's
//! - list frequencies are non-decreasing from head to tail
//! - at most one leaf per character
//! - exactly one empty leaf, always right after the head sentinel
//! - the sentinels are outside the tree; the tail has frequency `u64::MAX`

use crate::error::{ModelError, Result};
use std::collections::HashSet;

/// Index of a node in the arena.
pub type NodeId = usize;

/// Head sentinel of the frequency list.
pub const HEAD: NodeId = 0;

/// Tail sentinel of the frequency list.
pub const TAIL: NodeId = 1;

/// The root is created once and keeps its index for the tree's lifetime.
const ROOT: NodeId = 2;

/// What a node is, independent of its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// List head sentinel, not part of the tree
    Head,
    /// List tail sentinel, not part of the tree
    Tail,
    /// The leaf standing for every character not seen yet
    Empty,
    /// A leaf holding one character
    Character(char),
    /// An internal node with exactly two children
    Branch { left: NodeId, right: NodeId },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    frequency: u64,
    parent: Option<NodeId>,
    prev: NodeId,
    next: NodeId,
}

impl Node {
    fn new(kind: NodeKind, frequency: u64, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            frequency,
            parent,
            prev: HEAD,
            next: TAIL,
        }
    }
}

/// Arena-backed code tree with its frequency-ordered node list.
#[derive(Debug, Clone)]
pub struct CodeTree {
    nodes: Vec<Node>,
    empty: NodeId,
}

impl CodeTree {
    /// Create a tree whose root is the sole (empty) leaf.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            empty: ROOT,
        };
        tree.reset();
        tree
    }

    /// Return to the initial single-empty-leaf state.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::new(NodeKind::Head, 0, None));
        self.nodes.push(Node::new(NodeKind::Tail, u64::MAX, None));
        self.nodes.push(Node::new(NodeKind::Empty, 0, None));

        self.nodes[HEAD].next = ROOT;
        self.nodes[TAIL].prev = ROOT;
        self.nodes[ROOT].prev = HEAD;
        self.nodes[ROOT].next = TAIL;
        self.empty = ROOT;
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// The current empty leaf.
    pub fn empty_leaf(&self) -> NodeId {
        self.empty
    }

    /// Kind of node `id`.
    ///
    /// # Panics
    /// Panics if `id` is not a node of this tree. The same holds for
    /// `frequency`, `parent` and `bits_for_node`.
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    pub fn frequency(&self, id: NodeId) -> u64 {
        self.nodes[id].frequency
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Number of nodes in the tree (sentinels excluded).
    pub fn len(&self) -> usize {
        self.nodes.len() - 2
    }

    /// Always false: the empty leaf is never removed.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of distinct characters seen so far.
    pub fn distinct_characters(&self) -> usize {
        // Each character adds one branch and one character leaf.
        (self.len() - 1) / 2
    }

    /// Find the leaf for `character`, or the empty leaf if it was never seen.
    ///
    /// Scans from the tail backwards: the most frequent leaves sit at the
    /// high end of the list and are found first.
    pub fn find_node(&self, character: char) -> NodeId {
        let mut id = self.nodes[TAIL].prev;
        while id != HEAD {
            if self.nodes[id].kind == NodeKind::Character(character) {
                return id;
            }
            id = self.nodes[id].prev;
        }
        self.empty
    }

    /// Split the empty leaf to make room for a first-seen character.
    ///
    /// The old empty leaf becomes a branch (keeping its list position) with a
    /// new empty leaf on the left and the new character leaf on the right.
    /// Both new leaves are spliced in right after the head sentinel. The
    /// character leaf starts at frequency 0; `update_after_symbol` brings it
    /// and its ancestors up to date.
    ///
    /// Returns the new character leaf.
    pub(crate) fn insert_new_character(&mut self, character: char) -> NodeId {
        let branch = self.empty;
        debug_assert_eq!(self.nodes[branch].kind, NodeKind::Empty);

        let empty = self.nodes.len();
        let leaf = empty + 1;
        self.nodes.push(Node::new(NodeKind::Empty, 0, Some(branch)));
        self.nodes.push(Node::new(NodeKind::Character(character), 0, Some(branch)));

        // HEAD <-> empty <-> leaf <-> branch
        let first = self.nodes[HEAD].next;
        self.nodes[HEAD].next = empty;
        self.nodes[empty].prev = HEAD;
        self.nodes[empty].next = leaf;
        self.nodes[leaf].prev = empty;
        self.nodes[leaf].next = first;
        self.nodes[first].prev = leaf;

        self.nodes[branch].kind = NodeKind::Branch {
            left: empty,
            right: leaf,
        };
        self.empty = empty;

        leaf
    }

    /// Root-to-node path: `false` for a left edge, `true` for a right edge.
    ///
    /// For the empty leaf the caller appends the character literal itself.
    pub fn bits_for_node(&self, id: NodeId) -> Vec<bool> {
        let mut bits = Vec::new();
        let mut child = id;
        while let Some(parent) = self.nodes[child].parent {
            let is_right = matches!(
                self.nodes[parent].kind,
                NodeKind::Branch { right, .. } if right == child
            );
            bits.push(is_right);
            child = parent;
        }
        bits.reverse();
        bits
    }

    /// Count one more occurrence of the leaf `id` and rebalance.
    ///
    /// Walks from the leaf to the root. At each node the frequency is
    /// incremented; if that leaves a lower-frequency node further along the
    /// list, the node trades places (in tree and list) with the block leader
    /// before the walk moves on to its, possibly new, parent.
    pub(crate) fn update_after_symbol(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            self.nodes[node].frequency += 1;

            // The root never moves.
            if self.nodes[node].parent.is_some() {
                if let Some(leader) = self.leader(node) {
                    self.swap(node, leader);
                }
            }

            current = self.nodes[node].parent;
        }
    }

    /// Furthest node after `id` in the list whose frequency is below the
    /// just-incremented frequency of `id`, skipping its parent.
    fn leader(&self, id: NodeId) -> Option<NodeId> {
        let frequency = self.nodes[id].frequency;
        let parent = self.nodes[id].parent;

        let mut leader = None;
        let mut cursor = self.nodes[id].next;
        // The tail's frequency is u64::MAX, which bounds the scan.
        while self.nodes[cursor].frequency < frequency {
            if Some(cursor) != parent {
                leader = Some(cursor);
            }
            cursor = self.nodes[cursor].next;
        }
        leader
    }

    /// Exchange two nodes' positions in both the tree and the list.
    ///
    /// `a` must come before `b` in the list.
    fn swap(&mut self, a: NodeId, b: NodeId) {
        let (Some(parent_a), Some(parent_b)) = (self.nodes[a].parent, self.nodes[b].parent) else {
            return;
        };

        if parent_a == parent_b {
            if let NodeKind::Branch { left, right } = self.nodes[parent_a].kind {
                self.nodes[parent_a].kind = NodeKind::Branch {
                    left: right,
                    right: left,
                };
            }
        } else {
            self.replace_child(parent_a, a, b);
            self.replace_child(parent_b, b, a);
            self.nodes[a].parent = Some(parent_b);
            self.nodes[b].parent = Some(parent_a);
        }

        let (a_prev, a_next) = (self.nodes[a].prev, self.nodes[a].next);
        let (b_prev, b_next) = (self.nodes[b].prev, self.nodes[b].next);

        if a_next == b {
            // a_prev <-> b <-> a <-> b_next
            self.link(a_prev, b);
            self.link(b, a);
            self.link(a, b_next);
        } else {
            // a_prev <-> b <-> a_next ... b_prev <-> a <-> b_next
            self.link(a_prev, b);
            self.link(b, a_next);
            self.link(b_prev, a);
            self.link(a, b_next);
        }
    }

    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if let NodeKind::Branch { left, right } = &mut self.nodes[parent].kind {
            if *left == old {
                *left = new;
            } else if *right == old {
                *right = new;
            }
        }
    }

    fn link(&mut self, first: NodeId, second: NodeId) {
        self.nodes[first].next = second;
        self.nodes[second].prev = first;
    }

    /// Node ids in list order, sentinels excluded.
    pub fn list_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut id = self.nodes[HEAD].next;
        while id != TAIL && order.len() <= self.len() {
            order.push(id);
            id = self.nodes[id].next;
        }
        order
    }

    /// Check the tree and list invariants, returning the first violation found.
    pub fn validate(&self) -> Result<()> {
        let fail =
            |reason: String| -> Result<()> { Err(ModelError::InvariantViolation(reason).into()) };

        if self.nodes[HEAD].kind != NodeKind::Head || self.nodes[TAIL].kind != NodeKind::Tail {
            return fail("sentinels misplaced".to_string());
        }
        if self.nodes[TAIL].frequency != u64::MAX {
            return fail("tail sentinel frequency is not infinite".to_string());
        }
        if self.nodes[HEAD].parent.is_some() || self.nodes[TAIL].parent.is_some() {
            return fail("sentinel has a parent".to_string());
        }
        if self.nodes[ROOT].parent.is_some() {
            return fail("root has a parent".to_string());
        }

        let first = self.nodes[HEAD].next;
        if first != self.empty || self.nodes[first].kind != NodeKind::Empty {
            return fail(format!("node {first} after head is not the empty leaf"));
        }
        if self.nodes[first].frequency != 0 {
            return fail("empty leaf has non-zero frequency".to_string());
        }

        let order = self.list_order();
        if order.len() != self.len() {
            return fail(format!(
                "list holds {} nodes, arena holds {}",
                order.len(),
                self.len()
            ));
        }

        let mut previous = HEAD;
        let mut last_frequency = 0;
        let mut empties = 0;
        let mut seen = HashSet::new();

        for &id in &order {
            let node = &self.nodes[id];
            if node.prev != previous {
                return fail(format!("node {id} has a broken prev link"));
            }
            if node.frequency < last_frequency {
                return fail(format!(
                    "list out of order at node {id}: {} after {last_frequency}",
                    node.frequency
                ));
            }
            last_frequency = node.frequency;
            previous = id;

            match node.kind {
                NodeKind::Empty => empties += 1,
                NodeKind::Character(character) => {
                    if !seen.insert(character) {
                        return fail(format!("character {character:?} has two leaves"));
                    }
                    if node.frequency == 0 {
                        return fail(format!("character {character:?} has frequency 0"));
                    }
                }
                NodeKind::Branch { left, right } => {
                    let sum = self.nodes[left].frequency + self.nodes[right].frequency;
                    if node.frequency != sum {
                        return fail(format!(
                            "branch {id} has frequency {} but children sum to {sum}",
                            node.frequency
                        ));
                    }
                    if self.nodes[left].parent != Some(id) || self.nodes[right].parent != Some(id) {
                        return fail(format!("children of branch {id} do not point back"));
                    }
                }
                NodeKind::Head | NodeKind::Tail => {
                    return fail(format!("sentinel {id} inside the list"));
                }
            }
        }

        if self.nodes[TAIL].prev != previous {
            return fail("tail has a broken prev link".to_string());
        }
        if empties != 1 {
            return fail(format!("{empties} empty leaves"));
        }

        Ok(())
    }
}

impl Default for CodeTree {
    fn default() -> Self {
        Self::new()
    }
}
