//! Bounded price-level index for one side of the book.
//!
//! ## Architecture
//!
//! Each side of the book is a red-black tree keyed by price, stored in a
//! slab arena:
//!
//! - **Slab**: node storage, parent/left/right links are slab keys
//! - **Red-black balancing**: O(log n) insert, delete and best lookup
//! - **Capacity bound**: the index is a fixed-size best-of-book cache
//!
//! ## Price Ordering
//!
//! The tree is always ordered low-to-high. Which end is "best" depends on
//! the side:
//!
//! - **Bid**: best = rightmost (highest), next best = in-order predecessor
//! - **Ask**: best = leftmost (lowest), next best = in-order successor
//!
//! ## Insert Rules
//!
//! 1. **Prune**: every resting level better than the incoming price is
//!    deleted. The feed only carries top-of-book, so a worse best implies
//!    the better levels traded away out of sight.
//! 2. **Aggregate**: an existing level at the same price absorbs the volume.
//! 3. **Evict**: once the index exceeds its capacity, the worst level goes.
//!
//! ## Example
//!
//! ```
//! use tickbook::orderbook::PriceLevelIndex;
//! use tickbook::types::Side;
//!
//! let mut bids = PriceLevelIndex::new(Side::Bid);
//! bids.insert(1.35000, 1.0);
//! assert_eq!(bids.best_price(), Some(1.35000));
//!
//! // A worse best bid prunes the stale 1.35000 level
//! bids.insert(1.34000, 2.0);
//! assert_eq!(bids.best_price(), Some(1.34000));
//! assert_eq!(bids.len(), 1);
//! ```

use std::cmp::Ordering;
use std::fmt;

use slab::Slab;
use thiserror::Error;
use tracing::trace;

use crate::orderbook::node::{Color, Dir, LevelKey, LevelNode};
use crate::types::Side;

/// Default number of levels kept per side
pub const DEFAULT_CAPACITY: usize = 10;

/// Price and volume of one level, detached from the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub price: f64,
    pub volume: f64,
}

/// Result of [`PriceLevelIndex::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new level was attached at this key
    Created(LevelKey),
    /// The volume was added to the existing level at this key
    Aggregated(LevelKey),
}

impl InsertOutcome {
    /// Key of the level holding the inserted volume
    #[inline]
    pub fn key(self) -> LevelKey {
        match self {
            InsertOutcome::Created(key) | InsertOutcome::Aggregated(key) => key,
        }
    }
}

/// A broken structural invariant, reported by [`PriceLevelIndex::validate`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexViolation {
    #[error("root is red")]
    RedRoot,

    #[error("red level {price} has a red child")]
    RedRed { price: f64 },

    #[error("unequal black height below level {price}")]
    BlackHeight { price: f64 },

    #[error("level {price} out of price order")]
    OutOfOrder { price: f64 },

    #[error("parent link of level {price} is inconsistent")]
    ParentLink { price: f64 },

    #[error("link to missing node {key}")]
    DanglingLink { key: LevelKey },

    #[error("reachable levels {reachable} != stored levels {stored}")]
    SizeMismatch { reachable: usize, stored: usize },

    #[error("{size} levels exceed capacity {capacity}")]
    OverCapacity { size: usize, capacity: usize },
}

/// One side of the book: a capacity-bounded red-black tree of price levels.
#[derive(Debug, Clone)]
pub struct PriceLevelIndex {
    /// Which side this index serves (decides best/worst direction)
    side: Side,

    /// Node storage
    nodes: Slab<LevelNode>,

    /// Tree root (slab key)
    root: Option<LevelKey>,

    /// Maximum number of levels kept after an insert completes
    capacity: usize,
}

impl PriceLevelIndex {
    /// Create an empty index holding at most [`DEFAULT_CAPACITY`] levels
    pub fn new(side: Side) -> Self {
        Self::with_capacity(side, DEFAULT_CAPACITY)
    }

    /// Create an empty index with a custom level capacity
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero
    pub fn with_capacity(side: Side, capacity: usize) -> Self {
        assert!(capacity > 0, "price-level index capacity must be positive");
        Self {
            side,
            // One spare slot: the tree briefly holds capacity + 1 before eviction
            nodes: Slab::with_capacity(capacity + 1),
            root: None,
            capacity,
        }
    }

    // ========================================================================
    // Size and Access
    // ========================================================================

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Number of live levels
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn root(&self) -> Option<LevelKey> {
        self.root
    }

    /// Get a level node by key
    #[inline]
    pub fn get(&self, key: LevelKey) -> Option<&LevelNode> {
        self.nodes.get(key)
    }

    /// Get a level's price and volume by key
    #[inline]
    pub fn level(&self, key: LevelKey) -> Option<Level> {
        self.nodes.get(key).map(|node| Level {
            price: node.price,
            volume: node.volume,
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Most favorable level: rightmost for Bid, leftmost for Ask
    pub fn find_best(&self) -> Option<LevelKey> {
        self.root.map(|root| self.extreme(root, self.best_dir()))
    }

    /// Least favorable level: leftmost for Bid, rightmost for Ask
    pub fn find_worst(&self) -> Option<LevelKey> {
        self.root
            .map(|root| self.extreme(root, self.best_dir().opposite()))
    }

    /// Price of the best level, None if the side is empty
    pub fn best_price(&self) -> Option<f64> {
        self.find_best().map(|key| self.nodes[key].price)
    }

    /// Best level, None if the side is empty
    pub fn best_level(&self) -> Option<Level> {
        self.find_best().and_then(|key| self.level(key))
    }

    /// The level a sweep reaches after exhausting `key`.
    ///
    /// For Bid this is the in-order predecessor (next lower price), for Ask
    /// the in-order successor (next higher price).
    pub fn find_next_best(&self, key: LevelKey) -> Option<LevelKey> {
        let toward = self.best_dir().opposite();
        let node = self.nodes.get(key)?;

        if let Some(child) = node.child(toward) {
            return Some(self.extreme(child, toward.opposite()));
        }

        // Climb until we leave a subtree hanging on the `toward` side
        let mut current = key;
        let mut parent = node.parent;
        while let Some(p) = parent {
            if self.nodes[p].child(toward) != Some(current) {
                break;
            }
            current = p;
            parent = self.nodes[p].parent;
        }
        parent
    }

    /// Exact-match lookup by price
    pub fn search(&self, price: f64) -> Option<LevelKey> {
        let mut current = self.root;
        while let Some(key) = current {
            let node = &self.nodes[key];
            current = match price.total_cmp(&node.price) {
                Ordering::Equal => return Some(key),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    /// All levels from best to worst
    pub fn levels(&self) -> Vec<Level> {
        let mut out = Vec::with_capacity(self.len());
        let mut cursor = self.find_best();
        while let Some(key) = cursor {
            let node = &self.nodes[key];
            out.push(Level {
                price: node.price,
                volume: node.volume,
            });
            cursor = self.find_next_best(key);
        }
        out
    }

    /// Sum of resting volume across all levels
    pub fn total_volume(&self) -> f64 {
        self.nodes.iter().map(|(_, node)| node.volume).sum()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Insert volume at a price, applying the prune, aggregate and evict rules.
    ///
    /// # Arguments
    ///
    /// * `price` - Level price
    /// * `volume` - Volume to rest (or add) at that price
    pub fn insert(&mut self, price: f64, volume: f64) -> InsertOutcome {
        let pruned = self.prune_better_than(price);
        if pruned > 0 {
            trace!(side = %self.side, price, pruned, "pruned stale levels");
        }

        let Some(mut current) = self.root else {
            let mut node = LevelNode::new(price, volume);
            node.color = Color::Black;
            let key = self.nodes.insert(node);
            self.root = Some(key);
            return InsertOutcome::Created(key);
        };

        let (parent, dir) = loop {
            let dir = match price.total_cmp(&self.nodes[current].price) {
                Ordering::Equal => {
                    self.nodes[current].volume += volume;
                    trace!(side = %self.side, price, volume, "aggregated into level");
                    return InsertOutcome::Aggregated(current);
                }
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
            };
            match self.nodes[current].child(dir) {
                Some(next) => current = next,
                None => break (current, dir),
            }
        };

        let mut node = LevelNode::new(price, volume);
        node.parent = Some(parent);
        let key = self.nodes.insert(node);
        self.nodes[parent].set_child(dir, Some(key));
        self.insert_fixup(key);

        if self.len() > self.capacity {
            if let Some(worst) = self.find_worst() {
                let evicted = self.remove_key(worst);
                trace!(side = %self.side, price = evicted.price, "evicted worst level");
            }
        }

        debug_assert_eq!(self.validate(), Ok(()));
        InsertOutcome::Created(key)
    }

    /// Remove a specific level
    ///
    /// # Returns
    ///
    /// The removed level, or None if the key is not live
    pub fn delete(&mut self, key: LevelKey) -> Option<Level> {
        if !self.nodes.contains(key) {
            return None;
        }
        let removed = self.remove_key(key);
        debug_assert_eq!(self.validate(), Ok(()));
        Some(removed)
    }

    /// Take volume out of a level in place
    ///
    /// # Returns
    ///
    /// The volume actually consumed, or None if the key is not live
    pub fn consume(&mut self, key: LevelKey, volume: f64) -> Option<f64> {
        self.nodes.get_mut(key).map(|node| node.consume(volume))
    }

    /// Drop every level
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    /// Check ordering, red-black, link and capacity invariants.
    ///
    /// Runs after every structural mutation in debug builds.
    pub fn validate(&self) -> Result<(), IndexViolation> {
        if self.len() > self.capacity {
            return Err(IndexViolation::OverCapacity {
                size: self.len(),
                capacity: self.capacity,
            });
        }

        let Some(root) = self.root else {
            return match self.len() {
                0 => Ok(()),
                stored => Err(IndexViolation::SizeMismatch {
                    reachable: 0,
                    stored,
                }),
            };
        };

        let root_node = self
            .nodes
            .get(root)
            .ok_or(IndexViolation::DanglingLink { key: root })?;
        if root_node.parent.is_some() {
            return Err(IndexViolation::ParentLink {
                price: root_node.price,
            });
        }
        if root_node.is_red() {
            return Err(IndexViolation::RedRoot);
        }

        let mut reachable = 0;
        let mut previous = None;
        self.check_subtree(root, &mut reachable, &mut previous)?;

        if reachable != self.len() {
            return Err(IndexViolation::SizeMismatch {
                reachable,
                stored: self.len(),
            });
        }
        Ok(())
    }

    /// In-order walk returning the black height of the subtree at `key`
    fn check_subtree(
        &self,
        key: LevelKey,
        reachable: &mut usize,
        previous: &mut Option<f64>,
    ) -> Result<usize, IndexViolation> {
        let node = self
            .nodes
            .get(key)
            .ok_or(IndexViolation::DanglingLink { key })?;

        *reachable += 1;
        if *reachable > self.len() {
            // A cycle; stop before recursing forever
            return Err(IndexViolation::SizeMismatch {
                reachable: *reachable,
                stored: self.len(),
            });
        }

        let mut heights = [1usize; 2];
        for (slot, dir) in [Dir::Left, Dir::Right].into_iter().enumerate() {
            if dir == Dir::Right {
                if let Some(prev) = *previous {
                    if node.price.total_cmp(&prev) != Ordering::Greater {
                        return Err(IndexViolation::OutOfOrder { price: node.price });
                    }
                }
                *previous = Some(node.price);
            }

            let Some(child) = node.child(dir) else {
                continue;
            };
            let child_node = self
                .nodes
                .get(child)
                .ok_or(IndexViolation::DanglingLink { key: child })?;
            if child_node.parent != Some(key) {
                return Err(IndexViolation::ParentLink {
                    price: child_node.price,
                });
            }
            if node.is_red() && child_node.is_red() {
                return Err(IndexViolation::RedRed { price: node.price });
            }
            heights[slot] = self.check_subtree(child, reachable, previous)?;
        }

        if heights[0] != heights[1] {
            return Err(IndexViolation::BlackHeight { price: node.price });
        }
        Ok(heights[0] + usize::from(!node.is_red()))
    }

    // ========================================================================
    // Tree Internals
    // ========================================================================

    /// Direction of the best end of the tree
    #[inline]
    fn best_dir(&self) -> Dir {
        match self.side {
            Side::Bid => Dir::Right,
            Side::Ask => Dir::Left,
        }
    }

    #[inline]
    fn is_red(&self, key: Option<LevelKey>) -> bool {
        key.is_some_and(|key| self.nodes[key].is_red())
    }

    /// Follow `dir` links from `key` to the end
    fn extreme(&self, mut key: LevelKey, dir: Dir) -> LevelKey {
        while let Some(next) = self.nodes[key].child(dir) {
            key = next;
        }
        key
    }

    /// Delete every level strictly better than `price`
    fn prune_better_than(&mut self, price: f64) -> usize {
        let mut pruned = 0;
        while let Some(best) = self.find_best() {
            if !self.side.is_better(self.nodes[best].price, price) {
                break;
            }
            self.remove_key(best);
            pruned += 1;
        }
        pruned
    }

    /// Put `new` where `old` hangs from its parent (or at the root)
    fn replace_in_parent(&mut self, old: LevelKey, new: Option<LevelKey>) {
        let parent = self.nodes[old].parent;
        if let Some(new) = new {
            self.nodes[new].parent = parent;
        }
        match parent {
            None => self.root = new,
            Some(p) => {
                let dir = if self.nodes[p].left == Some(old) {
                    Dir::Left
                } else {
                    Dir::Right
                };
                self.nodes[p].set_child(dir, new);
            }
        }
    }

    /// Rotate around `key` so that its child opposite `dir` rises.
    ///
    /// `Dir::Left` is a left rotation (right child rises).
    fn rotate(&mut self, key: LevelKey, dir: Dir) {
        let riser = self.nodes[key]
            .child(dir.opposite())
            .expect("rotation requires a child on the rising side");
        let inner = self.nodes[riser].child(dir);

        self.nodes[key].set_child(dir.opposite(), inner);
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(key);
        }

        self.replace_in_parent(key, Some(riser));
        self.nodes[riser].set_child(dir, Some(key));
        self.nodes[key].parent = Some(riser);
    }

    /// Restore red-black invariants after attaching red leaf `key`
    fn insert_fixup(&mut self, mut key: LevelKey) {
        while let Some(parent) = self.nodes[key].parent {
            if !self.nodes[parent].is_red() {
                break;
            }
            let grandparent = self.nodes[parent]
                .parent
                .expect("a red node is never the root");
            let dir = if self.nodes[grandparent].left == Some(parent) {
                Dir::Left
            } else {
                Dir::Right
            };
            let uncle = self.nodes[grandparent].child(dir.opposite());

            if let Some(uncle) = uncle.filter(|&u| self.nodes[u].is_red()) {
                // Recolor and continue from the grandparent
                self.nodes[parent].color = Color::Black;
                self.nodes[uncle].color = Color::Black;
                self.nodes[grandparent].color = Color::Red;
                key = grandparent;
                continue;
            }

            // Inner grandchild: rotate it to the outside first
            if self.nodes[parent].child(dir.opposite()) == Some(key) {
                key = parent;
                self.rotate(key, dir);
            }

            let parent = self.nodes[key].parent.expect("rotated node keeps a parent");
            let grandparent = self.nodes[parent]
                .parent
                .expect("rotated node keeps a grandparent");
            self.nodes[parent].color = Color::Black;
            self.nodes[grandparent].color = Color::Red;
            self.rotate(grandparent, dir.opposite());
        }

        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }
    }

    /// Unlink and free `key`, rebalancing when a black node left the tree
    fn remove_key(&mut self, key: LevelKey) -> Level {
        let (left, right, parent, color) = {
            let node = &self.nodes[key];
            (node.left, node.right, node.parent, node.color)
        };

        let mut removed_color = color;
        let (fixup, fixup_parent) = match (left, right) {
            (None, _) => {
                self.replace_in_parent(key, right);
                (right, parent)
            }
            (Some(_), None) => {
                self.replace_in_parent(key, left);
                (left, parent)
            }
            (Some(left), Some(right)) => {
                // Splice in the in-order successor; keys of other levels stay valid
                let successor = self.extreme(right, Dir::Left);
                removed_color = self.nodes[successor].color;
                let fixup = self.nodes[successor].right;

                let fixup_parent = if self.nodes[successor].parent == Some(key) {
                    Some(successor)
                } else {
                    let successor_parent = self.nodes[successor].parent;
                    self.replace_in_parent(successor, fixup);
                    self.nodes[successor].right = Some(right);
                    self.nodes[right].parent = Some(successor);
                    successor_parent
                };

                self.replace_in_parent(key, Some(successor));
                self.nodes[successor].left = Some(left);
                self.nodes[left].parent = Some(successor);
                self.nodes[successor].color = color;
                (fixup, fixup_parent)
            }
        };

        let removed = self.nodes.remove(key);
        if removed_color == Color::Black {
            self.delete_fixup(fixup, fixup_parent);
        }

        Level {
            price: removed.price,
            volume: removed.volume,
        }
    }

    /// Restore black height after removing a black node.
    ///
    /// `key` is the node that took the removed node's place (possibly
    /// empty), `parent` its parent.
    fn delete_fixup(&mut self, mut key: Option<LevelKey>, mut parent: Option<LevelKey>) {
        while key != self.root && !self.is_red(key) {
            let Some(p) = parent else {
                break;
            };
            let dir = if self.nodes[p].left == key {
                Dir::Left
            } else {
                Dir::Right
            };
            let mut sibling = self.nodes[p]
                .child(dir.opposite())
                .expect("a doubly-black node always has a sibling");

            // Red sibling: rotate so the sibling becomes black
            if self.nodes[sibling].is_red() {
                self.nodes[sibling].color = Color::Black;
                self.nodes[p].color = Color::Red;
                self.rotate(p, dir);
                sibling = self.nodes[p]
                    .child(dir.opposite())
                    .expect("rotation leaves a sibling");
            }

            let near = self.nodes[sibling].child(dir);
            let far = self.nodes[sibling].child(dir.opposite());

            if !self.is_red(near) && !self.is_red(far) {
                // Black sibling, black nephews: push the deficit upward
                self.nodes[sibling].color = Color::Red;
                key = Some(p);
                parent = self.nodes[p].parent;
                continue;
            }

            if !self.is_red(far) {
                // Near nephew red: turn it into the far case
                if let Some(near) = near {
                    self.nodes[near].color = Color::Black;
                }
                self.nodes[sibling].color = Color::Red;
                self.rotate(sibling, dir.opposite());
                sibling = self.nodes[p]
                    .child(dir.opposite())
                    .expect("rotation leaves a sibling");
            }

            // Far nephew red: rotate the parent and finish
            let parent_color = self.nodes[p].color;
            self.nodes[sibling].color = parent_color;
            self.nodes[p].color = Color::Black;
            if let Some(far) = self.nodes[sibling].child(dir.opposite()) {
                self.nodes[far].color = Color::Black;
            }
            self.rotate(p, dir);
            key = self.root;
            break;
        }

        if let Some(key) = key {
            self.nodes[key].color = Color::Black;
        }
    }
}

impl fmt::Display for PriceLevelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.side)?;
        for (i, level) in self.levels().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.5} x {}", level.price, level.volume)?;
        }
        write!(f, "]")
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
