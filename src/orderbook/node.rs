//! Price-level node for slab-based tree storage.
//!
//! ## Design
//!
//! `LevelNode` is one price level of a [`PriceLevelIndex`](crate::orderbook::PriceLevelIndex):
//! an aggregated volume at a single price plus the red-black tree links.
//!
//! ## Slab Integration
//!
//! Per official slab docs (https://docs.rs/slab/0.4.11):
//! - Keys are `usize` values returned by `slab.insert()`
//! - Keys stay valid until `slab.remove()` and may be reused afterwards
//! - O(1) insert, remove, and lookup
//!
//! The `parent`, `left` and `right` links are slab keys, not references,
//! so the tree has no ownership cycles and a rotation only rewrites keys.

/// Slab key of a level inside its index
pub type LevelKey = usize;

/// Red-black node color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Child direction within the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Left,
    Right,
}

impl Dir {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Price level stored in the slab.
///
/// ## Memory Layout
///
/// ```text
/// LevelNode {
///     price: f64
///     volume: f64
///     color: Color
///     parent / left / right: Option<usize>
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LevelNode {
    /// Price of this level
    pub price: f64,

    /// Aggregated resting volume at this price
    pub volume: f64,

    /// Red-black color
    pub color: Color,

    /// Parent node (slab key), None for the root
    pub parent: Option<LevelKey>,

    /// Lower-priced subtree (slab key)
    pub left: Option<LevelKey>,

    /// Higher-priced subtree (slab key)
    pub right: Option<LevelKey>,
}

impl LevelNode {
    /// Create a new unlinked red node
    ///
    /// # Example
    ///
    /// ```
    /// use tickbook::orderbook::{Color, LevelNode};
    ///
    /// let node = LevelNode::new(1.35, 2.0);
    /// assert_eq!(node.color, Color::Red);
    /// assert!(node.parent.is_none());
    /// ```
    #[inline]
    pub fn new(price: f64, volume: f64) -> Self {
        Self {
            price,
            volume,
            color: Color::Red,
            parent: None,
            left: None,
            right: None,
        }
    }

    /// Child in the given direction
    #[inline]
    pub fn child(&self, dir: Dir) -> Option<LevelKey> {
        match dir {
            Dir::Left => self.left,
            Dir::Right => self.right,
        }
    }

    /// Replace the child in the given direction
    #[inline]
    pub fn set_child(&mut self, dir: Dir, child: Option<LevelKey>) {
        match dir {
            Dir::Left => self.left = child,
            Dir::Right => self.right = child,
        }
    }

    #[inline]
    pub fn is_red(&self) -> bool {
        self.color == Color::Red
    }

    /// Consume volume from this level
    ///
    /// # Returns
    ///
    /// The volume actually consumed (capped at the resting volume)
    #[inline]
    pub fn consume(&mut self, volume: f64) -> f64 {
        let consumed = volume.min(self.volume);
        self.volume -= consumed;
        consumed
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_node_new() {
        let node = LevelNode::new(101.25, 5.0);

        assert_eq!(node.price, 101.25);
        assert_eq!(node.volume, 5.0);
        assert!(node.is_red());
        assert_eq!((node.parent, node.left, node.right), (None, None, None));
    }

    #[test]
    fn test_level_node_children() {
        let mut node = LevelNode::new(1.0, 1.0);

        node.set_child(Dir::Left, Some(3));
        assert_eq!(node.left, Some(3));
        assert_eq!(node.child(Dir::Left), Some(3));
        assert_eq!(node.child(Dir::Right), None);

        node.set_child(Dir::Right, Some(4));
        node.set_child(Dir::Left, None);
        assert_eq!(node.child(Dir::Right), Some(4));
        assert_eq!(node.left, None);
    }

    #[test]
    fn test_level_node_consume() {
        let mut node = LevelNode::new(102.0, 8.0);

        assert_eq!(node.consume(5.0), 5.0);
        assert_eq!(node.volume, 3.0);

        assert_eq!(node.consume(10.0), 3.0);
        assert_eq!(node.volume, 0.0);
    }

    #[test]
    fn test_dir_opposite() {
        assert_eq!(Dir::Left.opposite(), Dir::Right);
        assert_eq!(Dir::Right.opposite(), Dir::Left);
    }
}
