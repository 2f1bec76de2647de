//! Two-sided book: one bounded price-level index per side.
//!
//! ## Price Ordering
//!
//! - **Bids**: best bid = highest price
//! - **Asks**: best ask = lowest price
//!
//! ## Example
//!
//! ```
//! use tickbook::orderbook::Book;
//!
//! let mut book = Book::new();
//! book.apply_quotes(1.27450, 1.5, 1.27460, 2.0);
//!
//! assert_eq!(book.best_bid(), Some(1.27450));
//! assert_eq!(book.best_ask(), Some(1.27460));
//! assert!(book.spread().unwrap() > 0.0);
//! ```

use sha2::{Digest, Sha256};

use crate::orderbook::index::{Level, PriceLevelIndex, DEFAULT_CAPACITY};
use crate::types::Side;

/// Bid and ask price-level indices for a single instrument
#[derive(Debug, Clone)]
pub struct Book {
    /// Bid levels (best = highest)
    bids: PriceLevelIndex,

    /// Ask levels (best = lowest)
    asks: PriceLevelIndex,
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}

impl Book {
    /// Create an empty book with the default per-side capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty book keeping at most `levels_per_side` levels per side
    pub fn with_capacity(levels_per_side: usize) -> Self {
        Self {
            bids: PriceLevelIndex::with_capacity(Side::Bid, levels_per_side),
            asks: PriceLevelIndex::with_capacity(Side::Ask, levels_per_side),
        }
    }

    // ========================================================================
    // Side Access
    // ========================================================================

    #[inline]
    pub fn bids(&self) -> &PriceLevelIndex {
        &self.bids
    }

    #[inline]
    pub fn asks(&self) -> &PriceLevelIndex {
        &self.asks
    }

    /// Index for one side
    #[inline]
    pub fn side(&self, side: Side) -> &PriceLevelIndex {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Mutable index for one side
    #[inline]
    pub fn side_mut(&mut self, side: Side) -> &mut PriceLevelIndex {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Insert one tick's top-of-book quotes, bid side first
    pub fn apply_quotes(&mut self, bid_price: f64, bid_volume: f64, ask_price: f64, ask_volume: f64) {
        self.bids.insert(bid_price, bid_volume);
        self.asks.insert(ask_price, ask_volume);
    }

    // ========================================================================
    // Best Bid/Ask
    // ========================================================================

    /// Best bid price, None if no bids rest
    #[inline]
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.best_price()
    }

    /// Best ask price, None if no asks rest
    #[inline]
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.best_price()
    }

    pub fn best_bid_level(&self) -> Option<Level> {
        self.bids.best_level()
    }

    pub fn best_ask_level(&self) -> Option<Level> {
        self.asks.best_level()
    }

    /// Get the spread (best_ask - best_bid)
    ///
    /// # Returns
    ///
    /// The spread, or None if either side is empty
    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    // ========================================================================
    // State Digest
    // ========================================================================

    /// SHA-256 over both sides' levels, best to worst.
    ///
    /// Identical tick streams produce identical digests.
    pub fn state_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for index in [&self.bids, &self.asks] {
            hasher.update([index.side().tag()]);
            hasher.update((index.len() as u64).to_le_bytes());
            for level in index.levels() {
                hasher.update(level.price.to_bits().to_le_bytes());
                hasher.update(level.volume.to_bits().to_le_bytes());
            }
        }
        let result = hasher.finalize();

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result);
        digest
    }

    /// The state digest as a hex string
    pub fn state_digest_hex(&self) -> String {
        hex::encode(self.state_digest())
    }

    /// Drop all levels on both sides
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_new() {
        let book = Book::new();

        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
        assert!(book.spread().is_none());
        assert_eq!(book.bids().capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_apply_quotes() {
        let mut book = Book::new();
        book.apply_quotes(100.0, 1.0, 101.0, 2.0);

        assert_eq!(book.best_bid(), Some(100.0));
        assert_eq!(book.best_ask(), Some(101.0));
        assert_eq!(book.spread(), Some(1.0));
        assert_eq!(book.best_ask_level().unwrap().volume, 2.0);
    }

    #[test]
    fn test_side_selection() {
        let mut book = Book::with_capacity(4);
        book.side_mut(Side::Ask).insert(5.0, 1.0);

        assert_eq!(book.side(Side::Ask).len(), 1);
        assert!(book.side(Side::Bid).is_empty());
        assert_eq!(book.side(Side::Ask).capacity(), 4);
    }

    #[test]
    fn test_digest_is_deterministic() {
        let mut a = Book::new();
        let mut b = Book::new();
        for book in [&mut a, &mut b] {
            book.apply_quotes(1.2745, 1.0, 1.2746, 1.0);
            book.apply_quotes(1.2747, 2.0, 1.2744, 0.5);
        }
        assert_eq!(a.state_digest(), b.state_digest());
        assert_eq!(a.state_digest_hex().len(), 64);

        b.apply_quotes(1.2748, 1.0, 1.2743, 1.0);
        assert_ne!(a.state_digest(), b.state_digest());
    }

    #[test]
    fn test_digest_distinguishes_sides() {
        let mut a = Book::new();
        a.side_mut(Side::Bid).insert(1.0, 1.0);
        let mut b = Book::new();
        b.side_mut(Side::Ask).insert(1.0, 1.0);

        assert_ne!(a.state_digest(), b.state_digest());
    }

    #[test]
    fn test_clear() {
        let mut book = Book::new();
        book.apply_quotes(1.0, 1.0, 2.0, 1.0);
        book.clear();

        assert!(book.bids().is_empty());
        assert!(book.asks().is_empty());
    }
}
