//! Order types for the tickbook venue.
//!
//! ## Sides
//!
//! The venue trades one instrument quoted as base/quote (e.g. GBP/USD):
//! - `Bid` buys base currency, paying quote currency
//! - `Ask` sells base currency, receiving quote currency
//!
//! ## Fill Types
//!
//! - `Market` executes against any resting price
//! - `Limit` executes only at prices at least as favorable as its limit

use std::cmp::Ordering;
use std::fmt;

/// Order identifier, assigned by the venue in creation order.
pub type OrderId = u64;

// ============================================================================
// Side enum
// ============================================================================

/// Side of the book: Bid (buy) or Ask (sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    /// Buy side - best price is the highest
    #[default]
    Bid,
    /// Sell side - best price is the lowest
    Ask,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Returns true if price `a` is strictly more favorable than `b` on this side.
    ///
    /// ```
    /// use tickbook::types::Side;
    ///
    /// assert!(Side::Bid.is_better(1.35, 1.34));
    /// assert!(Side::Ask.is_better(1.34, 1.35));
    /// assert!(!Side::Ask.is_better(1.35, 1.35));
    /// ```
    #[inline]
    pub fn is_better(self, a: f64, b: f64) -> bool {
        match self {
            Side::Bid => a.total_cmp(&b) == Ordering::Greater,
            Side::Ask => a.total_cmp(&b) == Ordering::Less,
        }
    }

    /// Stable tag used when hashing book state
    #[inline]
    pub fn tag(self) -> u8 {
        match self {
            Side::Bid => 0,
            Side::Ask => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "Bid"),
            Side::Ask => write!(f, "Ask"),
        }
    }
}

// ============================================================================
// FillType enum
// ============================================================================

/// How an order treats the prices it meets in the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillType {
    /// Execute at any available price
    Market,
    /// Execute only at the limit price or better
    #[default]
    Limit,
}

impl fmt::Display for FillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillType::Market => write!(f, "Market"),
            FillType::Limit => write!(f, "Limit"),
        }
    }
}

// ============================================================================
// Order struct
// ============================================================================

/// A working order held by the order registry.
///
/// `volume` is the *remaining* volume: partial fills reduce it in place
/// until the order is fully filled and leaves the registry.
///
/// ## Example
///
/// ```
/// use tickbook::types::{FillType, Order, Side};
///
/// let order = Order::new(7, Side::Bid, 1.28000, 2.0, FillType::Limit);
/// assert!(order.accepts_price(1.27500));
/// assert!(!order.accepts_price(1.28500));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    /// Unique order identifier
    pub id: OrderId,

    /// Bid or Ask
    pub side: Side,

    /// Limit price (informational for Market orders)
    pub price: f64,

    /// Remaining volume in base-currency units
    pub volume: f64,

    /// Market or Limit
    pub fill_type: FillType,
}

impl Order {
    /// Create a new order
    ///
    /// # Arguments
    ///
    /// * `id` - Unique order identifier
    /// * `side` - Bid or Ask
    /// * `price` - Limit price
    /// * `volume` - Volume in base-currency units
    /// * `fill_type` - Market or Limit
    pub fn new(id: OrderId, side: Side, price: f64, volume: f64, fill_type: FillType) -> Self {
        Self {
            id,
            side,
            price,
            volume,
            fill_type,
        }
    }

    /// Check whether a resting level at `level_price` may trade with this order.
    ///
    /// Market orders accept any level. A Limit Bid accepts asks at or below
    /// its price; a Limit Ask accepts bids at or above its price.
    pub fn accepts_price(&self, level_price: f64) -> bool {
        match self.fill_type {
            FillType::Market => true,
            FillType::Limit => match self.side {
                Side::Bid => self.price >= level_price,
                Side::Ask => self.price <= level_price,
            },
        }
    }

    /// Fill a portion of this order
    ///
    /// # Returns
    ///
    /// The volume actually filled (capped at the remaining volume)
    pub fn fill(&mut self, volume: f64) -> f64 {
        let filled = volume.min(self.volume);
        self.volume -= filled;
        filled
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
    }

    #[test]
    fn test_side_is_better() {
        assert!(Side::Bid.is_better(101.0, 100.0));
        assert!(!Side::Bid.is_better(100.0, 101.0));
        assert!(Side::Ask.is_better(100.0, 101.0));
        assert!(!Side::Ask.is_better(101.0, 100.0));
        assert!(!Side::Bid.is_better(100.0, 100.0));
    }

    #[test]
    fn test_limit_acceptability() {
        let bid = Order::new(1, Side::Bid, 100.0, 1.0, FillType::Limit);
        assert!(bid.accepts_price(99.5));
        assert!(bid.accepts_price(100.0));
        assert!(!bid.accepts_price(100.5));

        let ask = Order::new(2, Side::Ask, 100.0, 1.0, FillType::Limit);
        assert!(ask.accepts_price(100.5));
        assert!(ask.accepts_price(100.0));
        assert!(!ask.accepts_price(99.5));
    }

    #[test]
    fn test_market_accepts_everything() {
        let bid = Order::new(1, Side::Bid, 0.0, 1.0, FillType::Market);
        assert!(bid.accepts_price(1_000_000.0));
        let ask = Order::new(2, Side::Ask, 0.0, 1.0, FillType::Market);
        assert!(ask.accepts_price(0.0001));
    }

    #[test]
    fn test_order_fill() {
        let mut order = Order::new(1, Side::Bid, 1.3, 5.0, FillType::Limit);

        assert_eq!(order.fill(2.0), 2.0);
        assert_eq!(order.volume, 3.0);

        // Overfill is capped
        assert_eq!(order.fill(10.0), 3.0);
        assert_eq!(order.volume, 0.0);
    }
}
