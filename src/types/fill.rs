//! Fill notification emitted by the matching engine.
//!
//! A fill is produced for every resting level an order trades against.
//! It always executes at the level's price, never at the order's limit.

use crate::types::{OrderId, Side};

/// One execution of an order against a resting price level.
///
/// ## Example
///
/// ```
/// use tickbook::types::{Fill, Side};
///
/// let fill = Fill::new(3, Side::Bid, 101.25, 5.0);
/// assert_eq!(fill.notional(), 506.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    /// Order that traded
    pub order_id: OrderId,

    /// Direction of the order (not of the resting level)
    pub side: Side,

    /// Level price used for the execution
    pub price: f64,

    /// Volume traded
    pub volume: f64,
}

impl Fill {
    /// Create a new fill
    pub fn new(order_id: OrderId, side: Side, price: f64, volume: f64) -> Self {
        Self {
            order_id,
            side,
            price,
            volume,
        }
    }

    /// Quote-currency value of this fill (price * volume)
    #[inline]
    pub fn notional(&self) -> f64 {
        self.price * self.volume
    }
}
