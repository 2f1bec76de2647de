//! Order-generating strategies.
//!
//! A strategy looks at the book once per tick, after the tick's quotes are
//! inserted, and asks the venue for new orders. The venue owns validation:
//! a request the account cannot cover, or that finds the registry full, is
//! rejected there and never reaches the book.

use tracing::trace;

use crate::orderbook::Book;
use crate::types::{FillType, Side};

/// An order the strategy wants the venue to create
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderRequest {
    pub side: Side,
    pub price: f64,
    pub volume: f64,
    pub fill_type: FillType,
}

impl OrderRequest {
    pub fn new(side: Side, price: f64, volume: f64, fill_type: FillType) -> Self {
        Self {
            side,
            price,
            volume,
            fill_type,
        }
    }

    /// Limit order at `price`
    pub fn limit(side: Side, price: f64, volume: f64) -> Self {
        Self::new(side, price, volume, FillType::Limit)
    }

    /// Market order; the price is informational only
    pub fn market(side: Side, price: f64, volume: f64) -> Self {
        Self::new(side, price, volume, FillType::Market)
    }
}

/// Reacts to book updates with order requests
pub trait Strategy {
    /// Requests for this tick, in submission order
    fn on_tick(&mut self, book: &Book) -> Vec<OrderRequest>;

    fn name(&self) -> &str {
        "strategy"
    }
}

/// Any `FnMut(&Book) -> Vec<OrderRequest>` is a strategy
impl<F> Strategy for F
where
    F: FnMut(&Book) -> Vec<OrderRequest>,
{
    fn on_tick(&mut self, book: &Book) -> Vec<OrderRequest> {
        self(book)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

/// Buy at support, sell at resistance.
///
/// - best ask at or below `support`: Limit Bid for the whole best-ask level
/// - best bid at or above `resistance`: Limit Ask for the whole best-bid level
///
/// ## Example
///
/// ```
/// use tickbook::orderbook::Book;
/// use tickbook::strategy::{Strategy, SupportResistance};
/// use tickbook::types::Side;
///
/// let mut book = Book::new();
/// book.apply_quotes(1.2790, 3.0, 1.2795, 2.0);
///
/// let mut strategy = SupportResistance::new(1.28, 1.35);
/// let requests = strategy.on_tick(&book);
///
/// assert_eq!(requests.len(), 1);
/// assert_eq!(requests[0].side, Side::Bid);
/// assert_eq!(requests[0].volume, 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
}

impl SupportResistance {
    pub fn new(support: f64, resistance: f64) -> Self {
        Self {
            support,
            resistance,
        }
    }
}

impl Strategy for SupportResistance {
    fn on_tick(&mut self, book: &Book) -> Vec<OrderRequest> {
        let mut requests = Vec::new();

        if let Some(ask) = book.best_ask_level() {
            if ask.price <= self.support {
                trace!(price = ask.price, support = self.support, "ask at support");
                requests.push(OrderRequest::limit(Side::Bid, ask.price, ask.volume));
            }
        }

        if let Some(bid) = book.best_bid_level() {
            if bid.price >= self.resistance {
                trace!(price = bid.price, resistance = self.resistance, "bid at resistance");
                requests.push(OrderRequest::limit(Side::Ask, bid.price, bid.volume));
            }
        }

        requests
    }

    fn name(&self) -> &str {
        "support-resistance"
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
