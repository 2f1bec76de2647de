//! Matching engine: resolves working orders against the book.
//!
//! ## Level Walk
//!
//! An order starts at the best level of the opposite side and walks toward
//! worse prices:
//!
//! 1. The level covers the remaining volume and is acceptable: trade the
//!    remainder at the level's price, consume or delete the level, remove
//!    the order. **FullyFilled**.
//! 2. The level is acceptable but too small: trade the whole level, delete
//!    it, advance to the next best level.
//! 3. The level is unacceptable: stop. **NoMatch** if nothing traded yet,
//!    otherwise **PartiallyFilled** with the reduced order left resting.
//! 4. No level remains: a Limit order is **PartiallyFilled** once it has
//!    traded. A Market order is **NoMatch**; its swept volume is still
//!    recorded and the reduced order keeps working.
//!
//! Acceptability is re-checked at every level; a Limit order never skips
//! an unacceptable level to reach a later one.
//!
//! ## Ledger Ordering
//!
//! Each fill is reported to the [`Ledger`] before the level or order
//! mutation that produced it is applied.

use tracing::debug;

use crate::orderbook::{Book, PriceLevelIndex};
use crate::registry::OrderRegistry;
use crate::types::{Fill, FillType, Ledger, OrderId};

/// Final state of one match attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// No terminal fill: nothing traded, or a Market order swept the
    /// whole side and rests with its remaining volume
    NoMatch,
    /// Some volume traded; the order rests with its remaining volume
    PartiallyFilled,
    /// The whole order traded and left the registry
    FullyFilled,
}

/// Result of matching a single order
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Order that was matched
    pub order_id: OrderId,

    /// Final state
    pub outcome: MatchOutcome,

    /// Fills in execution order, one per level touched
    pub fills: Vec<Fill>,
}

impl MatchResult {
    fn new(order_id: OrderId, outcome: MatchOutcome, fills: Vec<Fill>) -> Self {
        Self {
            order_id,
            outcome,
            fills,
        }
    }

    /// Total volume traded
    pub fn traded_volume(&self) -> f64 {
        self.fills.iter().map(|fill| fill.volume).sum()
    }

    #[inline]
    pub fn fully_filled(&self) -> bool {
        self.outcome == MatchOutcome::FullyFilled
    }
}

/// Tally of one [`MatchingEngine::match_all`] pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassSummary {
    /// Orders that were still live when their turn came
    pub examined: usize,
    pub fully_filled: usize,
    pub partially_filled: usize,
    pub no_match: usize,

    /// Every fill of the pass, in execution order
    pub fills: Vec<Fill>,
}

impl PassSummary {
    fn record(&mut self, result: MatchResult) {
        self.examined += 1;
        match result.outcome {
            MatchOutcome::NoMatch => self.no_match += 1,
            MatchOutcome::PartiallyFilled => self.partially_filled += 1,
            MatchOutcome::FullyFilled => self.fully_filled += 1,
        }
        self.fills.extend(result.fills);
    }
}

/// Stateless matching rules plus lifetime counters.
///
/// ## Example
///
/// ```
/// use tickbook::engine::{MatchOutcome, MatchingEngine};
/// use tickbook::orderbook::PriceLevelIndex;
/// use tickbook::registry::OrderRegistry;
/// use tickbook::types::{Fill, FillType, Order, Side};
///
/// let mut asks = PriceLevelIndex::new(Side::Ask);
/// asks.insert(101.25, 5.0);
///
/// let mut registry = OrderRegistry::new();
/// registry.insert(Order::new(1, Side::Bid, 101.25, 2.0, FillType::Limit)).unwrap();
///
/// let mut fills: Vec<Fill> = Vec::new();
/// let mut engine = MatchingEngine::new();
/// let result = engine.attempt_match(1, &mut registry, &mut asks, &mut fills);
///
/// assert_eq!(result.outcome, MatchOutcome::FullyFilled);
/// assert_eq!(asks.best_level().unwrap().volume, 3.0);
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MatchingEngine {
    /// Completed `match_all` passes
    passes: u64,

    /// Fills emitted over the engine's lifetime
    fills_executed: u64,

    /// Orders that reached FullyFilled
    orders_filled: u64,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    #[inline]
    pub fn fills_executed(&self) -> u64 {
        self.fills_executed
    }

    #[inline]
    pub fn orders_filled(&self) -> u64 {
        self.orders_filled
    }

    /// Match one registered order against the opposite side's index.
    ///
    /// # Arguments
    ///
    /// * `order_id` - Order to resolve; must be live in `registry`
    /// * `registry` - Working orders
    /// * `opposite` - Index of the side the order trades against
    /// * `ledger` - Receives each fill before the book is mutated
    pub fn attempt_match<L: Ledger + ?Sized>(
        &mut self,
        order_id: OrderId,
        registry: &mut OrderRegistry,
        opposite: &mut PriceLevelIndex,
        ledger: &mut L,
    ) -> MatchResult {
        let Some(mut order) = registry.search(order_id).copied() else {
            return MatchResult::new(order_id, MatchOutcome::NoMatch, Vec::new());
        };
        debug_assert_eq!(opposite.side(), order.side.opposite());

        let mut fills = Vec::new();
        let mut cursor = opposite.find_best();
        let mut exhausted = true;

        while let Some(key) = cursor {
            let Some(level) = opposite.level(key) else {
                break;
            };

            if !order.accepts_price(level.price) {
                exhausted = false;
                break;
            }

            if level.volume >= order.volume {
                // Terminal fill: the level covers the remainder
                let fill = Fill::new(order.id, order.side, level.price, order.volume);
                ledger.apply_fill(&fill);
                self.fills_executed += 1;
                fills.push(fill);

                if level.volume == order.volume {
                    opposite.delete(key);
                } else {
                    opposite.consume(key, order.volume);
                }
                registry.delete(order.id);
                self.orders_filled += 1;

                debug!(order_id, levels = fills.len(), "order fully filled");
                return MatchResult::new(order_id, MatchOutcome::FullyFilled, fills);
            }

            // Sweep the whole level and move on
            let fill = Fill::new(order.id, order.side, level.price, level.volume);
            ledger.apply_fill(&fill);
            self.fills_executed += 1;
            fills.push(fill);

            order.fill(level.volume);
            cursor = opposite.find_next_best(key);
            opposite.delete(key);
        }

        if fills.is_empty() {
            return MatchResult::new(order_id, MatchOutcome::NoMatch, fills);
        }

        if let Some(resting) = registry.get_mut(order_id) {
            resting.volume = order.volume;
        }

        // A Market order only completes through a terminal fill
        let outcome = if exhausted && order.fill_type == FillType::Market {
            MatchOutcome::NoMatch
        } else {
            MatchOutcome::PartiallyFilled
        };
        debug!(
            order_id,
            remaining = order.volume,
            levels = fills.len(),
            ?outcome,
            "order swept without completing"
        );
        MatchResult::new(order_id, outcome, fills)
    }

    /// Run one matching pass over every working order.
    ///
    /// Works from a registry snapshot; an order removed earlier in the same
    /// pass is skipped.
    pub fn match_all<L: Ledger + ?Sized>(
        &mut self,
        registry: &mut OrderRegistry,
        book: &mut Book,
        ledger: &mut L,
    ) -> PassSummary {
        let mut summary = PassSummary::default();

        for order in registry.snapshot() {
            if !registry.contains(order.id) {
                continue;
            }
            let opposite = book.side_mut(order.side.opposite());
            let result = self.attempt_match(order.id, registry, opposite, ledger);
            summary.record(result);
        }

        self.passes += 1;
        summary
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Account, FillType, Order, Side};

    fn setup_asks(levels: &[(f64, f64)]) -> PriceLevelIndex {
        let mut asks = PriceLevelIndex::new(Side::Ask);
        // Insert worst first so no level prunes another
        for &(price, volume) in levels.iter().rev() {
            asks.insert(price, volume);
        }
        asks
    }

    fn setup_bids(levels: &[(f64, f64)]) -> PriceLevelIndex {
        let mut bids = PriceLevelIndex::new(Side::Bid);
        for &(price, volume) in levels.iter().rev() {
            bids.insert(price, volume);
        }
        bids
    }

    fn register(registry: &mut OrderRegistry, order: Order) -> OrderId {
        registry.insert(order).unwrap();
        order.id
    }

    #[test]
    fn test_empty_book_no_match() {
        let mut asks = PriceLevelIndex::new(Side::Ask);
        let mut registry = OrderRegistry::new();
        let id = register(&mut registry, Order::new(1, Side::Bid, 1.0, 1.0, FillType::Market));
        let mut fills: Vec<Fill> = Vec::new();

        let result = MatchingEngine::new().attempt_match(id, &mut registry, &mut asks, &mut fills);

        assert_eq!(result.outcome, MatchOutcome::NoMatch);
        assert!(fills.is_empty());
        assert_eq!(registry.search(id).unwrap().volume, 1.0);
    }

    #[test]
    fn test_unknown_order_no_match() {
        let mut asks = setup_asks(&[(1.0, 1.0)]);
        let mut registry = OrderRegistry::new();
        let mut fills: Vec<Fill> = Vec::new();

        let result = MatchingEngine::new().attempt_match(9, &mut registry, &mut asks, &mut fills);

        assert_eq!(result.outcome, MatchOutcome::NoMatch);
        assert_eq!(asks.len(), 1);
    }

    #[test]
    fn test_market_fill_conservation() {
        let mut asks = setup_asks(&[(101.25, 10.0)]);
        let mut registry = OrderRegistry::new();
        let id = register(&mut registry, Order::new(1, Side::Bid, 0.0, 4.0, FillType::Market));
        let mut fills: Vec<Fill> = Vec::new();

        let result = MatchingEngine::new().attempt_match(id, &mut registry, &mut asks, &mut fills);

        assert!(result.fully_filled());
        assert_eq!(fills, vec![Fill::new(1, Side::Bid, 101.25, 4.0)]);
        assert_eq!(asks.best_level().unwrap().volume, 6.0);
        assert!(registry.search(id).is_none());
    }

    #[test]
    fn test_exact_volume_deletes_level() {
        let mut asks = setup_asks(&[(101.25, 5.0), (102.0, 8.0)]);
        let mut registry = OrderRegistry::new();
        let id = register(&mut registry, Order::new(1, Side::Bid, 101.25, 5.0, FillType::Limit));
        let mut fills: Vec<Fill> = Vec::new();

        let result = MatchingEngine::new().attempt_match(id, &mut registry, &mut asks, &mut fills);

        assert!(result.fully_filled());
        assert!(asks.search(101.25).is_none());
        assert_eq!(asks.best_price(), Some(102.0));
    }

    #[test]
    fn test_market_sweeps_two_levels() {
        let mut asks = setup_asks(&[(101.25, 5.0), (102.0, 8.0)]);
        let mut registry = OrderRegistry::new();
        let id = register(&mut registry, Order::new(1, Side::Bid, 0.0, 10.0, FillType::Market));
        let mut account = Account::new(0.0, 10_000.0);

        let result = MatchingEngine::new().attempt_match(id, &mut registry, &mut asks, &mut account);

        assert_eq!(result.outcome, MatchOutcome::FullyFilled);
        assert_eq!(
            result.fills,
            vec![
                Fill::new(1, Side::Bid, 101.25, 5.0),
                Fill::new(1, Side::Bid, 102.0, 5.0),
            ]
        );
        assert_eq!(result.traded_volume(), 10.0);
        assert_eq!(asks.len(), 1);
        assert_eq!(asks.best_level().unwrap().volume, 3.0);
        assert_eq!(account.base_balance, 10.0);
        assert_eq!(account.quote_balance, 10_000.0 - 506.25 - 510.0);
    }

    #[test]
    fn test_limit_stops_at_unacceptable_level() {
        let mut asks = setup_asks(&[(100.0, 2.0), (101.0, 2.0), (102.0, 2.0)]);
        let mut registry = OrderRegistry::new();
        let id = register(&mut registry, Order::new(1, Side::Bid, 101.0, 10.0, FillType::Limit));
        let mut fills: Vec<Fill> = Vec::new();

        let result = MatchingEngine::new().attempt_match(id, &mut registry, &mut asks, &mut fills);

        assert_eq!(result.outcome, MatchOutcome::PartiallyFilled);
        assert_eq!(fills.len(), 2);
        assert_eq!(registry.search(id).unwrap().volume, 6.0);
        assert_eq!(asks.best_price(), Some(102.0));
        assert_eq!(asks.len(), 1);
    }

    #[test]
    fn test_limit_unacceptable_best_is_no_match() {
        let mut asks = setup_asks(&[(105.0, 2.0)]);
        let mut registry = OrderRegistry::new();
        let id = register(&mut registry, Order::new(1, Side::Bid, 100.0, 1.0, FillType::Limit));
        let mut fills: Vec<Fill> = Vec::new();

        let result = MatchingEngine::new().attempt_match(id, &mut registry, &mut asks, &mut fills);

        assert_eq!(result.outcome, MatchOutcome::NoMatch);
        assert!(fills.is_empty());
        assert_eq!(asks.best_level().unwrap().volume, 2.0);
        assert_eq!(registry.search(id).unwrap().volume, 1.0);
    }

    #[test]
    fn test_market_exhausts_book_is_no_match() {
        let mut bids = setup_bids(&[(99.0, 1.0), (98.0, 1.0)]);
        let mut registry = OrderRegistry::new();
        let id = register(&mut registry, Order::new(1, Side::Ask, 0.0, 5.0, FillType::Market));
        let mut account = Account::new(5.0, 0.0);

        let result = MatchingEngine::new().attempt_match(id, &mut registry, &mut bids, &mut account);

        assert_eq!(result.outcome, MatchOutcome::NoMatch);
        assert_eq!(result.fills.len(), 2);
        assert_eq!(result.fills[0].price, 99.0);
        assert_eq!(result.fills[1].price, 98.0);
        assert!(bids.is_empty());

        // Swept volume still settles and the remainder keeps working
        assert_eq!(registry.search(id).unwrap().volume, 3.0);
        assert_eq!(account.base_balance, 3.0);
        assert_eq!(account.quote_balance, 197.0);
    }

    #[test]
    fn test_limit_exhausts_book_is_partial() {
        let mut bids = setup_bids(&[(99.0, 1.0), (98.0, 1.0)]);
        let mut registry = OrderRegistry::new();
        let id = register(&mut registry, Order::new(1, Side::Ask, 97.0, 5.0, FillType::Limit));
        let mut fills: Vec<Fill> = Vec::new();

        let result = MatchingEngine::new().attempt_match(id, &mut registry, &mut bids, &mut fills);

        assert_eq!(result.outcome, MatchOutcome::PartiallyFilled);
        assert_eq!(fills.len(), 2);
        assert!(bids.is_empty());
        assert_eq!(registry.search(id).unwrap().volume, 3.0);
    }

    #[test]
    fn test_limit_ask_against_bids() {
        let mut bids = setup_bids(&[(1.30, 1.0), (1.29, 4.0)]);
        let mut registry = OrderRegistry::new();
        let id = register(&mut registry, Order::new(7, Side::Ask, 1.29, 3.0, FillType::Limit));
        let mut account = Account::new(3.0, 0.0);

        let result = MatchingEngine::new().attempt_match(id, &mut registry, &mut bids, &mut account);

        assert!(result.fully_filled());
        assert_eq!(bids.best_level().unwrap().price, 1.29);
        assert_eq!(bids.best_level().unwrap().volume, 2.0);
        assert_eq!(account.base_balance, 0.0);
    }

    #[test]
    fn test_match_all_uses_opposite_sides() {
        let mut book = Book::new();
        book.apply_quotes(1.30, 2.0, 1.31, 2.0);

        let mut registry = OrderRegistry::new();
        register(&mut registry, Order::new(1, Side::Bid, 1.31, 1.0, FillType::Limit));
        register(&mut registry, Order::new(2, Side::Ask, 1.30, 1.0, FillType::Limit));
        register(&mut registry, Order::new(3, Side::Bid, 1.20, 1.0, FillType::Limit));

        let mut fills: Vec<Fill> = Vec::new();
        let mut engine = MatchingEngine::new();
        let summary = engine.match_all(&mut registry, &mut book, &mut fills);

        assert_eq!(summary.examined, 3);
        assert_eq!(summary.fully_filled, 2);
        assert_eq!(summary.no_match, 1);
        assert_eq!(summary.fills.len(), 2);
        assert_eq!(book.best_ask_level().unwrap().volume, 1.0);
        assert_eq!(book.best_bid_level().unwrap().volume, 1.0);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(3));
        assert_eq!(engine.passes(), 1);
        assert_eq!(engine.orders_filled(), 2);
        assert_eq!(engine.fills_executed(), 2);
    }

    #[test]
    fn test_match_all_competing_orders_share_liquidity() {
        let mut book = Book::new();
        book.apply_quotes(1.0, 1.0, 2.0, 3.0);

        let mut registry = OrderRegistry::new();
        register(&mut registry, Order::new(1, Side::Bid, 2.0, 2.0, FillType::Limit));
        register(&mut registry, Order::new(2, Side::Bid, 2.0, 2.0, FillType::Limit));

        let mut fills: Vec<Fill> = Vec::new();
        let summary = MatchingEngine::new().match_all(&mut registry, &mut book, &mut fills);

        assert_eq!(summary.fully_filled, 1);
        assert_eq!(summary.partially_filled, 1);
        assert!(book.asks().is_empty());
        assert_eq!(registry.search(2).unwrap().volume, 1.0);
    }
}
