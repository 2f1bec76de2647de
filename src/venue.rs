//! The venue: all per-run state behind one object.
//!
//! ## Lifecycle
//!
//! ```text
//! Venue::new(&config)?           init: empty book, empty registry, opening balances
//!   process_tick(tick, strategy) repeated, one tick to completion at a time
//!   teardown()                   release live orders, report the run
//! ```
//!
//! ## Tick Processing
//!
//! 1. Insert the tick's bid and ask levels
//! 2. Submit the strategy's order requests through [`Venue::create_order`]
//! 3. Run one matching pass over every working order
//! 4. Take a [`Snapshot`] for reporting

use std::fmt;

use tracing::{debug, info};

use crate::config::VenueConfig;
use crate::engine::{MatchingEngine, PassSummary};
use crate::feed::Tick;
use crate::orderbook::Book;
use crate::registry::OrderRegistry;
use crate::strategy::Strategy;
use crate::types::{Account, ConfigError, FillType, Order, OrderId, Side, VenueError};

/// Point-in-time view for telemetry
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// 1-based tick number
    pub tick: u64,
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,

    /// Balances marked at the best bid (0 when no bid rests)
    pub portfolio_value: f64,
    pub base_balance: f64,
    pub quote_balance: f64,
}

/// What one tick did
#[derive(Debug, Clone)]
pub struct TickReport {
    /// Orders created from strategy requests
    pub created: Vec<OrderId>,

    /// Strategy requests the venue refused
    pub rejected: Vec<VenueError>,

    /// Matching pass results, fills included
    pub pass: PassSummary,

    pub snapshot: Snapshot,
}

/// End-of-run report
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks_processed: u64,

    /// Portfolio value when the first tick arrived, in quote units
    pub start_value: f64,

    /// Portfolio value at teardown, in quote units
    pub end_value: f64,

    pub standard_lot: u64,

    /// Orders still resting at teardown
    pub released_orders: usize,

    pub fills_executed: u64,

    /// Hex SHA-256 of the final book
    pub book_digest: String,
}

impl RunSummary {
    /// Profit or loss in quote units
    pub fn profit_loss(&self) -> f64 {
        self.end_value - self.start_value
    }

    /// Scale a quote amount to standard-lot units
    pub fn in_lots(&self, value: f64) -> f64 {
        value * self.standard_lot as f64
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ticks processed: {}", self.ticks_processed)?;
        writeln!(f, "Start balance:   {:.6}", self.in_lots(self.start_value))?;
        writeln!(f, "End balance:     {:.6}", self.in_lots(self.end_value))?;
        writeln!(f, "P/L:             {:.6}", self.in_lots(self.profit_loss()))?;
        writeln!(f, "Fills executed:  {}", self.fills_executed)?;
        writeln!(f, "Orders released: {}", self.released_orders)?;
        write!(f, "Book digest:     {}", self.book_digest)
    }
}

/// Book, registry, account and matching engine for one simulated run.
///
/// ## Example
///
/// ```
/// use tickbook::config::VenueConfig;
/// use tickbook::feed::Tick;
/// use tickbook::strategy::SupportResistance;
/// use tickbook::venue::Venue;
///
/// let config = VenueConfig::default();
/// let mut venue = Venue::new(&config).unwrap();
/// let mut strategy = SupportResistance::new(config.support, config.resistance);
///
/// // Ask at 1.2790 is under support: buy it
/// let report = venue.process_tick(&Tick::new(1.2785, 2.0, 1.2790, 3.0), &mut strategy);
/// assert_eq!(report.created.len(), 1);
/// assert_eq!(report.pass.fully_filled, 1);
///
/// let summary = venue.teardown();
/// assert_eq!(summary.ticks_processed, 1);
/// ```
#[derive(Debug)]
pub struct Venue {
    book: Book,
    registry: OrderRegistry,
    account: Account,
    engine: MatchingEngine,

    /// Id for the next created order
    next_order_id: OrderId,

    ticks_processed: u64,

    /// Portfolio value at the first tick
    start_value: Option<f64>,

    standard_lot: u64,
}

impl Venue {
    /// Initialize run state from a configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] when `config` fails [`VenueConfig::validate`],
    /// for example a zero book capacity or registry size
    pub fn new(config: &VenueConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            book_capacity = config.book_capacity,
            registry_size = config.registry_size,
            base = config.starting_base_balance,
            quote = config.starting_quote_balance,
            "venue initialized"
        );

        Ok(Self {
            book: Book::with_capacity(config.book_capacity),
            registry: OrderRegistry::with_size(config.registry_size),
            account: Account::new(config.starting_base_balance, config.starting_quote_balance),
            engine: MatchingEngine::new(),
            next_order_id: 0,
            ticks_processed: 0,
            start_value: None,
            standard_lot: config.standard_lot,
        })
    }

    // ========================================================================
    // State Access
    // ========================================================================

    #[inline]
    pub fn book(&self) -> &Book {
        &self.book
    }

    #[inline]
    pub fn registry(&self) -> &OrderRegistry {
        &self.registry
    }

    #[inline]
    pub fn account(&self) -> &Account {
        &self.account
    }

    #[inline]
    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    #[inline]
    pub fn ticks_processed(&self) -> u64 {
        self.ticks_processed
    }

    /// Balances marked at the current best bid
    pub fn portfolio_value(&self) -> f64 {
        self.account
            .portfolio_value(self.book.best_bid().unwrap_or(0.0))
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// Create a working order.
    ///
    /// Checked in order: tradable price and volume, a free registry slot,
    /// then the account balance for the order's currency side. A rejected
    /// order changes nothing and consumes no id.
    ///
    /// # Returns
    ///
    /// The new order's id
    pub fn create_order(
        &mut self,
        side: Side,
        price: f64,
        volume: f64,
        fill_type: FillType,
    ) -> Result<OrderId, VenueError> {
        if !price.is_finite() || price < 0.0 {
            return Err(VenueError::InvalidOrder {
                reason: format!("price {price} is not tradable"),
            });
        }
        if !volume.is_finite() || volume <= 0.0 {
            return Err(VenueError::InvalidOrder {
                reason: format!("volume {volume} must be positive"),
            });
        }

        if self.registry.is_full() {
            return Err(VenueError::CapacityExceeded {
                capacity: self.registry.capacity(),
            });
        }

        let (required, available) = self.account.requirement(side, price, volume);
        if required > available {
            return Err(VenueError::InsufficientBalance {
                side,
                required,
                available,
            });
        }

        let id = self.next_order_id;
        self.registry
            .insert(Order::new(id, side, price, volume, fill_type))?;
        self.next_order_id += 1;

        debug!(order_id = id, %side, price, volume, %fill_type, "order created");
        Ok(id)
    }

    /// Remove a resting order
    pub fn cancel_order(&mut self, order_id: OrderId) -> Option<Order> {
        let order = self.registry.delete(order_id)?;
        debug!(order_id, "order canceled");
        Some(order)
    }

    // ========================================================================
    // Tick Processing
    // ========================================================================

    /// Process one tick to completion
    pub fn process_tick(&mut self, tick: &Tick, strategy: &mut dyn Strategy) -> TickReport {
        self.ticks_processed += 1;
        self.book
            .apply_quotes(tick.bid_price, tick.bid_volume, tick.ask_price, tick.ask_volume);

        if self.start_value.is_none() {
            self.start_value = Some(self.portfolio_value());
        }

        let mut created = Vec::new();
        let mut rejected = Vec::new();
        for request in strategy.on_tick(&self.book) {
            match self.create_order(request.side, request.price, request.volume, request.fill_type) {
                Ok(id) => created.push(id),
                Err(err) => {
                    debug!(tick = self.ticks_processed, strategy = strategy.name(), %err, "order request rejected");
                    rejected.push(err);
                }
            }
        }

        let pass = self
            .engine
            .match_all(&mut self.registry, &mut self.book, &mut self.account);

        TickReport {
            created,
            rejected,
            pass,
            snapshot: self.snapshot(),
        }
    }

    /// Current best prices and balances
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.ticks_processed,
            best_bid: self.book.best_bid(),
            best_ask: self.book.best_ask(),
            portfolio_value: self.portfolio_value(),
            base_balance: self.account.base_balance,
            quote_balance: self.account.quote_balance,
        }
    }

    /// End the run: release every live order and report.
    pub fn teardown(mut self) -> RunSummary {
        let end_value = self.portfolio_value();
        let start_value = self.start_value.unwrap_or(end_value);
        let book_digest = self.book.state_digest_hex();
        let released_orders = self.registry.clear();
        self.book.clear();

        let summary = RunSummary {
            ticks_processed: self.ticks_processed,
            start_value,
            end_value,
            standard_lot: self.standard_lot,
            released_orders,
            fills_executed: self.engine.fills_executed(),
            book_digest,
        };
        info!(
            ticks = summary.ticks_processed,
            pnl = summary.in_lots(summary.profit_loss()),
            released = released_orders,
            "venue torn down"
        );
        summary
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{OrderRequest, SupportResistance};

    fn rich_config() -> VenueConfig {
        VenueConfig {
            starting_base_balance: 1_000.0,
            starting_quote_balance: 1_000.0,
            ..VenueConfig::default()
        }
    }

    fn idle(_: &Book) -> Vec<OrderRequest> {
        Vec::new()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let zero_book = VenueConfig {
            book_capacity: 0,
            ..VenueConfig::default()
        };
        let zero_registry = VenueConfig {
            registry_size: 0,
            ..VenueConfig::default()
        };

        assert!(matches!(Venue::new(&zero_book), Err(ConfigError::Invalid(_))));
        assert!(matches!(Venue::new(&zero_registry), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_create_order_assigns_sequential_ids() {
        let mut venue = Venue::new(&rich_config()).unwrap();

        assert_eq!(venue.create_order(Side::Bid, 1.0, 1.0, FillType::Limit), Ok(0));
        assert_eq!(venue.create_order(Side::Ask, 1.0, 1.0, FillType::Limit), Ok(1));
        assert_eq!(venue.registry().len(), 2);
    }

    #[test]
    fn test_capacity_exceeded_leaves_registry_unchanged() {
        let mut venue = Venue::new(&rich_config()).unwrap();
        for _ in 0..37 {
            venue.create_order(Side::Bid, 1.0, 1.0, FillType::Limit).unwrap();
        }

        let result = venue.create_order(Side::Bid, 1.0, 1.0, FillType::Limit);

        assert_eq!(result, Err(VenueError::CapacityExceeded { capacity: 37 }));
        assert_eq!(venue.registry().len(), 37);
    }

    #[test]
    fn test_insufficient_quote_for_bid() {
        let mut venue = Venue::new(&VenueConfig::default()).unwrap();

        let result = venue.create_order(Side::Bid, 2.0, 6.0, FillType::Limit);

        assert_eq!(
            result,
            Err(VenueError::InsufficientBalance {
                side: Side::Bid,
                required: 12.0,
                available: 10.0,
            })
        );
        assert!(venue.registry().is_empty());
        // Rejections do not consume ids
        assert_eq!(venue.create_order(Side::Bid, 2.0, 5.0, FillType::Limit), Ok(0));
    }

    #[test]
    fn test_insufficient_base_for_ask() {
        let mut venue = Venue::new(&VenueConfig::default()).unwrap();

        let result = venue.create_order(Side::Ask, 1.3, 0.5, FillType::Limit);

        assert!(matches!(result, Err(VenueError::InsufficientBalance { side: Side::Ask, .. })));
    }

    #[test]
    fn test_invalid_order_rejected() {
        let mut venue = Venue::new(&rich_config()).unwrap();

        assert!(matches!(
            venue.create_order(Side::Bid, f64::NAN, 1.0, FillType::Limit),
            Err(VenueError::InvalidOrder { .. })
        ));
        assert!(matches!(
            venue.create_order(Side::Bid, 1.0, 0.0, FillType::Limit),
            Err(VenueError::InvalidOrder { .. })
        ));
    }

    #[test]
    fn test_cancel_order() {
        let mut venue = Venue::new(&rich_config()).unwrap();
        let id = venue.create_order(Side::Bid, 1.0, 1.0, FillType::Limit).unwrap();

        assert_eq!(venue.cancel_order(id).unwrap().id, id);
        assert!(venue.cancel_order(id).is_none());
        assert!(venue.registry().is_empty());
    }

    #[test]
    fn test_tick_inserts_levels_and_snapshots() {
        let mut venue = Venue::new(&VenueConfig::default()).unwrap();

        let report = venue.process_tick(&Tick::new(1.30, 1.0, 1.31, 2.0), &mut idle);

        assert_eq!(report.snapshot.tick, 1);
        assert_eq!(report.snapshot.best_bid, Some(1.30));
        assert_eq!(report.snapshot.best_ask, Some(1.31));
        assert_eq!(report.snapshot.portfolio_value, 10.0);
        assert_eq!(report.pass.examined, 0);
    }

    #[test]
    fn test_resting_order_fills_on_later_tick() {
        let mut venue = Venue::new(&VenueConfig::default()).unwrap();
        venue.process_tick(&Tick::new(1.30, 1.0, 1.31, 2.0), &mut idle);
        let id = venue.create_order(Side::Bid, 1.25, 4.0, FillType::Limit).unwrap();

        let report = venue.process_tick(&Tick::new(1.30, 1.0, 1.31, 2.0), &mut idle);
        assert_eq!(report.pass.no_match, 1);

        // Ask drops to the limit
        let report = venue.process_tick(&Tick::new(1.20, 1.0, 1.25, 4.0), &mut idle);
        assert_eq!(report.pass.fully_filled, 1);
        assert!(!venue.registry().contains(id));
        assert_eq!(venue.account().base_balance, 4.0);
        assert_eq!(venue.account().quote_balance, 5.0);
        assert!(venue.book().asks().search(1.25).is_none());
    }

    #[test]
    fn test_strategy_rejections_reported() {
        let mut venue = Venue::new(&VenueConfig::default()).unwrap();
        let mut strategy = SupportResistance::new(1.28, 1.35);

        // Bid at resistance asks to sell base we do not hold
        let report = venue.process_tick(&Tick::new(1.36, 5.0, 1.37, 5.0), &mut strategy);

        assert!(report.created.is_empty());
        assert_eq!(report.rejected.len(), 1);
        assert!(matches!(report.rejected[0], VenueError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_teardown_reports_run() {
        let mut venue = Venue::new(&VenueConfig::default()).unwrap();
        let mut strategy = SupportResistance::new(1.28, 1.35);
        venue.process_tick(&Tick::new(1.26, 2.0, 1.27, 4.0), &mut strategy);
        venue.create_order(Side::Bid, 0.5, 1.0, FillType::Limit).unwrap();

        let summary = venue.teardown();

        assert_eq!(summary.ticks_processed, 1);
        assert_eq!(summary.start_value, 10.0);
        assert_eq!(summary.released_orders, 1);
        assert_eq!(summary.fills_executed, 1);
        assert_eq!(summary.book_digest.len(), 64);
        assert_eq!(summary.standard_lot, 100_000);
        assert!(summary.to_string().contains("P/L:"));
    }

    #[test]
    fn test_teardown_without_ticks() {
        let summary = Venue::new(&VenueConfig::default()).unwrap().teardown();

        assert_eq!(summary.ticks_processed, 0);
        assert_eq!(summary.profit_loss(), 0.0);
        assert_eq!(summary.in_lots(summary.end_value), 1_000_000.0);
    }
}
