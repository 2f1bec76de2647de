//! # tickbook
//!
//! Single-instrument trading venue simulator driven by top-of-book ticks.
//!
//! ## Architecture
//!
//! - **Types**: Order, Fill, Account and the Ledger boundary
//! - **OrderBook**: bounded red-black price-level index per side
//! - **Registry**: open-addressed table of working orders
//! - **Engine**: walks the book to fill working orders
//! - **Venue**: per-run state and the tick loop
//!
//! ## Design Principles
//!
//! 1. **Determinism**: identical tick streams produce identical books and balances
//! 2. **Bounded memory**: at most `capacity` levels per side, `TABLE_SIZE` orders
//! 3. **Arena storage**: tree links are slab keys, never aliased references
//! 4. **Synchronous execution**: each tick runs to completion before the next
//!
//! ## Tick Flow
//!
//! ```text
//! tick -> insert bid level, insert ask level
//!      -> strategy requests -> create_order
//!      -> match_all over a registry snapshot
//!      -> snapshot -> telemetry
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Order, Fill, Account, errors
pub mod types;

/// Order book: bounded price-level indices
pub mod orderbook;

/// Order registry: working orders by id
pub mod registry;

/// Matching engine: fills working orders against the book
pub mod engine;

/// Tick source over CSV records
pub mod feed;

/// Order-generating strategies
pub mod strategy;

/// Snapshot sinks
pub mod telemetry;

pub mod config;
pub mod perf;
pub mod venue;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use config::VenueConfig;
pub use engine::{MatchOutcome, MatchResult, MatchingEngine, PassSummary};
pub use orderbook::{Book, Level, PriceLevelIndex};
pub use registry::OrderRegistry;
pub use types::{Account, Fill, FillType, Ledger, Order, OrderId, Side, VenueError};
pub use venue::{RunSummary, Snapshot, TickReport, Venue};
