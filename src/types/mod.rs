//! Core data types for tickbook
//!
//! ## Types
//!
//! - [`Order`]: A working order held by the registry
//! - [`Side`]: Bid or Ask
//! - [`FillType`]: Market or Limit
//! - [`Fill`]: One execution against a resting level
//! - [`Account`]: Base/quote balances, the venue's [`Ledger`]
//!
//! Prices and volumes are `f64`. Volumes are in base-currency units and
//! prices are quote per base.

mod account;
mod error;
mod fill;
mod order;

// Re-export all types at module level
pub use account::{Account, Ledger};
pub use error::{ConfigError, FeedError, TelemetryError, VenueError};
pub use fill::Fill;
pub use order::{FillType, Order, OrderId, Side};
