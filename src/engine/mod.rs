//! Matching engine module for tickbook.
//!
//! ## Design Principles
//!
//! 1. **Determinism**: the same book, registry and order produce the same fills
//! 2. **Synchronous execution**: one order at a time, no interleaving
//! 3. **Best level first**: an order walks the opposite side best to worst
//! 4. **No intra-level queue**: levels are aggregated volume only
//!
//! ## Matching Rules
//!
//! - **Bid orders** match against asks (lowest price first)
//! - **Ask orders** match against bids (highest price first)
//! - **Partial fills** leave the order in the registry with reduced volume
//! - **Fills** reach the [`Ledger`](crate::types::Ledger) before the book changes
//!
//! ## Example
//!
//! ```
//! use tickbook::engine::MatchingEngine;
//! use tickbook::orderbook::Book;
//! use tickbook::registry::OrderRegistry;
//! use tickbook::types::{Account, FillType, Order, Side};
//!
//! let mut book = Book::new();
//! book.apply_quotes(1.30, 5.0, 1.31, 5.0);
//!
//! let mut registry = OrderRegistry::new();
//! registry.insert(Order::new(0, Side::Bid, 1.31, 2.0, FillType::Limit)).unwrap();
//!
//! let mut account = Account::new(0.0, 10.0);
//! let mut engine = MatchingEngine::new();
//! let pass = engine.match_all(&mut registry, &mut book, &mut account);
//!
//! assert_eq!(pass.fully_filled, 1);
//! assert_eq!(account.base_balance, 2.0);
//! ```

pub mod matcher;

pub use matcher::{MatchOutcome, MatchResult, MatchingEngine, PassSummary};
