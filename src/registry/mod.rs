//! Order registry: the working orders of the simulated trader.
//!
//! Orders live here, exclusively owned by the table, from creation until
//! they are fully filled or canceled. The matching engine reads a
//! [`OrderRegistry::snapshot`] so it never iterates the table it mutates.

pub mod table;

pub use table::{OrderRegistry, TABLE_SIZE};
