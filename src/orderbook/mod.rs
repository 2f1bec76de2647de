//! Order book module for the tickbook venue.
//!
//! ## Architecture
//!
//! Each side of the book is a [`PriceLevelIndex`]: a red-black tree of
//! aggregated price levels with:
//!
//! - **Slab-based storage**: nodes addressed by key, no aliased links
//! - **Volume aggregation**: one level per distinct price, no intra-level queue
//! - **Bounded size**: at most `capacity` levels, the worst is evicted
//! - **Stale pruning**: a worse top-of-book deletes the better levels
//!
//! ## Components
//!
//! - [`LevelNode`]: price, volume, color and tree links
//! - [`PriceLevelIndex`]: one side of the book
//! - [`Book`]: bid and ask indices together
//!
//! ## Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Insert level | O(log n) |
//! | Delete level by key | O(log n) |
//! | Best / worst | O(log n) |
//! | Next best | O(log n) amortized O(1) |
//! | Search by price | O(log n) |

pub mod book;
pub mod index;
pub mod node;

pub use book::Book;
pub use index::{IndexViolation, InsertOutcome, Level, PriceLevelIndex, DEFAULT_CAPACITY};
pub use node::{Color, Dir, LevelKey, LevelNode};
