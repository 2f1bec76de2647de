//! Open-addressed order table.
//!
//! ## Layout
//!
//! A fixed array of slots, `hash(id) = id mod size`, linear probing with
//! wrap-around. Each slot is one of:
//!
//! ```text
//! Empty       never used; ends a probe chain
//! Tombstone   held an order that left; probes skip it, inserts reuse it
//! Occupied    a live order
//! ```
//!
//! Deleting writes a tombstone instead of `Empty`, so a key that collided
//! past the deleted slot is still reachable.

use tracing::trace;

use crate::types::{Order, OrderId, VenueError};

/// Default table size (prime)
pub const TABLE_SIZE: usize = 37;

#[derive(Debug, Clone)]
enum Slot {
    Empty,
    Tombstone,
    Occupied(Order),
}

/// Fixed-capacity registry of working orders.
///
/// ## Example
///
/// ```
/// use tickbook::registry::OrderRegistry;
/// use tickbook::types::{FillType, Order, Side};
///
/// let mut registry = OrderRegistry::new();
/// registry.insert(Order::new(1, Side::Bid, 1.28, 1.0, FillType::Limit)).unwrap();
/// registry.insert(Order::new(38, Side::Ask, 1.35, 1.0, FillType::Limit)).unwrap(); // collides with 1
///
/// registry.delete(1);
/// assert!(registry.search(1).is_none());
/// assert!(registry.search(38).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct OrderRegistry {
    /// Slot array, length fixed at construction
    slots: Vec<Slot>,

    /// Number of occupied slots
    live: usize,
}

impl Default for OrderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderRegistry {
    /// Create an empty registry with [`TABLE_SIZE`] slots
    pub fn new() -> Self {
        Self::with_size(TABLE_SIZE)
    }

    /// Create an empty registry with `size` slots
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero
    pub fn with_size(size: usize) -> Self {
        assert!(size > 0, "order registry needs at least one slot");
        Self {
            slots: vec![Slot::Empty; size],
            live: 0,
        }
    }

    // ========================================================================
    // Capacity and Size
    // ========================================================================

    /// Total number of slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live orders
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.live == self.slots.len()
    }

    #[inline]
    pub fn free_slots(&self) -> usize {
        self.slots.len() - self.live
    }

    /// Home slot of an order id
    #[inline]
    pub fn hash(&self, order_id: OrderId) -> usize {
        (order_id % self.slots.len() as u64) as usize
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Store an order in the first reusable slot of its probe chain.
    ///
    /// # Returns
    ///
    /// The slot index, or `CapacityExceeded` / `DuplicateOrder`
    pub fn insert(&mut self, order: Order) -> Result<usize, VenueError> {
        if self.is_full() {
            return Err(VenueError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }

        let mut reusable = None;
        for index in self.probe(order.id) {
            match &self.slots[index] {
                Slot::Occupied(existing) if existing.id == order.id => {
                    return Err(VenueError::DuplicateOrder(order.id));
                }
                Slot::Occupied(_) => {}
                Slot::Tombstone => {
                    reusable.get_or_insert(index);
                }
                Slot::Empty => {
                    reusable.get_or_insert(index);
                    break;
                }
            }
        }

        // Not full, so the chain held at least one tombstone or empty slot
        let index = reusable.ok_or(VenueError::CapacityExceeded {
            capacity: self.capacity(),
        })?;
        trace!(order_id = order.id, slot = index, "order registered");
        self.slots[index] = Slot::Occupied(order);
        self.live += 1;
        Ok(index)
    }

    /// Find a live order by id
    pub fn search(&self, order_id: OrderId) -> Option<&Order> {
        self.find_slot(order_id).and_then(|index| match &self.slots[index] {
            Slot::Occupied(order) => Some(order),
            _ => None,
        })
    }

    /// Find a live order by id, mutably
    pub fn get_mut(&mut self, order_id: OrderId) -> Option<&mut Order> {
        let index = self.find_slot(order_id)?;
        match &mut self.slots[index] {
            Slot::Occupied(order) => Some(order),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.find_slot(order_id).is_some()
    }

    /// Remove an order, leaving a tombstone in its slot
    ///
    /// # Returns
    ///
    /// The removed order, or None if the id is not live
    pub fn delete(&mut self, order_id: OrderId) -> Option<Order> {
        let index = self.find_slot(order_id)?;
        match std::mem::replace(&mut self.slots[index], Slot::Tombstone) {
            Slot::Occupied(order) => {
                self.live -= 1;
                trace!(order_id, slot = index, "order removed");
                Some(order)
            }
            other => {
                self.slots[index] = other;
                None
            }
        }
    }

    /// Point-in-time copy of all live orders, in slot order
    pub fn snapshot(&self) -> Vec<Order> {
        self.iter().copied().collect()
    }

    /// Iterate live orders in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(order) => Some(order),
            _ => None,
        })
    }

    /// Number of tombstoned slots
    pub fn tombstones(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Tombstone))
            .count()
    }

    /// Release every order and reset all slots to empty
    pub fn clear(&mut self) -> usize {
        let released = self.live;
        self.slots.fill(Slot::Empty);
        self.live = 0;
        released
    }

    // ========================================================================
    // Probing
    // ========================================================================

    /// Slot indices from the home slot, wrapping, each visited once
    fn probe(&self, order_id: OrderId) -> impl Iterator<Item = usize> {
        let size = self.slots.len();
        let home = self.hash(order_id);
        (0..size).map(move |step| (home + step) % size)
    }

    /// Slot holding `order_id`; stops at the first empty slot
    fn find_slot(&self, order_id: OrderId) -> Option<usize> {
        for index in self.probe(order_id) {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied(order) if order.id == order_id => return Some(index),
                _ => {}
            }
        }
        None
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
