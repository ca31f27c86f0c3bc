//! Arena + Free List Pool Implementation

use crate::PoolError;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(0);

/// Handle to one record owned by an [`ObjectPool`].
///
/// A slot is move-only: giving it back through [`ObjectPool::release`]
/// consumes it, so the same record cannot be released twice.
#[derive(Debug, PartialEq, Eq)]
pub struct Slot {
    index: usize,
    pool_id: u32,
}

impl Slot {
    /// Index of the record inside the pool's arena
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Fixed-size reservoir of pre-allocated, reusable records
pub struct ObjectPool<T> {
    /// Pre-allocated storage
    arena: Box<[T]>,
    /// Indices of records not currently handed out
    free: Vec<usize>,
    /// Identifies slots minted by this pool
    id: u32,
}

impl<T: Default> ObjectPool<T> {
    /// Create a pool with `capacity` default-initialised records
    pub fn new(capacity: usize) -> Result<Self, PoolError> {
        if capacity == 0 {
            return Err(PoolError::ZeroCapacity);
        }

        let arena: Vec<T> = (0..capacity).map(|_| T::default()).collect();
        // Reversed so the first acquire hands out slot 0
        let free: Vec<usize> = (0..capacity).rev().collect();
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);

        debug!("Object pool {} created with {} records", id, capacity);

        Ok(Self {
            arena: arena.into_boxed_slice(),
            free,
            id,
        })
    }
}

impl<T> ObjectPool<T> {
    /// Take a free record out of the pool, or `None` when exhausted
    pub fn acquire(&mut self) -> Option<Slot> {
        self.free.pop().map(|index| Slot {
            index,
            pool_id: self.id,
        })
    }

    /// Return a record to the pool.
    ///
    /// The record keeps its old field values; the next acquirer overwrites them.
    pub fn release(&mut self, slot: Slot) {
        debug_assert_eq!(slot.pool_id, self.id, "slot released into a foreign pool");
        // Never reallocates: `free` was sized to the arena and every index is unique
        self.free.push(slot.index);
    }

    /// Borrow the record held by a slot
    pub fn get(&self, slot: &Slot) -> &T {
        debug_assert_eq!(slot.pool_id, self.id, "slot read from a foreign pool");
        &self.arena[slot.index]
    }

    /// Mutably borrow the record held by a slot
    pub fn get_mut(&mut self, slot: &Slot) -> &mut T {
        debug_assert_eq!(slot.pool_id, self.id, "slot written through a foreign pool");
        &mut self.arena[slot.index]
    }

    /// Total number of records owned by the pool
    pub fn capacity(&self) -> usize {
        self.arena.len()
    }

    /// Number of records ready to be acquired
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Number of records currently handed out
    pub fn in_use(&self) -> usize {
        self.arena.len() - self.free.len()
    }

    /// Check if every record is handed out
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}
