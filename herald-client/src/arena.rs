//! Fixed-capacity pool of message slots.
//!
//! Every outbound message holds one [`Slot`] for its whole lifetime, which
//! bounds the number of messages the client keeps in memory regardless of
//! payload size. Slots are handed out from a preallocated free list and go
//! back to it when dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::error;

#[derive(Debug)]
struct FreeList {
    capacity: usize,
    free: Mutex<Vec<usize>>,
}

impl FreeList {
    fn lock(&self) -> MutexGuard<'_, Vec<usize>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owner handle of the pool.
#[derive(Debug)]
pub struct MessageArena {
    slots: Arc<FreeList>,
}

/// A claimed slot. Returns itself to the pool on drop.
#[derive(Debug)]
pub struct Slot {
    index: usize,
    slots: Arc<FreeList>,
}

impl MessageArena {
    /// Create a pool with `capacity` slots. Returns `None` for a zero capacity.
    pub fn with_capacity(capacity: usize) -> Option<Self> {
        if capacity == 0 {
            return None;
        }
        // Reversed so the lowest index is handed out first.
        let free = (0..capacity).rev().collect();
        Some(Self {
            slots: Arc::new(FreeList {
                capacity,
                free: Mutex::new(free),
            }),
        })
    }

    /// Claim a free slot, or `None` when every slot is in use.
    pub fn alloc(&self) -> Option<Slot> {
        let index = self.slots.lock().pop()?;
        Some(Slot {
            index,
            slots: Arc::clone(&self.slots),
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity
    }

    pub fn in_use(&self) -> usize {
        self.slots.capacity - self.slots.lock().len()
    }
}

impl Slot {
    #[cfg(test)]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.slots.lock().push(self.index);
    }
}

impl Drop for MessageArena {
    fn drop(&mut self) {
        let in_use = self.in_use();
        if in_use != 0 {
            error!("Message arena dropped with {} slots still in use", in_use);
            if !std::thread::panicking() {
                debug_assert_eq!(in_use, 0, "message slots leaked");
            }
        }
    }
}
