//! Slot pool - fixed-capacity arena with a free list
//!
//! Released values stay in their slot so the next acquire can reset them in
//! place instead of allocating. The pool hands out `Handle<T>`s whose
//! generation is bumped on release.

use alloc::vec::Vec;
use horde_core::{Handle, HandleAllocator, HandleError};

/// Fixed-capacity pool of reusable values
pub struct SlotPool<T> {
    allocator: HandleAllocator<T>,
    /// One value per slot ever created, live or not
    values: Vec<T>,
    /// Number of acquires served from the free list
    recycled: u64,
}

impl<T> SlotPool<T> {
    /// Create a pool that holds at most `capacity` live values
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            allocator: HandleAllocator::with_limit(capacity),
            values: Vec::new(),
            recycled: 0,
        }
    }

    /// Acquire a slot.
    ///
    /// A released slot is handed to `reuse` to be reset in place; otherwise a
    /// fresh value is built with `create`. Returns `None` when the pool is at
    /// capacity, in which case neither closure runs.
    pub fn acquire_with<C, R>(&mut self, create: C, reuse: R) -> Option<Handle<T>>
    where
        C: FnOnce() -> T,
        R: FnOnce(&mut T),
    {
        let allocation = self.allocator.allocate()?;
        let index = allocation.handle.index() as usize;
        if allocation.recycled {
            self.recycled += 1;
            reuse(&mut self.values[index]);
        } else {
            debug_assert_eq!(index, self.values.len());
            self.values.push(create());
        }
        Some(allocation.handle)
    }

    /// Release a slot and return its value for deactivation.
    ///
    /// Stale or already released handles return `None`.
    pub fn release(&mut self, handle: Handle<T>) -> Option<&mut T> {
        if !self.allocator.free(handle) {
            return None;
        }
        self.values.get_mut(handle.index() as usize)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.try_get(handle).ok()
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.try_get_mut(handle).ok()
    }

    /// Like [`get`](Self::get), reporting why the handle did not resolve
    pub fn try_get(&self, handle: Handle<T>) -> Result<&T, HandleError> {
        self.allocator.check(handle)?;
        self.values
            .get(handle.index() as usize)
            .ok_or(HandleError::OutOfBounds)
    }

    pub fn try_get_mut(&mut self, handle: Handle<T>) -> Result<&mut T, HandleError> {
        self.allocator.check(handle)?;
        self.values
            .get_mut(handle.index() as usize)
            .ok_or(HandleError::OutOfBounds)
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.allocator.is_valid(handle)
    }

    /// Write every live handle, in slot order, into `out` (cleared first).
    ///
    /// Lets callers iterate while mutating the pool without allocating.
    pub fn collect_live(&self, out: &mut Vec<Handle<T>>) {
        out.clear();
        out.extend((0..self.values.len() as u32).filter_map(|i| self.allocator.live_handle(i)));
    }

    /// Iterate live values in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(move |(i, value)| {
                self.allocator.live_handle(i as u32).map(|h| (h, value))
            })
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.allocator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocator.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.allocator.limit()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            live: self.len(),
            free: self.allocator.free_count(),
            created: self.allocator.created(),
            recycled: self.recycled,
            retired: self.allocator.retired_count(),
        }
    }
}

/// Pool statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    pub live: usize,
    pub free: usize,
    pub created: usize,
    pub recycled: u64,
    /// Slots taken out of service after exhausting their generations
    pub retired: usize,
}
