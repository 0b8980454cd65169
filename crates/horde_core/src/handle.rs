//! Generational handles for pooled slots
//!
//! A handle names a slot and the generation of the occupant it was issued
//! for. Releasing a slot bumps its generation, so every handle issued for a
//! previous occupant stops resolving. Generations are 32 bits and never wrap:
//! a slot whose generation is exhausted is retired instead of reused.

use crate::error::HandleError;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

/// A type-safe handle to a slot holding a `T`
#[repr(transparent)]
pub struct Handle<T> {
    /// Lower 32 bits: index, upper 32 bits: generation
    bits: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Largest usable index; `u32::MAX` is reserved for the null handle
    pub const MAX_INDEX: u32 = u32::MAX - 1;

    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            bits: (generation as u64) << 32 | index as u64,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn null() -> Self {
        Self {
            bits: u64::MAX,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        self.bits == u64::MAX
    }

    /// Slot index
    #[inline]
    pub const fn index(&self) -> u32 {
        self.bits as u32
    }

    /// Occupant generation
    #[inline]
    pub const fn generation(&self) -> u32 {
        (self.bits >> 32) as u32
    }

    #[inline]
    pub const fn to_bits(&self) -> u64 {
        self.bits
    }

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            bits,
            _marker: PhantomData,
        }
    }
}

// Manual trait implementations to avoid T bounds
impl<T> Clone for Handle<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Handle(null)")
        } else {
            write!(f, "Handle({}v{})", self.index(), self.generation())
        }
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct SlotState {
    generation: u32,
    live: bool,
}

/// Result of a successful allocation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation<T> {
    pub handle: Handle<T>,
    /// True when the slot was taken from the free list rather than freshly created
    pub recycled: bool,
}

/// Allocates slot indices with generation tracking and an optional cap
pub struct HandleAllocator<T> {
    slots: Vec<SlotState>,
    /// Released indices, reused LIFO
    free_list: Vec<u32>,
    /// Maximum number of slots ever created
    limit: u32,
    /// Slots whose generation ran out; never handed out again
    retired: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> HandleAllocator<T> {
    /// Create an allocator that may grow up to the full index space
    pub fn new() -> Self {
        Self::with_limit(Handle::<T>::MAX_INDEX as usize + 1)
    }

    /// Create an allocator that never creates more than `limit` slots
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.min(Handle::<T>::MAX_INDEX as usize + 1) as u32;
        Self {
            slots: Vec::with_capacity(limit.min(64) as usize),
            free_list: Vec::new(),
            limit,
            retired: 0,
            _marker: PhantomData,
        }
    }

    /// Allocate a handle, preferring released slots.
    ///
    /// Returns `None` once every slot up to the limit is live.
    pub fn allocate(&mut self) -> Option<Allocation<T>> {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.live = true;
            return Some(Allocation {
                handle: Handle::new(index, slot.generation),
                recycled: true,
            });
        }

        let index = self.slots.len() as u32;
        if index >= self.limit {
            return None;
        }
        self.slots.push(SlotState {
            generation: 0,
            live: true,
        });
        Some(Allocation {
            handle: Handle::new(index, 0),
            recycled: false,
        })
    }

    /// Release a handle, making its index available for reuse.
    ///
    /// Returns false for stale, null or already released handles.
    pub fn free(&mut self, handle: Handle<T>) -> bool {
        if !self.is_valid(handle) {
            return false;
        }
        let slot = &mut self.slots[handle.index() as usize];
        slot.live = false;
        match slot.generation.checked_add(1) {
            Some(next) => {
                slot.generation = next;
                self.free_list.push(handle.index());
            }
            None => self.retired += 1,
        }
        true
    }

    /// Check that the handle names a live slot of the same generation
    pub fn check(&self, handle: Handle<T>) -> Result<(), HandleError> {
        if handle.is_null() {
            return Err(HandleError::Null);
        }
        let slot = self
            .slots
            .get(handle.index() as usize)
            .ok_or(HandleError::OutOfBounds)?;
        if slot.live && slot.generation == handle.generation() {
            Ok(())
        } else {
            Err(HandleError::Stale)
        }
    }

    #[inline]
    pub fn is_valid(&self, handle: Handle<T>) -> bool {
        self.check(handle).is_ok()
    }

    /// Handle for a live slot index, if any
    pub fn live_handle(&self, index: u32) -> Option<Handle<T>> {
        let slot = self.slots.get(index as usize)?;
        slot.live.then(|| Handle::new(index, slot.generation))
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len() - self.retired as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots ever created
    pub fn created(&self) -> usize {
        self.slots.len()
    }

    /// Number of released slots waiting for reuse
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    pub fn limit(&self) -> usize {
        self.limit as usize
    }

    /// Number of slots retired after exhausting their generations
    pub fn retired_count(&self) -> usize {
        self.retired as usize
    }
}

impl<T> Default for HandleAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_packing() {
        let h: Handle<u8> = Handle::new(1234, 70_000);
        assert_eq!(h.index(), 1234);
        assert_eq!(h.generation(), 70_000);
        assert!(!h.is_null());
        assert!(Handle::<u8>::null().is_null());
    }

    #[test]
    fn test_release_invalidates_old_handle() {
        let mut alloc: HandleAllocator<i32> = HandleAllocator::new();
        let h1 = alloc.allocate().unwrap().handle;
        assert!(alloc.is_valid(h1));

        assert!(alloc.free(h1));
        assert!(!alloc.is_valid(h1));
        assert!(!alloc.free(h1));

        let again = alloc.allocate().unwrap();
        assert!(again.recycled);
        assert_eq!(again.handle.index(), h1.index());
        assert_ne!(again.handle.generation(), h1.generation());
        assert!(!alloc.is_valid(h1));
    }

    #[test]
    fn test_generation_survives_many_recycles() {
        let mut alloc: HandleAllocator<i32> = HandleAllocator::with_limit(1);
        let first = alloc.allocate().unwrap().handle;
        alloc.free(first);

        let mut last = first;
        for _ in 0..1_000 {
            last = alloc.allocate().unwrap().handle;
            assert_eq!(last.index(), first.index());
            alloc.free(last);
        }
        let current = alloc.allocate().unwrap().handle;
        assert_eq!(current.generation(), 1_001);
        assert_ne!(current, first);
        assert_eq!(alloc.check(first), Err(HandleError::Stale));
        assert_eq!(alloc.check(last), Err(HandleError::Stale));
        assert!(alloc.is_valid(current));
    }

    #[test]
    fn test_exhausted_generation_retires_slot() {
        let mut alloc: HandleAllocator<i32> = HandleAllocator::with_limit(1);
        let first = alloc.allocate().unwrap().handle;
        alloc.free(first);
        alloc.slots[0].generation = u32::MAX;

        let last = alloc.allocate().unwrap().handle;
        assert_eq!(last.generation(), u32::MAX);
        assert!(alloc.free(last));
        assert_eq!(alloc.retired_count(), 1);
        assert_eq!(alloc.len(), 0);
        assert!(alloc.allocate().is_none());
        assert_eq!(alloc.check(last), Err(HandleError::Stale));
    }

    #[test]
    fn test_check_reports_reason() {
        let mut alloc: HandleAllocator<i32> = HandleAllocator::new();
        assert_eq!(alloc.check(Handle::null()), Err(HandleError::Null));
        assert_eq!(alloc.check(Handle::new(3, 0)), Err(HandleError::OutOfBounds));
        let h = alloc.allocate().unwrap().handle;
        assert_eq!(alloc.check(h), Ok(()));
    }

    #[test]
    fn test_limit_reports_exhaustion() {
        let mut alloc: HandleAllocator<i32> = HandleAllocator::with_limit(2);
        let a = alloc.allocate().unwrap().handle;
        let _b = alloc.allocate().unwrap();
        assert!(alloc.allocate().is_none());

        alloc.free(a);
        assert!(alloc.allocate().is_some());
        assert_eq!(alloc.created(), 2);
    }

    #[test]
    fn test_live_handle_lookup() {
        let mut alloc: HandleAllocator<i32> = HandleAllocator::new();
        let a = alloc.allocate().unwrap().handle;
        assert_eq!(alloc.live_handle(0), Some(a));
        alloc.free(a);
        assert_eq!(alloc.live_handle(0), None);
        assert_eq!(alloc.live_handle(9), None);
    }
}
