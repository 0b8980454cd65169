//! # horde_memory - Slot Pools
//!
//! Fixed-capacity object pools for simulation entities:
//! - Values are constructed once and recycled in place on reuse
//! - Every slot carries a generation so stale handles are rejected
//! - Capacity is a hard cap; exhaustion is reported, never a panic

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod pool;

pub use pool::{PoolStats, SlotPool};

pub mod prelude {
    pub use crate::pool::{PoolStats, SlotPool};
    pub use horde_core::Handle;
}
