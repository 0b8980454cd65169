//! # horde_core - Horde Core Primitives
//!
//! Zero-dependency building blocks shared by every other horde crate:
//! - **Handles**: generational indices that detect use-after-release
//! - **Ids**: stable instance ids and named tags for species
//! - **Errors**: handle validation errors
//!
//! Nothing in here knows about agents or combat. Higher crates attach
//! meaning to the handles by picking the marker type.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

pub mod error;
pub mod handle;
pub mod id;

pub use error::*;
pub use handle::*;
pub use id::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::HandleError;
    pub use crate::handle::{Handle, HandleAllocator};
    pub use crate::id::{Id, IdGenerator, NamedId};
}
