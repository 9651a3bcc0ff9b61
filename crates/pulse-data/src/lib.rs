//! Typed raw-pointer registry for the pulse toolkit.
//!
//! A [`ValueBag`] maps caller-chosen keys to raw pointers at
//! externally-owned data, remembering each pointer's type identity so
//! that lookups are checked at runtime: `get::<T>` succeeds only when
//! the entry was registered as the same `T`.
//!
//! The bag is a registry, not a container: it never owns, frees, or
//! dereferences the pointed-to memory. Keeping the pointee alive for
//! as long as the entry exists is the caller's contract.
//!
//! # Example
//!
//! ```
//! use pulse_data::ValueBag;
//!
//! let mut bag: ValueBag<&str> = ValueBag::new();
//! let mut frame_count: u64 = 0;
//!
//! bag.register("frame-count", &mut frame_count, "renderer frame counter")
//!     .unwrap();
//!
//! let ptr = bag.get::<u64>(&"frame-count").unwrap();
//! assert_eq!(ptr as usize, &mut frame_count as *mut u64 as usize);
//!
//! // Wrong type: descriptive failure, no pointer.
//! assert!(bag.get::<i32>(&"frame-count").is_err());
//! ```

mod bag;
mod error;

pub use bag::ValueBag;
pub use error::BagError;
