//! # pvector
//!
//! A persistent vector for Rust: every update returns a new version while
//! older versions stay valid, and versions share all storage they have in
//! common.
//!
//! ## Overview
//!
//! - **[`PersistentVector`](persistent::PersistentVector)**: immutable,
//!   cheaply clonable vector backed by a 32-way radix trie
//! - **[`TransientVector`](persistent::TransientVector)**: single-owner
//!   variant that edits its own nodes in place, for batches of writes
//!
//! ## Feature Flags
//!
//! - `arc`: use `Arc` instead of `Rc` so persistent vectors are `Send + Sync`
//! - `serde`: `Serialize`/`Deserialize` for `PersistentVector`
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use pvector::prelude::*;
//!
//! let empty = PersistentVector::new();
//! let version1 = (0..5).fold(empty.clone(), |vector, index| vector.push_back(index));
//! let version2 = version1.update(0, 1000).unwrap();
//!
//! assert_eq!(format!("{empty}"), "[]");
//! assert_eq!(format!("{version1}"), "[0 1 2 3 4]");
//! assert_eq!(format!("{version2}"), "[1000 1 2 3 4]");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use pvector::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;
