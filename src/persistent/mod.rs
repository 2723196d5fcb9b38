//! Persistent (immutable) vector with transient batch updates.
//!
//! - [`PersistentVector`]: persistent vector (32-way radix trie)
//! - [`TransientVector`]: single-owner vector editing its own nodes in place
//! - [`IndexOutOfRange`]: the error returned by bounds-checked access
//!
//! # Structural Sharing
//!
//! Updating or appending to a [`PersistentVector`] copies only the nodes on
//! the path to the affected element; every other node is shared with the
//! original vector, which stays valid and unchanged.
//!
//! # Examples
//!
//! ```rust
//! use pvector::persistent::PersistentVector;
//!
//! let vector: PersistentVector<i32> = (0..100).collect();
//! assert_eq!(vector.get(50), Some(&50));
//!
//! // Structural sharing: the original vector is preserved
//! let updated = vector.update(50, 999).unwrap();
//! assert_eq!(vector.get(50), Some(&50));     // Original unchanged
//! assert_eq!(updated.get(50), Some(&999));   // New version
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod error;
mod node;
mod vector;

pub use error::IndexOutOfRange;
pub use vector::Iter;
pub use vector::PersistentVector;
pub use vector::TransientVector;

// =============================================================================
// Tests
// =============================================================================
