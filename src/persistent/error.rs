//! Error types for the persistent collections.

/// Represents an access outside the bounds of a vector.
///
/// Returned by [`PersistentVector::at`](super::PersistentVector::at),
/// [`PersistentVector::update`](super::PersistentVector::update) and their
/// [`TransientVector`](super::TransientVector) counterparts when `index` is not
/// smaller than the vector's length. The vector is left untouched.
///
/// # Examples
///
/// ```rust
/// use pvector::persistent::{IndexOutOfRange, PersistentVector};
///
/// let vector = PersistentVector::new().push_back(1).push_back(2);
/// let error = vector.at(5).unwrap_err();
///
/// assert_eq!(error, IndexOutOfRange { index: 5, length: 2 });
/// assert_eq!(format!("{error}"), "index out of range: index 5, length 2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutOfRange {
    /// The index that was requested.
    pub index: usize,
    /// The length of the vector at the time of the request.
    pub length: usize,
}

impl std::fmt::Display for IndexOutOfRange {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "index out of range: index {}, length {}",
            self.index, self.length
        )
    }
}

impl std::error::Error for IndexOutOfRange {}
