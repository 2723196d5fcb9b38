//! Persistent (immutable) vector based on a 32-way radix trie.
//!
//! This module provides [`PersistentVector`], an immutable dynamic array that
//! uses structural sharing for efficient updates, and [`TransientVector`], its
//! single-owner counterpart for batches of in-place edits.
//!
//! # Overview
//!
//! - O(log32 N) random access (effectively O(1) for practical sizes)
//! - O(log32 N) `push_back`, growing the trie one level at a time
//! - O(log32 N) update
//! - O(1) len and `is_empty`
//! - O(1) conversion to a transient, O(k) back to persistent where k is the
//!   number of nodes written while transient
//!
//! # Internal Structure
//!
//! The vector holds a root node, its length and a `shift`: the number of index
//! bits consumed by the levels above the leaves. Reading index `i` picks child
//! `(i >> shift) & 31` at every level and `i & 31` in the leaf. The trie gets
//! taller only when the root itself is full, so `shift` is always the smallest
//! value able to address every element.
//!
//! # Examples
//!
//! ```rust
//! use pvector::persistent::PersistentVector;
//!
//! let vector = PersistentVector::new()
//!     .push_back(1)
//!     .push_back(2)
//!     .push_back(3);
//!
//! // Structural sharing: the original vector is preserved
//! let updated = vector.update(0, 100).unwrap();
//! assert_eq!(vector.get(0), Some(&1));
//! assert_eq!(updated.get(0), Some(&100));
//!
//! // Batch edits through a transient
//! let mut transient = updated.transient();
//! transient.push_back(4);
//! transient.update(1, 200).unwrap();
//! let batched = transient.persistent();
//! assert_eq!(format!("{batched}"), "[100 200 3 4]");
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{FromIterator, FusedIterator};
use std::marker::PhantomData;
use std::rc::Rc;

use super::ReferenceCounter;
use super::error::IndexOutOfRange;
use super::node::{BITS_PER_LEVEL, Entry, Mode, Node, Slots};

// =============================================================================
// Trie Engine
// =============================================================================

/// Root, length and height shared by both vector handles.
///
/// All operations take the [`Mode`] of the handle performing them; the
/// handles themselves only decide which mode that is.
#[derive(Clone)]
struct Trie<T> {
    /// Root node, absent when the trie is empty
    root: Option<ReferenceCounter<Node<T>>>,
    /// Total number of elements
    length: usize,
    /// Shift amount for index calculation: (height - 1) * `BITS_PER_LEVEL`
    shift: usize,
}

impl<T> Trie<T> {
    const fn new() -> Self {
        Self {
            root: None,
            length: 0,
            shift: 0,
        }
    }

    #[inline]
    const fn check_index(&self, index: usize) -> Result<(), IndexOutOfRange> {
        if index < self.length {
            Ok(())
        } else {
            Err(IndexOutOfRange {
                index,
                length: self.length,
            })
        }
    }

    fn get(&self, index: usize) -> Option<&T> {
        if index >= self.length {
            return None;
        }
        self.root.as_deref()?.lookup(index, self.shift)
    }

    fn at(&self, index: usize) -> Result<&T, IndexOutOfRange> {
        self.check_index(index)?;
        self.get(index).ok_or(IndexOutOfRange {
            index,
            length: self.length,
        })
    }

    fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.root.as_deref(), self.length)
    }
}

impl<T: Clone> Trie<T> {
    fn update(&mut self, index: usize, element: T, mode: Mode) -> Result<(), IndexOutOfRange> {
        self.check_index(index)?;
        if let Some(root) = self.root.as_mut() {
            Node::update(root, index, element, self.shift, mode);
        }
        Ok(())
    }

    fn push_back(&mut self, element: T, mode: Mode) {
        let index = self.length;
        let Some(root) = self.root.as_mut() else {
            self.root = Some(ReferenceCounter::new(Node::singleton(
                Entry::Value(element),
                mode,
            )));
            self.length = 1;
            return;
        };

        let overflow = Node::append(root, index, element, self.shift, mode);
        if let Some(sibling) = overflow
            && let Some(old_root) = self.root.take()
        {
            self.root = Some(ReferenceCounter::new(Node::grow(old_root, sibling, mode)));
            self.shift += BITS_PER_LEVEL;
            log::debug!(
                "persistent vector grew to height {} at length {}",
                self.shift / BITS_PER_LEVEL + 1,
                index + 1
            );
        }
        self.length += 1;
    }

    /// Freezes every transient node reachable from the root.
    fn freeze(&mut self) -> usize {
        self.root.as_mut().map_or(0, Node::freeze)
    }
}

// =============================================================================
// PersistentVector Definition
// =============================================================================

/// A persistent (immutable) vector based on a 32-way radix trie.
///
/// Every update returns a new vector and leaves the receiver untouched; the
/// two share every node that was not on the path to the changed element.
/// Cloning is O(1).
///
/// # Time Complexity
///
/// | Operation    | Complexity                      |
/// |--------------|---------------------------------|
/// | `new`        | O(1)                            |
/// | `get` / `at` | O(log32 N)                      |
/// | `push_back`  | O(log32 N)                      |
/// | `update`     | O(log32 N)                      |
/// | `len`        | O(1)                            |
/// | `transient`  | O(1)                            |
/// | `iter`       | O(1) to create, O(N) to iterate |
///
/// # Examples
///
/// ```rust
/// use pvector::persistent::PersistentVector;
///
/// let vector: PersistentVector<i32> = (0..100).collect();
/// assert_eq!(vector.len(), 100);
/// assert_eq!(vector.get(50), Some(&50));
/// ```
#[derive(Clone)]
pub struct PersistentVector<T> {
    trie: Trie<T>,
}

impl<T> PersistentVector<T> {
    /// Creates a new empty vector.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pvector::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = PersistentVector::new();
    /// assert!(vector.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { trie: Trie::new() }
    }

    /// Returns the number of elements in the vector.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.trie.length
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.trie.length == 0
    }

    /// Returns a reference to the element at the given index, or `None` if
    /// the index is out of bounds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pvector::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// assert_eq!(vector.get(0), Some(&1));
    /// assert_eq!(vector.get(4), Some(&5));
    /// assert_eq!(vector.get(10), None);
    /// ```
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.trie.get(index)
    }

    /// Returns a reference to the element at the given index.
    ///
    /// # Errors
    ///
    /// Returns [`IndexOutOfRange`] if `index >= self.len()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pvector::persistent::{IndexOutOfRange, PersistentVector};
    ///
    /// let vector = PersistentVector::new().push_back("a");
    /// assert_eq!(vector.at(0), Ok(&"a"));
    /// assert_eq!(vector.at(1), Err(IndexOutOfRange { index: 1, length: 1 }));
    /// ```
    pub fn at(&self, index: usize) -> Result<&T, IndexOutOfRange> {
        self.trie.at(index)
    }

    /// Returns a reference to the first element, or `None` if empty.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a reference to the last element, or `None` if empty.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }

    /// Returns an iterator over references to the elements, front to back.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pvector::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let collected: Vec<&i32> = vector.iter().collect();
    /// assert_eq!(collected, vec![&1, &2, &3, &4, &5]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        self.trie.iter()
    }

    /// Returns the height of the trie: 0 when empty, 1 while every element
    /// fits in a single leaf, and one more for every level above it.
    #[must_use]
    pub const fn height(&self) -> usize {
        if self.trie.root.is_none() {
            0
        } else {
            self.trie.shift / BITS_PER_LEVEL + 1
        }
    }

    /// Converts this vector into a [`TransientVector`] for batch updates.
    ///
    /// No nodes are copied. Nodes the transient writes to are copied once,
    /// tagged as owned by the transient, and edited in place afterwards.
    /// Other clones of this vector never observe those edits.
    ///
    /// # Complexity
    ///
    /// O(1)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pvector::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (0..3).collect();
    /// let mut transient = vector.clone().transient();
    /// transient.update(0, 10).unwrap();
    /// transient.push_back(3);
    ///
    /// let expected: PersistentVector<i32> = [10, 1, 2, 3].into_iter().collect();
    /// assert_eq!(transient.persistent(), expected);
    /// assert_eq!(vector.get(0), Some(&0));
    /// ```
    #[must_use]
    pub fn transient(self) -> TransientVector<T> {
        log::trace!("converting vector of length {} to transient", self.len());
        TransientVector {
            trie: self.trie,
            _marker: PhantomData,
        }
    }
}

impl<T: Clone> PersistentVector<T> {
    /// Creates a vector containing a single element.
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self::new().push_back(element)
    }

    /// Appends an element to the back of the vector.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pvector::persistent::PersistentVector;
    ///
    /// let vector = PersistentVector::new().push_back(1);
    /// let extended = vector.push_back(2);
    ///
    /// assert_eq!(vector.len(), 1);
    /// assert_eq!(extended.len(), 2);
    /// assert_eq!(extended.get(1), Some(&2));
    /// ```
    #[must_use]
    pub fn push_back(&self, element: T) -> Self {
        let mut trie = self.trie.clone();
        trie.push_back(element, Mode::Persistent);
        Self { trie }
    }

    /// Returns a new vector with the element at `index` replaced.
    ///
    /// # Errors
    ///
    /// Returns [`IndexOutOfRange`] if `index >= self.len()`; nothing is
    /// copied in that case.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pvector::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let updated = vector.update(2, 100).unwrap();
    ///
    /// assert_eq!(updated.get(2), Some(&100));
    /// assert_eq!(vector.get(2), Some(&3)); // Original unchanged
    /// assert!(vector.update(5, 0).is_err());
    /// ```
    pub fn update(&self, index: usize, element: T) -> Result<Self, IndexOutOfRange> {
        self.trie.check_index(index)?;
        let mut trie = self.trie.clone();
        trie.update(index, element, Mode::Persistent)?;
        Ok(Self { trie })
    }
}

// =============================================================================
// TransientVector Definition
// =============================================================================

/// A transient (temporarily mutable) vector for efficient batch updates.
///
/// A `TransientVector` edits the nodes it owns in place instead of copying
/// them on every write. It is obtained from [`PersistentVector::transient`]
/// or [`TransientVector::new`] and turned back into a shareable vector with
/// [`persistent()`](Self::persistent).
///
/// # Design
///
/// - Not `Clone`: there is exactly one writer for the nodes it owns
/// - `PhantomData<Rc<()>>` ensures `!Send` and `!Sync`
/// - `persistent()` consumes the transient, so no alias can write to the
///   frozen nodes afterwards
///
/// # Examples
///
/// ```rust
/// use pvector::persistent::TransientVector;
///
/// let mut transient = TransientVector::new();
/// for index in 0..100 {
///     transient.push_back(index);
/// }
/// transient.update(0, -1).unwrap();
///
/// let vector = transient.persistent();
/// assert_eq!(vector.len(), 100);
/// assert_eq!(vector.get(0), Some(&-1));
/// ```
pub struct TransientVector<T> {
    trie: Trie<T>,
    /// Marker to ensure `!Send` and `!Sync`.
    _marker: PhantomData<Rc<()>>,
}

// Static assertions to verify TransientVector is not Send/Sync
static_assertions::assert_not_impl_any!(TransientVector<i32>: Send, Sync, Clone);
static_assertions::assert_not_impl_any!(TransientVector<String>: Send, Sync, Clone);

// Arc feature verification: even with Arc, TransientVector remains !Send/!Sync
#[cfg(feature = "arc")]
mod arc_send_sync_verification_vector {
    use super::{PersistentVector, TransientVector};
    use std::sync::Arc;

    static_assertions::assert_not_impl_any!(TransientVector<Arc<i32>>: Send, Sync);
    static_assertions::assert_impl_all!(PersistentVector<i32>: Send, Sync);
}

impl<T> TransientVector<T> {
    /// Creates a new empty transient vector.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            trie: Trie::new(),
            _marker: PhantomData,
        }
    }

    /// Returns the number of elements in the vector.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.trie.length
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.trie.length == 0
    }

    /// Returns a reference to the element at the given index, or `None` if
    /// the index is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.trie.get(index)
    }

    /// Returns a reference to the element at the given index.
    ///
    /// # Errors
    ///
    /// Returns [`IndexOutOfRange`] if `index >= self.len()`.
    pub fn at(&self, index: usize) -> Result<&T, IndexOutOfRange> {
        self.trie.at(index)
    }

    /// Returns an iterator over references to the elements, front to back.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        self.trie.iter()
    }
}

impl<T: Clone> TransientVector<T> {
    /// Appends an element to the back of the vector in place.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pvector::persistent::TransientVector;
    ///
    /// let mut transient = TransientVector::new();
    /// transient.push_back(1);
    /// transient.push_back(2);
    /// assert_eq!(transient.len(), 2);
    /// ```
    pub fn push_back(&mut self, element: T) {
        self.trie.push_back(element, Mode::Transient);
    }

    /// Replaces the element at `index` in place.
    ///
    /// # Errors
    ///
    /// Returns [`IndexOutOfRange`] if `index >= self.len()`; the vector is
    /// left untouched in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pvector::persistent::TransientVector;
    ///
    /// let mut transient: TransientVector<i32> = (0..3).collect();
    /// transient.update(1, 10).unwrap();
    /// assert_eq!(transient.get(1), Some(&10));
    /// assert!(transient.update(3, 0).is_err());
    /// ```
    pub fn update(&mut self, index: usize, element: T) -> Result<(), IndexOutOfRange> {
        self.trie.update(index, element, Mode::Transient)
    }

    /// Converts this transient vector back into a persistent one.
    ///
    /// Every node written while transient is tagged persistent again, after
    /// which the result can be cloned and shared freely.
    ///
    /// # Complexity
    ///
    /// O(k) where k is the number of nodes written while transient.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pvector::persistent::TransientVector;
    ///
    /// let mut transient = TransientVector::new();
    /// transient.push_back(1);
    /// let vector = transient.persistent();
    /// let shared = vector.clone();
    ///
    /// let updated = vector.update(0, 2).unwrap();
    /// assert_eq!(shared.get(0), Some(&1));
    /// assert_eq!(updated.get(0), Some(&2));
    /// ```
    #[must_use]
    pub fn persistent(mut self) -> PersistentVector<T> {
        let frozen = self.trie.freeze();
        debug_assert!(
            self.trie
                .root
                .as_ref()
                .is_none_or(|root| root.mode() == Mode::Persistent)
        );
        log::trace!(
            "froze {} nodes converting vector of length {} to persistent",
            frozen,
            self.len()
        );
        PersistentVector { trie: self.trie }
    }
}

impl<T> Default for TransientVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Extend<T> for TransientVector<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.push_back(element);
        }
    }
}

impl<T: Clone> FromIterator<T> for TransientVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut transient = Self::new();
        transient.extend(iter);
        transient
    }
}

impl<T: Clone> From<TransientVector<T>> for PersistentVector<T> {
    fn from(transient: TransientVector<T>) -> Self {
        transient.persistent()
    }
}

impl<T: fmt::Debug> fmt::Debug for TransientVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

// =============================================================================
// Iterator
// =============================================================================

/// An iterator over references to the elements of a vector.
///
/// Walks the trie depth-first with one child iterator per level, visiting
/// every node exactly once.
pub struct Iter<'a, T> {
    /// Remaining children at each branch level above the current leaf
    stack: Vec<std::slice::Iter<'a, ReferenceCounter<Node<T>>>>,
    /// Remaining values in the current leaf
    leaf: std::slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    fn new(root: Option<&'a Node<T>>, length: usize) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            leaf: std::slice::Iter::default(),
            remaining: length,
        };
        if let Some(root) = root {
            iter.descend(root);
        }
        iter
    }

    /// Follows the leftmost path below `node`, stacking the siblings skipped
    /// on the way.
    fn descend(&mut self, mut node: &'a Node<T>) {
        loop {
            match node.slots() {
                Slots::Leaf(values) => {
                    self.leaf = values.iter();
                    return;
                }
                Slots::Branch(children) => {
                    let mut children = children.iter();
                    let Some(first) = children.next() else {
                        return;
                    };
                    self.stack.push(children);
                    node = first.as_ref();
                }
            }
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(element) = self.leaf.next() {
                self.remaining = self.remaining.saturating_sub(1);
                return Some(element);
            }

            let next_child = loop {
                let siblings = self.stack.last_mut()?;
                match siblings.next() {
                    Some(child) => break child,
                    None => {
                        self.stack.pop();
                    }
                }
            };
            self.descend(next_child);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for PersistentVector<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> FromIterator<T> for PersistentVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().collect::<TransientVector<T>>().persistent()
    }
}

impl<'a, T> IntoIterator for &'a PersistentVector<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a TransientVector<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for PersistentVector<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let same_root = match (&self.trie.root, &other.trie.root) {
            (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        };
        same_root || self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for PersistentVector<T> {}

/// Hashes the length, then each element in order, so equal vectors hash
/// equally regardless of how their tries were built.
impl<T: Hash> Hash for PersistentVector<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

/// Formats the elements space-separated in brackets: `[0 1 2]`, or `[]`
/// when empty.
impl<T: fmt::Display> fmt::Display for PersistentVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        for (position, element) in self.iter().enumerate() {
            if position > 0 {
                write!(formatter, " ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for PersistentVector<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentVectorVisitor<T> {
    marker: PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for PersistentVectorVisitor<T>
where
    T: serde::Deserialize<'de> + Clone,
{
    type Value = PersistentVector<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut transient = TransientVector::new();
        while let Some(element) = seq.next_element()? {
            transient.push_back(element);
        }
        Ok(transient.persistent())
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for PersistentVector<T>
where
    T: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(PersistentVectorVisitor {
            marker: PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
