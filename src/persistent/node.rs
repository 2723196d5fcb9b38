//! Trie nodes backing [`PersistentVector`](super::PersistentVector) and
//! [`TransientVector`](super::TransientVector).
//!
//! Every node has room for [`BRANCHING_FACTOR`] entries. Nodes at the bottom of
//! the trie (`shift == 0`) store values, every other node stores references to
//! the next level down. Entries always occupy a dense prefix of the node, which
//! `ArrayVec` gives us for free: its length is the occupied count.
//!
//! # Copy-on-write
//!
//! Each node carries a [`Mode`] tag. A node tagged [`Mode::Transient`] was
//! created by the transient handle that currently owns it and may be edited in
//! place by that handle. A node tagged [`Mode::Persistent`] may be referenced by
//! any number of vectors and is never edited; writers copy it first.
//! [`Node::clone_for_write`] is the only place this rule is decided.

use arrayvec::ArrayVec;

use super::ReferenceCounter;

// =============================================================================
// Constants
// =============================================================================

/// Bits of the index consumed per trie level.
pub(crate) const BITS_PER_LEVEL: usize = 5;

/// Branching factor (2^5 = 32)
pub(crate) const BRANCHING_FACTOR: usize = 1 << BITS_PER_LEVEL;

/// Bit mask for extracting the slot within a node
pub(crate) const MASK: usize = BRANCHING_FACTOR - 1;

// =============================================================================
// Node Definition
// =============================================================================

/// Mutation mode of a node (and of the operation touching it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Shared, read-only. Writers must copy.
    Persistent,
    /// Owned by a single transient handle and editable in place.
    Transient,
}

impl Mode {
    #[inline]
    pub(crate) const fn is_transient(self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Occupied slots of a node. The form is fixed by the node's depth.
#[derive(Clone)]
pub(crate) enum Slots<T> {
    /// Bottom level: stored values.
    Leaf(ArrayVec<T, BRANCHING_FACTOR>),
    /// Interior level: child nodes one level down.
    Branch(ArrayVec<ReferenceCounter<Node<T>>, BRANCHING_FACTOR>),
}

/// Something that can be appended into a node: a value for leaves, a child
/// for branches.
pub(crate) enum Entry<T> {
    Value(T),
    Child(ReferenceCounter<Node<T>>),
}

/// A single trie level holding up to [`BRANCHING_FACTOR`] entries.
#[derive(Clone)]
pub(crate) struct Node<T> {
    mode: Mode,
    slots: Slots<T>,
}

impl<T> Node<T> {
    /// Creates a node whose sole occupant is `entry`.
    pub(crate) fn singleton(entry: Entry<T>, mode: Mode) -> Self {
        let slots = match entry {
            Entry::Value(value) => {
                let mut values = ArrayVec::new();
                values.push(value);
                Slots::Leaf(values)
            }
            Entry::Child(child) => {
                let mut children = ArrayVec::new();
                children.push(child);
                Slots::Branch(children)
            }
        };
        Self { mode, slots }
    }

    /// Creates the root of a trie one level taller than `left`.
    pub(crate) fn grow(
        left: ReferenceCounter<Self>,
        right: ReferenceCounter<Self>,
        mode: Mode,
    ) -> Self {
        let mut children = ArrayVec::new();
        children.push(left);
        children.push(right);
        Self {
            mode,
            slots: Slots::Branch(children),
        }
    }

    /// Builds a chain of single-child nodes from `shift` down to a leaf
    /// holding `value`.
    fn new_path(value: T, shift: usize, mode: Mode) -> Self {
        let mut node = Self::singleton(Entry::Value(value), mode);
        let mut level = 0;
        while level < shift {
            node = Self::singleton(Entry::Child(ReferenceCounter::new(node)), mode);
            level += BITS_PER_LEVEL;
        }
        node
    }

    #[inline]
    pub(crate) const fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub(crate) const fn slots(&self) -> &Slots<T> {
        &self.slots
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        match &self.slots {
            Slots::Leaf(values) => values.len(),
            Slots::Branch(children) => children.len(),
        }
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len() == BRANCHING_FACTOR
    }

    /// Returns the value at the global `index`, where this node sits `shift`
    /// bits above the leaves.
    ///
    /// The caller is responsible for bounds checking against the vector
    /// length; a slot that does not exist yields `None`.
    pub(crate) fn lookup(&self, index: usize, shift: usize) -> Option<&T> {
        let mut node = self;
        let mut shift = shift;
        loop {
            match &node.slots {
                Slots::Leaf(values) => return values.get(index & MASK),
                Slots::Branch(children) => {
                    node = children.get((index >> shift) & MASK)?.as_ref();
                    shift = shift.checked_sub(BITS_PER_LEVEL)?;
                }
            }
        }
    }
}

impl<T: Clone> Node<T> {
    /// Returns a node the caller may write to, in the requested `mode`.
    ///
    /// A transient node is handed back as is when the operation is transient.
    /// In every other case `node` is replaced by a copy of itself (all slots
    /// and the occupied count) tagged with `mode`.
    pub(crate) fn clone_for_write(node: &mut ReferenceCounter<Self>, mode: Mode) -> &mut Self {
        if !(mode.is_transient() && node.mode.is_transient()) {
            *node = ReferenceCounter::new(Self {
                mode,
                slots: node.slots.clone(),
            });
        }
        ReferenceCounter::make_mut(node)
    }

    /// Replaces the value at `index` with `value`.
    ///
    /// Every node on the path to `index` goes through
    /// [`clone_for_write`](Self::clone_for_write); the rest of the trie is
    /// shared unchanged.
    pub(crate) fn update(
        node: &mut ReferenceCounter<Self>,
        index: usize,
        value: T,
        shift: usize,
        mode: Mode,
    ) {
        match &mut Self::clone_for_write(node, mode).slots {
            Slots::Leaf(values) => {
                if let Some(slot) = values.get_mut(index & MASK) {
                    *slot = value;
                }
            }
            Slots::Branch(children) => {
                if let Some(child) = children.get_mut((index >> shift) & MASK) {
                    Self::update(
                        child,
                        index,
                        value,
                        shift.saturating_sub(BITS_PER_LEVEL),
                        mode,
                    );
                }
            }
        }
    }

    /// Appends `value`, which will live at global position `index`, to the
    /// right edge of this subtree.
    ///
    /// Returns `Some(sibling)` when the subtree was already at capacity. In
    /// that case `node` is left untouched and `sibling` is a new node of the
    /// same depth holding only `value`; the caller must place it.
    pub(crate) fn append(
        node: &mut ReferenceCounter<Self>,
        index: usize,
        value: T,
        shift: usize,
        mode: Mode,
    ) -> Option<ReferenceCounter<Self>> {
        if shift == 0 {
            return Self::append_child(node, Entry::Value(value), mode);
        }

        let child_shift = shift - BITS_PER_LEVEL;
        // A child holds `1 << shift` values, so the last child is full exactly
        // when `index` is a multiple of that.
        if index & ((1 << shift) - 1) == 0 {
            let sibling = ReferenceCounter::new(Self::new_path(value, child_shift, mode));
            return Self::append_child(node, Entry::Child(sibling), mode);
        }

        if let Slots::Branch(children) = &mut Self::clone_for_write(node, mode).slots
            && let Some(last) = children.last_mut()
        {
            let overflow = Self::append(last, index, value, child_shift, mode);
            debug_assert!(overflow.is_none(), "last child overflowed below a split point");
        }
        None
    }

    /// Appends `entry` after the occupied slots.
    ///
    /// When the node is full, a brand-new node holding only `entry` is
    /// returned instead and `node` is left untouched.
    pub(crate) fn append_child(
        node: &mut ReferenceCounter<Self>,
        entry: Entry<T>,
        mode: Mode,
    ) -> Option<ReferenceCounter<Self>> {
        if node.is_full() {
            return Some(ReferenceCounter::new(Self::singleton(entry, mode)));
        }

        match (&mut Self::clone_for_write(node, mode).slots, entry) {
            (Slots::Leaf(values), Entry::Value(value)) => values.push(value),
            (Slots::Branch(children), Entry::Child(child)) => children.push(child),
            _ => unreachable!("entry kind does not match the node's depth"),
        }
        None
    }

    /// Tags this node and every transient node below it as persistent.
    ///
    /// Persistent nodes are skipped together with their subtrees, so calling
    /// this again is a no-op. Returns the number of nodes that were frozen.
    pub(crate) fn freeze(node: &mut ReferenceCounter<Self>) -> usize {
        if !node.mode.is_transient() {
            return 0;
        }

        let node = ReferenceCounter::make_mut(node);
        node.mode = Mode::Persistent;
        match &mut node.slots {
            Slots::Leaf(_) => 1,
            Slots::Branch(children) => 1 + children.iter_mut().map(Self::freeze).sum::<usize>(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn leaf_of(values: impl IntoIterator<Item = i32>, mode: Mode) -> ReferenceCounter<Node<i32>> {
        let mut iter = values.into_iter();
        let first = iter.next().expect("leaf needs at least one value");
        let mut node = ReferenceCounter::new(Node::singleton(Entry::Value(first), mode));
        for value in iter {
            assert!(Node::append_child(&mut node, Entry::Value(value), mode).is_none());
        }
        node
    }

    #[rstest]
    #[case(Mode::Persistent, Mode::Persistent, false)]
    #[case(Mode::Persistent, Mode::Transient, false)]
    #[case(Mode::Transient, Mode::Persistent, false)]
    #[case(Mode::Transient, Mode::Transient, true)]
    fn test_clone_for_write_reuses_only_transient_nodes(
        #[case] node_mode: Mode,
        #[case] write_mode: Mode,
        #[case] reused: bool,
    ) {
        let mut node = leaf_of(0..4, node_mode);
        let before = ReferenceCounter::as_ptr(&node);

        let written = Node::clone_for_write(&mut node, write_mode);
        assert_eq!(written.mode(), write_mode);
        assert_eq!(written.len(), 4);

        assert_eq!(std::ptr::eq(before, ReferenceCounter::as_ptr(&node)), reused);
    }

    #[rstest]
    fn test_clone_for_write_leaves_shared_original_intact() {
        let original = leaf_of(0..3, Mode::Persistent);
        let mut copy = ReferenceCounter::clone(&original);

        Node::update(&mut copy, 1, 100, 0, Mode::Persistent);

        assert_eq!(original.lookup(1, 0), Some(&1));
        assert_eq!(copy.lookup(1, 0), Some(&100));
        assert!(!ReferenceCounter::ptr_eq(&original, &copy));
    }

    #[rstest]
    fn test_append_child_on_full_node_returns_new_sibling() {
        let mut node = leaf_of(0..32, Mode::Persistent);
        let before = ReferenceCounter::clone(&node);

        let sibling = Node::append_child(&mut node, Entry::Value(32), Mode::Persistent)
            .expect("full leaf must overflow");

        assert!(ReferenceCounter::ptr_eq(&node, &before));
        assert_eq!(sibling.len(), 1);
        assert_eq!(sibling.lookup(32, 0), Some(&32));
    }

    #[rstest]
    #[case(Mode::Persistent)]
    #[case(Mode::Transient)]
    fn test_overflow_nodes_inherit_operation_mode(#[case] mode: Mode) {
        let mut node = leaf_of(0..32, Mode::Persistent);
        let sibling = Node::append(&mut node, 32, 32, 0, mode).expect("full leaf must overflow");
        assert_eq!(sibling.mode(), mode);
    }

    #[rstest]
    fn test_append_opens_new_child_at_capacity_boundary() {
        let left = leaf_of(0..32, Mode::Persistent);
        let right = ReferenceCounter::new(Node::singleton(Entry::Value(32), Mode::Persistent));
        let mut root = ReferenceCounter::new(Node::grow(left, right, Mode::Persistent));

        for index in 33..64 {
            assert!(Node::append(&mut root, index, index as i32, BITS_PER_LEVEL, Mode::Persistent).is_none());
        }
        assert_eq!(root.len(), 2);

        assert!(Node::append(&mut root, 64, 64, BITS_PER_LEVEL, Mode::Persistent).is_none());
        assert_eq!(root.len(), 3);
        assert_eq!(root.lookup(64, BITS_PER_LEVEL), Some(&64));
        assert_eq!(root.lookup(63, BITS_PER_LEVEL), Some(&63));
    }

    #[rstest]
    fn test_new_path_builds_single_child_chain() {
        let path = Node::new_path(7, 2 * BITS_PER_LEVEL, Mode::Persistent);
        assert_eq!(path.len(), 1);
        assert_eq!(path.lookup(0, 2 * BITS_PER_LEVEL), Some(&7));
    }

    #[rstest]
    fn test_lookup_missing_slot_returns_none() {
        let leaf = leaf_of(0..3, Mode::Persistent);
        assert_eq!(leaf.lookup(5, 0), None);
    }

    #[rstest]
    fn test_freeze_clears_transient_tags_recursively() {
        let left = leaf_of(0..32, Mode::Transient);
        let right = leaf_of([32], Mode::Transient);
        let mut root = ReferenceCounter::new(Node::grow(left, right, Mode::Transient));

        assert_eq!(Node::freeze(&mut root), 3);
        assert_eq!(root.mode(), Mode::Persistent);
        let Slots::Branch(children) = root.slots() else {
            panic!("root must be a branch");
        };
        assert!(children.iter().all(|child| child.mode() == Mode::Persistent));
    }

    #[rstest]
    fn test_freeze_is_idempotent_and_stops_at_persistent_nodes() {
        let shared = leaf_of(0..32, Mode::Persistent);
        let fresh = leaf_of([32], Mode::Transient);
        let mut root = ReferenceCounter::new(Node::grow(
            ReferenceCounter::clone(&shared),
            fresh,
            Mode::Transient,
        ));

        assert_eq!(Node::freeze(&mut root), 2);
        assert_eq!(Node::freeze(&mut root), 0);

        let Slots::Branch(children) = root.slots() else {
            panic!("root must be a branch");
        };
        assert!(ReferenceCounter::ptr_eq(&children[0], &shared));
    }
}
