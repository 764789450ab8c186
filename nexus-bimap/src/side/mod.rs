//! Side indices: the keyed projections over the relation set.
//!
//! Each side of a map is one of five kinds, picked at construction:
//!
//! | Kind | Structure | Lookup | Iteration order |
//! |------|-----------|--------|-----------------|
//! | unique-ordered | skip list | O(log n) | ascending key |
//! | multi-ordered | skip list | O(log n) | ascending key, ties by insertion |
//! | unique-hashed | hash table | O(1) | unspecified across keys |
//! | multi-hashed | hash table of groups | O(1) | equal keys adjacent, by insertion |
//! | sequenced | linked list | O(n) scan | insertion order, relocatable |
//!
//! None of them store keys. Nodes are addressed by the relation's slot and
//! keys are read back out of the relation set through [`KeyAccess`], so a
//! relation's position in any index is found from its slot in O(1).

mod hashed;
mod ordered;
mod sequenced;

use core::cmp::Ordering;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;

pub use hashed::HashedIndex;
pub use ordered::OrderedIndex;
pub use sequenced::SequencedIndex;

use crate::index::{Index, NIL, Slot};
use crate::set::RelationSet;
use crate::tag::Side;

// =============================================================================
// Configuration
// =============================================================================

/// The five index kinds a side can be configured as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideKind {
    /// Sorted by key, at most one relation per key.
    UniqueOrdered,
    /// Sorted by key, any number of relations per key.
    MultiOrdered,
    /// Hashed, at most one relation per key.
    UniqueHashed,
    /// Hashed, any number of relations per key.
    MultiHashed,
    /// Insertion-ordered list, duplicates allowed.
    Sequenced,
}

impl SideKind {
    /// Returns `true` if the kind forbids duplicate keys.
    #[inline]
    pub const fn is_unique(self) -> bool {
        matches!(self, Self::UniqueOrdered | Self::UniqueHashed)
    }

    /// Returns `true` for the key-sorted kinds.
    #[inline]
    pub const fn is_ordered(self) -> bool {
        matches!(self, Self::UniqueOrdered | Self::MultiOrdered)
    }

    /// Returns `true` for the hashed kinds.
    #[inline]
    pub const fn is_hashed(self) -> bool {
        matches!(self, Self::UniqueHashed | Self::MultiHashed)
    }

    /// Returns `true` for the insertion-ordered list.
    #[inline]
    pub const fn is_sequenced(self) -> bool {
        matches!(self, Self::Sequenced)
    }
}

impl fmt::Display for SideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UniqueOrdered => "unique-ordered",
            Self::MultiOrdered => "multi-ordered",
            Self::UniqueHashed => "unique-hashed",
            Self::MultiHashed => "multi-hashed",
            Self::Sequenced => "sequenced",
        })
    }
}

/// Strict weak ordering over keys for the ordered kinds.
///
/// Implemented for any `Fn(&K, &K) -> Ordering`.
///
/// # Example
///
/// ```
/// use nexus_bimap::{BiMap, SideConfig};
///
/// // Case-insensitive left side.
/// let left = SideConfig::ordered_by(true, |a: &String, b: &String| {
///     a.to_lowercase().cmp(&b.to_lowercase())
/// });
/// let mut map: BiMap<String, u32> = BiMap::new(left, SideConfig::unique_ordered());
///
/// map.insert("Alice".into(), 1).unwrap();
/// assert!(map.insert("ALICE".into(), 2).is_err());
/// ```
pub trait Comparator<K> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

impl<K, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalOrder;

impl<K: Ord> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Hash function paired with the equality it must agree with.
///
/// Keys that compare equal must hash equally. Collisions only cost time.
pub trait KeyHasher<K> {
    fn hash_key(&self, key: &K) -> u64;

    fn eq_keys(&self, a: &K, b: &K) -> bool;
}

/// [`KeyHasher`] built from a [`BuildHasher`] and the key's own `Hash + Eq`.
#[derive(Debug, Clone, Default)]
pub struct HashWith<S>(pub S);

impl<K: Hash + Eq, S: BuildHasher> KeyHasher<K> for HashWith<S> {
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self.0.hash_one(key)
    }

    #[inline]
    fn eq_keys(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

type BoxedComparator<K> = Box<dyn Comparator<K> + Send + Sync>;
type BoxedHasher<K> = Box<dyn KeyHasher<K> + Send + Sync>;
type BoxedEq<K> = Box<dyn Fn(&K, &K) -> bool + Send + Sync>;

enum Strategy<K> {
    Ordered(BoxedComparator<K>),
    Hashed(BoxedHasher<K>),
    Sequenced(BoxedEq<K>),
}

/// Configuration of one side of a map: its kind plus the comparator, hasher
/// or equality it needs.
///
/// # Example
///
/// ```
/// use nexus_bimap::{SideConfig, SideKind};
///
/// let left: SideConfig<String> = SideConfig::unique_ordered();
/// let right: SideConfig<u64> = SideConfig::multi_hashed();
///
/// assert_eq!(left.kind(), SideKind::UniqueOrdered);
/// assert_eq!(right.kind(), SideKind::MultiHashed);
/// ```
pub struct SideConfig<K> {
    kind: SideKind,
    strategy: Strategy<K>,
}

impl<K> fmt::Debug for SideConfig<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SideConfig")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<K> SideConfig<K> {
    /// Returns the configured kind.
    #[inline]
    pub fn kind(&self) -> SideKind {
        self.kind
    }

    /// Ordered side using a custom comparator.
    pub fn ordered_by<C>(unique: bool, comparator: C) -> Self
    where
        C: Comparator<K> + Send + Sync + 'static,
    {
        Self {
            kind: if unique {
                SideKind::UniqueOrdered
            } else {
                SideKind::MultiOrdered
            },
            strategy: Strategy::Ordered(Box::new(comparator)),
        }
    }

    /// Hashed side using a custom hash + equality pair.
    pub fn hashed_by<H>(unique: bool, hasher: H) -> Self
    where
        H: KeyHasher<K> + Send + Sync + 'static,
    {
        Self {
            kind: if unique {
                SideKind::UniqueHashed
            } else {
                SideKind::MultiHashed
            },
            strategy: Strategy::Hashed(Box::new(hasher)),
        }
    }

    /// Sequenced side whose `find` uses a custom equality.
    pub fn sequenced_by<F>(eq: F) -> Self
    where
        F: Fn(&K, &K) -> bool + Send + Sync + 'static,
    {
        Self {
            kind: SideKind::Sequenced,
            strategy: Strategy::Sequenced(Box::new(eq)),
        }
    }
}

impl<K: Ord> SideConfig<K> {
    /// Sorted by `Ord`, one relation per key.
    pub fn unique_ordered() -> Self {
        Self::ordered_by(true, NaturalOrder)
    }

    /// Sorted by `Ord`, any number of relations per key.
    pub fn multi_ordered() -> Self {
        Self::ordered_by(false, NaturalOrder)
    }
}

impl<K: Hash + Eq> SideConfig<K> {
    /// Hashed with the default hasher, one relation per key.
    pub fn unique_hashed() -> Self {
        Self::hashed_with(true, hashbrown::DefaultHashBuilder::default())
    }

    /// Hashed with the default hasher, any number of relations per key.
    pub fn multi_hashed() -> Self {
        Self::hashed_with(false, hashbrown::DefaultHashBuilder::default())
    }

    /// Hashed with a caller-chosen [`BuildHasher`].
    pub fn hashed_with<S>(unique: bool, build_hasher: S) -> Self
    where
        S: BuildHasher + Send + Sync + 'static,
    {
        Self::hashed_by(unique, HashWith(build_hasher))
    }
}

impl<K: PartialEq + 'static> SideConfig<K> {
    /// Insertion-ordered list; `find` compares with `PartialEq`.
    pub fn sequenced() -> Self {
        Self::sequenced_by(|a: &K, b: &K| a == b)
    }
}

// =============================================================================
// Shared index contract
// =============================================================================

/// Reads the key stored for a slot.
///
/// Indices never own keys; they borrow them from the relation set through
/// this trait whenever they need to compare or hash.
pub trait KeyAccess<K> {
    fn key(&self, slot: u32) -> &K;
}

/// A run of slots in an index's iteration order, `front` inclusive and `end`
/// exclusive (`NIL` = through the last slot).
///
/// `scan` spans are not exact: every slot must be re-checked against the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub(crate) front: Slot,
    pub(crate) end: Slot,
    pub(crate) scan: bool,
}

impl Span {
    pub(crate) const EMPTY: Self = Self {
        front: NIL,
        end: NIL,
        scan: false,
    };

    #[inline]
    pub(crate) const fn exact(front: Slot, end: Slot) -> Self {
        Self {
            front,
            end,
            scan: false,
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.front == self.end
    }
}

/// Operations every index kind provides.
///
/// `insert_ref` never mutates on failure; it reports the slot already
/// holding the key.
pub(crate) trait IndexOps<K> {
    fn kind(&self) -> SideKind;

    fn len(&self) -> usize;

    fn contains(&self, slot: Slot) -> bool;

    /// Probes whether `key` could be linked, ignoring the relation at
    /// `exclude` (`NIL` to ignore none).
    fn check_insert<A: KeyAccess<K>>(&self, keys: &A, key: &K, exclude: Slot) -> Result<(), Slot>;

    fn insert_ref<A: KeyAccess<K>>(&mut self, keys: &A, slot: Slot) -> Result<(), Slot>;

    /// Unlinks `slot`. Its key must still be readable through `keys`.
    fn erase_ref<A: KeyAccess<K>>(&mut self, keys: &A, slot: Slot);

    fn find<A: KeyAccess<K>>(&self, keys: &A, key: &K) -> Span;

    fn first(&self) -> Slot;

    fn last(&self) -> Slot;

    fn next(&self, slot: Slot) -> Slot;

    fn prev(&self, slot: Slot) -> Slot;

    fn clear(&mut self);

    /// Checks the structure's internal invariants against the live slots.
    fn validate<A: KeyAccess<K>>(&self, keys: &A) -> bool;
}

// =============================================================================
// SideIndex - closed set of kinds
// =============================================================================

/// One side's index, dispatching to the structure for its kind.
pub enum SideIndex<K> {
    Ordered(OrderedIndex<K>),
    Hashed(HashedIndex<K>),
    Sequenced(SequencedIndex<K>),
}

macro_rules! dispatch {
    ($self:expr, $index:ident => $body:expr) => {
        match $self {
            SideIndex::Ordered($index) => $body,
            SideIndex::Hashed($index) => $body,
            SideIndex::Sequenced($index) => $body,
        }
    };
}

impl<K> fmt::Debug for SideIndex<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SideIndex");
        s.field("kind", &self.kind()).field("len", &self.len());
        if let Self::Hashed(index) = self {
            s.field("distinct", &index.distinct());
        }
        s.finish()
    }
}

impl<K> SideIndex<K> {
    pub(crate) fn new(config: SideConfig<K>, capacity: usize, seed: u64) -> Self {
        let unique = config.kind.is_unique();
        match config.strategy {
            Strategy::Ordered(cmp) => {
                Self::Ordered(OrderedIndex::new(cmp, unique, capacity, seed))
            }
            Strategy::Hashed(hasher) => Self::Hashed(HashedIndex::new(hasher, unique, capacity)),
            Strategy::Sequenced(eq) => Self::Sequenced(SequencedIndex::new(eq, capacity)),
        }
    }

    #[inline]
    pub(crate) fn kind(&self) -> SideKind {
        dispatch!(self, index => index.kind())
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        dispatch!(self, index => index.len())
    }

    #[inline]
    pub(crate) fn contains(&self, slot: Slot) -> bool {
        dispatch!(self, index => index.contains(slot))
    }

    #[inline]
    pub(crate) fn check_insert<A: KeyAccess<K>>(
        &self,
        keys: &A,
        key: &K,
        exclude: Slot,
    ) -> Result<(), Slot> {
        dispatch!(self, index => index.check_insert(keys, key, exclude))
    }

    #[inline]
    pub(crate) fn insert_ref<A: KeyAccess<K>>(&mut self, keys: &A, slot: Slot) -> Result<(), Slot> {
        dispatch!(self, index => index.insert_ref(keys, slot))
    }

    #[inline]
    pub(crate) fn erase_ref<A: KeyAccess<K>>(&mut self, keys: &A, slot: Slot) {
        dispatch!(self, index => index.erase_ref(keys, slot))
    }

    /// First half of changing a linked slot's key: call with the old key
    /// readable, then [`rekey_end`](Self::rekey_end) with the new one.
    ///
    /// Keyed kinds move the relation; the sequenced kind keeps its position.
    #[inline]
    pub(crate) fn rekey_begin<A: KeyAccess<K>>(&mut self, keys: &A, slot: Slot) {
        match self {
            Self::Sequenced(_) => {}
            _ => self.erase_ref(keys, slot),
        }
    }

    /// # Panics
    ///
    /// Panics if the new key conflicts; callers probe with
    /// [`check_insert`](Self::check_insert) first.
    #[inline]
    pub(crate) fn rekey_end<A: KeyAccess<K>>(&mut self, keys: &A, slot: Slot) {
        match self {
            Self::Sequenced(_) => {}
            _ => self
                .insert_ref(keys, slot)
                .expect("uniqueness checked before relinking"),
        }
    }

    #[inline]
    pub(crate) fn find<A: KeyAccess<K>>(&self, keys: &A, key: &K) -> Span {
        dispatch!(self, index => index.find(keys, key))
    }

    /// Returns `true` if `slot` belongs in the result of `find(key)`.
    #[inline]
    pub(crate) fn matches<A: KeyAccess<K>>(&self, keys: &A, key: &K, slot: Slot) -> bool {
        match self {
            Self::Sequenced(index) => index.key_eq(keys.key(slot), key),
            _ => true,
        }
    }

    #[inline]
    pub(crate) fn first(&self) -> Slot {
        dispatch!(self, index => index.first())
    }

    #[inline]
    pub(crate) fn last(&self) -> Slot {
        dispatch!(self, index => index.last())
    }

    #[inline]
    pub(crate) fn next(&self, slot: Slot) -> Slot {
        dispatch!(self, index => index.next(slot))
    }

    #[inline]
    pub(crate) fn prev(&self, slot: Slot) -> Slot {
        dispatch!(self, index => index.prev(slot))
    }

    pub(crate) fn clear(&mut self) {
        dispatch!(self, index => index.clear())
    }

    pub(crate) fn validate<A: KeyAccess<K>>(&self, keys: &A) -> bool {
        dispatch!(self, index => index.validate(keys))
    }

    #[inline]
    pub(crate) fn as_ordered(&self) -> Option<&OrderedIndex<K>> {
        match self {
            Self::Ordered(index) => Some(index),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn as_sequenced_mut(&mut self) -> Option<&mut SequencedIndex<K>> {
        match self {
            Self::Sequenced(index) => Some(index),
            _ => None,
        }
    }
}

/// Both side indices of a map.
#[derive(Debug)]
pub struct Indices<L, R> {
    pub(crate) left: SideIndex<L>,
    pub(crate) right: SideIndex<R>,
}

/// [`KeyAccess`] reading side `S`'s key out of a relation set.
pub(crate) struct SideKeys<'a, L, R, P, S> {
    set: &'a RelationSet<L, R, P>,
    _side: PhantomData<S>,
}

impl<'a, L, R, P, S> SideKeys<'a, L, R, P, S> {
    #[inline]
    pub(crate) fn new(set: &'a RelationSet<L, R, P>) -> Self {
        Self {
            set,
            _side: PhantomData,
        }
    }
}

impl<L, R, P, S: Side> KeyAccess<S::Key<L, R>> for SideKeys<'_, L, R, P, S> {
    #[inline]
    fn key(&self, slot: u32) -> &S::Key<L, R> {
        S::key(self.set.relation_at(slot))
    }
}

/// Walks an index from `first` to `last`, checking link symmetry and that
/// exactly `len` slots are reachable.
pub(crate) fn validate_links<K, I: IndexOps<K>>(index: &I) -> bool {
    let mut count = 0;
    let mut prev = NIL;
    let mut slot = index.first();
    while slot.is_some() {
        if !index.contains(slot) || index.prev(slot) != prev {
            return false;
        }
        count += 1;
        if count > index.len() {
            return false;
        }
        prev = slot;
        slot = index.next(slot);
    }
    prev == index.last() && count == index.len()
}

#[cfg(test)]
pub(crate) mod test_keys {
    use super::KeyAccess;

    /// Keys held in a plain vector, slot = position.
    pub(crate) struct VecKeys<K>(pub Vec<K>);

    impl<K> KeyAccess<K> for VecKeys<K> {
        fn key(&self, slot: u32) -> &K {
            &self.0[slot as usize]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_keys::VecKeys;
    use super::*;

    fn collect<K>(index: &SideIndex<K>) -> Vec<Slot> {
        let mut out = Vec::new();
        let mut slot = index.first();
        while slot.is_some() {
            out.push(slot);
            slot = index.next(slot);
        }
        out
    }

    #[test]
    fn kind_predicates() {
        assert!(SideKind::UniqueOrdered.is_unique());
        assert!(SideKind::UniqueOrdered.is_ordered());
        assert!(!SideKind::MultiOrdered.is_unique());
        assert!(SideKind::MultiHashed.is_hashed());
        assert!(SideKind::Sequenced.is_sequenced());
        assert!(!SideKind::Sequenced.is_unique());
    }

    #[test]
    fn config_kinds() {
        assert_eq!(SideConfig::<u32>::unique_ordered().kind(), SideKind::UniqueOrdered);
        assert_eq!(SideConfig::<u32>::multi_ordered().kind(), SideKind::MultiOrdered);
        assert_eq!(SideConfig::<u32>::unique_hashed().kind(), SideKind::UniqueHashed);
        assert_eq!(SideConfig::<u32>::multi_hashed().kind(), SideKind::MultiHashed);
        assert_eq!(SideConfig::<u32>::sequenced().kind(), SideKind::Sequenced);
    }

    #[test]
    fn every_kind_links_and_unlinks() {
        let configs = [
            SideConfig::<u32>::unique_ordered(),
            SideConfig::multi_ordered(),
            SideConfig::unique_hashed(),
            SideConfig::multi_hashed(),
            SideConfig::sequenced(),
        ];

        for config in configs {
            let kind = config.kind();
            let keys = VecKeys(vec![30, 10, 20]);
            let mut index = SideIndex::new(config, 4, 7);

            for slot in 0..3 {
                index.insert_ref(&keys, slot).unwrap();
            }
            assert_eq!(index.len(), 3, "{kind}");
            assert!(index.validate(&keys), "{kind}");

            index.erase_ref(&keys, 1);
            assert_eq!(index.len(), 2, "{kind}");
            assert!(!index.contains(1), "{kind}");
            assert!(index.validate(&keys), "{kind}");

            let mut remaining = collect(&index);
            remaining.sort_unstable();
            assert_eq!(remaining, vec![0, 2], "{kind}");
        }
    }

    #[test]
    fn rekey_keeps_sequenced_position() {
        let mut keys = VecKeys(vec![1, 2, 3]);
        let mut index = SideIndex::new(SideConfig::<u32>::sequenced(), 4, 0);
        for slot in 0..3 {
            index.insert_ref(&keys, slot).unwrap();
        }

        index.rekey_begin(&keys, 0);
        keys.0[0] = 9;
        index.rekey_end(&keys, 0);

        assert_eq!(collect(&index), vec![0, 1, 2]);
    }

    #[test]
    fn rekey_moves_ordered_position() {
        let mut keys = VecKeys(vec![1, 2, 3]);
        let mut index = SideIndex::new(SideConfig::<u32>::unique_ordered(), 4, 0);
        for slot in 0..3 {
            index.insert_ref(&keys, slot).unwrap();
        }

        index.rekey_begin(&keys, 0);
        keys.0[0] = 9;
        index.rekey_end(&keys, 0);

        assert_eq!(collect(&index), vec![1, 2, 0]);
        assert!(index.validate(&keys));
    }

    #[test]
    fn debug_reports_distinct_keys_on_hashed_sides() {
        let keys = VecKeys(vec![5, 5, 6]);
        let mut hashed = SideIndex::new(SideConfig::<u32>::multi_hashed(), 0, 0);
        let mut ordered = SideIndex::new(SideConfig::<u32>::multi_ordered(), 0, 0);
        for slot in 0..3 {
            hashed.insert_ref(&keys, slot).unwrap();
            ordered.insert_ref(&keys, slot).unwrap();
        }

        let hashed = format!("{hashed:?}");
        assert!(hashed.contains("len: 3"), "{hashed}");
        assert!(hashed.contains("distinct: 2"), "{hashed}");
        assert!(!format!("{ordered:?}").contains("distinct"));
    }
}
