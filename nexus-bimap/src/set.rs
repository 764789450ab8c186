//! The relation set: slot arena owning every relation.
//!
//! Relations live in a [`slab::Slab`], so a slot stays put until its relation
//! is removed and freed slots are reused by later inserts. Each slot carries a
//! generation that is bumped on removal; a [`Handle`] pairs the two, so a
//! handle to an erased relation is detected even after its slot is reused.
//!
//! Creation order is threaded through the entries as an intrusive list and
//! is independent of how the side indices are configured.

use core::fmt;

use slab::Slab;

use crate::index::{Index, NIL, Slot};
use crate::linked::{Linked, List};
use crate::relation::Relation;
use crate::storage::Storage;

/// Stable reference to a relation.
///
/// Handles stay valid across inserts and across rebinding either key. They
/// are invalidated only by erasing the relation they refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    slot: Slot,
    generation: u32,
}

impl Handle {
    #[inline]
    pub(crate) const fn new(slot: Slot, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Returns the storage slot.
    #[inline]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Returns the slot generation this handle was issued for.
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Error returned when a bounded relation set is full.
///
/// Hands the rejected relation back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be inserted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relation set is full")
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}

#[derive(Debug, Clone)]
struct Entry<L, R, P> {
    relation: Relation<L, R, P>,
    prev: Slot,
    next: Slot,
}

impl<L, R, P> Linked for Entry<L, R, P> {
    #[inline]
    fn next(&self) -> Slot {
        self.next
    }

    #[inline]
    fn prev(&self) -> Slot {
        self.prev
    }

    #[inline]
    fn set_next(&mut self, slot: Slot) {
        self.next = slot;
    }

    #[inline]
    fn set_prev(&mut self, slot: Slot) {
        self.prev = slot;
    }
}

/// Arena of relations with stable, generation-checked handles.
///
/// # Example
///
/// ```
/// use nexus_bimap::{Relation, RelationSet};
///
/// let mut set: RelationSet<&str, u32> = RelationSet::new();
/// let a = set.try_insert(Relation::new("a", 1)).unwrap();
/// let b = set.try_insert(Relation::new("b", 2)).unwrap();
///
/// assert_eq!(set.get(a).map(|r| *r.left()), Some("a"));
///
/// set.remove(a);
/// assert!(set.get(a).is_none());
///
/// // The freed slot is reused, but the old handle stays dead.
/// let c = set.try_insert(Relation::new("c", 3)).unwrap();
/// assert_eq!(c.slot(), a.slot());
/// assert!(set.get(a).is_none());
///
/// let order: Vec<_> = set.iter().map(|(_, r)| *r.left()).collect();
/// assert_eq!(order, vec!["b", "c"]);
/// # let _ = b;
/// ```
#[derive(Clone)]
pub struct RelationSet<L, R, P = ()> {
    entries: Slab<Entry<L, R, P>>,
    generations: Vec<u32>,
    order: List,
    max_len: Option<usize>,
}

impl<L, R, P> Default for RelationSet<L, R, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: fmt::Debug, R: fmt::Debug, P: fmt::Debug> fmt::Debug for RelationSet<L, R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|(_, r)| r)).finish()
    }
}

impl<L, R, P> RelationSet<L, R, P> {
    /// Creates an empty, unbounded set.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty, unbounded set with room for `capacity` relations.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Slab::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            order: List::new(),
            max_len: None,
        }
    }

    /// Creates an empty set that holds at most `max_len` relations.
    ///
    /// Nothing is reserved up front; the limit only caps growth.
    pub fn bounded(max_len: usize) -> Self {
        Self::bounded_with_capacity(max_len, 0)
    }

    /// As [`bounded`](Self::bounded), with room reserved for
    /// `min(capacity, max_len)` relations.
    pub fn bounded_with_capacity(max_len: usize, capacity: usize) -> Self {
        let mut set = Self::with_capacity(capacity.min(max_len));
        set.max_len = Some(max_len);
        set
    }

    /// Returns the number of relations.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set holds no relations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured limit, if bounded.
    #[inline]
    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    /// Number of relations the set can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Returns `true` if a bounded set cannot take another relation.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.max_len.is_some_and(|max| self.entries.len() >= max)
    }

    /// Inserts a relation at the end of creation order.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(relation))` if the set is bounded and full.
    pub fn try_insert(
        &mut self,
        relation: Relation<L, R, P>,
    ) -> Result<Handle, Full<Relation<L, R, P>>> {
        if self.is_full() {
            return Err(Full(relation));
        }

        let key = self.entries.insert(Entry {
            relation,
            prev: NIL,
            next: NIL,
        });
        assert!(key < NIL.as_usize(), "relation set exceeds slot range");
        let slot = Slot::from_usize(key);

        if key >= self.generations.len() {
            self.generations.resize(key + 1, 0);
        }

        self.order.push_back(&mut self.entries, slot);
        Ok(Handle::new(slot, self.generations[key]))
    }

    /// Removes the relation behind `handle`.
    ///
    /// Returns `None` if the handle is stale.
    pub fn remove(&mut self, handle: Handle) -> Option<Relation<L, R, P>> {
        if !self.contains(handle) {
            return None;
        }
        Some(self.remove_slot(handle.slot))
    }

    /// Returns `true` if `handle` refers to a live relation.
    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        let i = handle.slot.as_usize();
        self.entries.contains(i) && self.generations[i] == handle.generation
    }

    /// Returns the relation behind `handle`, if it is still live.
    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&Relation<L, R, P>> {
        if self.contains(handle) {
            Some(self.relation_at(handle.slot))
        } else {
            None
        }
    }

    /// Returns the payload slot of a live relation mutably.
    ///
    /// Keys are not reachable mutably; they are owned by the side indices'
    /// ordering and change only through the map's rebind operations.
    #[inline]
    pub fn payload_mut(&mut self, handle: Handle) -> Option<&mut Option<P>> {
        if self.contains(handle) {
            Some(&mut self.relation_at_mut(handle.slot).payload)
        } else {
            None
        }
    }

    /// Returns the handle of the oldest relation.
    #[inline]
    pub fn first(&self) -> Option<Handle> {
        self.order.head().get().map(|slot| self.handle_at(slot))
    }

    /// Returns the handle of the newest relation.
    #[inline]
    pub fn last(&self) -> Option<Handle> {
        self.order.tail().get().map(|slot| self.handle_at(slot))
    }

    /// Iterates relations in creation order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, L, R, P> {
        Iter {
            set: self,
            front: self.order.head(),
            back: self.order.tail(),
            remaining: self.order.len(),
        }
    }

    /// Iterates handles in creation order.
    #[inline]
    pub fn handles(&self) -> impl DoubleEndedIterator<Item = Handle> + '_ {
        self.iter().map(|(handle, _)| handle)
    }

    /// Removes every relation. All handles become stale.
    pub fn clear(&mut self) {
        for (key, _) in self.entries.iter() {
            self.generations[key] = self.generations[key].wrapping_add(1);
        }
        self.entries.clear();
        self.order.reset();
    }

    // ========================================================================
    // Slot access for the side indices
    // ========================================================================

    #[inline]
    pub(crate) fn handle_at(&self, slot: Slot) -> Handle {
        Handle::new(slot, self.generations[slot.as_usize()])
    }

    /// # Panics
    ///
    /// Panics if `slot` is vacant.
    #[inline]
    pub(crate) fn relation_at(&self, slot: Slot) -> &Relation<L, R, P> {
        &self.entries[slot.as_usize()].relation
    }

    /// # Panics
    ///
    /// Panics if `slot` is vacant.
    #[inline]
    pub(crate) fn relation_at_mut(&mut self, slot: Slot) -> &mut Relation<L, R, P> {
        &mut self.entries[slot.as_usize()].relation
    }

    #[inline]
    pub(crate) fn head(&self) -> Slot {
        self.order.head()
    }

    #[inline]
    pub(crate) fn tail(&self) -> Slot {
        self.order.tail()
    }

    #[inline]
    pub(crate) fn next_slot(&self, slot: Slot) -> Slot {
        self.entry(slot).next
    }

    #[inline]
    pub(crate) fn prev_slot(&self, slot: Slot) -> Slot {
        self.entry(slot).prev
    }

    /// Removes a live slot, bumping its generation.
    pub(crate) fn remove_slot(&mut self, slot: Slot) -> Relation<L, R, P> {
        self.order.remove(&mut self.entries, slot);
        let i = slot.as_usize();
        self.generations[i] = self.generations[i].wrapping_add(1);
        self.entries.remove(i).relation
    }

    #[inline]
    fn entry(&self, slot: Slot) -> &Entry<L, R, P> {
        Storage::get(&self.entries, slot).expect("invalid slot")
    }
}

/// Iterator over `(handle, relation)` pairs in creation order.
pub struct Iter<'a, L, R, P> {
    set: &'a RelationSet<L, R, P>,
    front: Slot,
    back: Slot,
    remaining: usize,
}

impl<'a, L, R, P> Iterator for Iter<'a, L, R, P> {
    type Item = (Handle, &'a Relation<L, R, P>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.front;
        self.front = self.set.next_slot(slot);
        self.remaining -= 1;
        Some((self.set.handle_at(slot), self.set.relation_at(slot)))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<L, R, P> DoubleEndedIterator for Iter<'_, L, R, P> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.back;
        self.back = self.set.prev_slot(slot);
        self.remaining -= 1;
        Some((self.set.handle_at(slot), self.set.relation_at(slot)))
    }
}

impl<L, R, P> ExactSizeIterator for Iter<'_, L, R, P> {}

impl<'a, L, R, P> IntoIterator for &'a RelationSet<L, R, P> {
    type Item = (Handle, &'a Relation<L, R, P>);
    type IntoIter = Iter<'a, L, R, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestSet = RelationSet<u64, u64, &'static str>;

    #[test]
    fn new_is_empty() {
        let set: TestSet = RelationSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(set.first().is_none());
        assert!(set.last().is_none());
        assert_eq!(set.iter().count(), 0);
    }

    #[test]
    fn insert_get_remove() {
        let mut set: TestSet = RelationSet::new();

        let h = set.try_insert(Relation::with_payload(1, 10, "x")).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(h));
        assert_eq!(set.get(h).map(|r| r.right), Some(10));

        let removed = set.remove(h).unwrap();
        assert_eq!(removed.into_parts(), (1, 10, Some("x")));
        assert!(set.get(h).is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn double_remove_is_none() {
        let mut set: TestSet = RelationSet::new();
        let h = set.try_insert(Relation::new(1, 1)).unwrap();

        assert!(set.remove(h).is_some());
        assert!(set.remove(h).is_none());
    }

    #[test]
    fn slot_reuse_bumps_generation() {
        let mut set: TestSet = RelationSet::new();

        let a = set.try_insert(Relation::new(1, 1)).unwrap();
        let _b = set.try_insert(Relation::new(2, 2)).unwrap();
        set.remove(a);

        let c = set.try_insert(Relation::new(3, 3)).unwrap();
        assert_eq!(c.slot(), a.slot());
        assert_ne!(c.generation(), a.generation());
        assert!(!set.contains(a));
        assert_eq!(set.get(c).map(|r| r.left), Some(3));
    }

    #[test]
    fn removal_keeps_other_handles() {
        let mut set: TestSet = RelationSet::new();
        let handles: Vec<_> = (0..8)
            .map(|i| set.try_insert(Relation::new(i, i)).unwrap())
            .collect();

        set.remove(handles[3]);
        set.remove(handles[5]);

        for (i, h) in handles.iter().enumerate() {
            if i == 3 || i == 5 {
                assert!(!set.contains(*h));
            } else {
                assert_eq!(set.get(*h).map(|r| r.left), Some(i as u64));
            }
        }
    }

    #[test]
    fn creation_order_survives_reuse() {
        let mut set: TestSet = RelationSet::new();
        let a = set.try_insert(Relation::new(1, 0)).unwrap();
        set.try_insert(Relation::new(2, 0)).unwrap();
        set.try_insert(Relation::new(3, 0)).unwrap();

        set.remove(a);
        set.try_insert(Relation::new(4, 0)).unwrap();

        let order: Vec<_> = set.iter().map(|(_, r)| r.left).collect();
        assert_eq!(order, vec![2, 3, 4]);

        let rev: Vec<_> = set.iter().rev().map(|(_, r)| r.left).collect();
        assert_eq!(rev, vec![4, 3, 2]);
    }

    #[test]
    fn bounded_rejects_when_full() {
        let mut set: TestSet = RelationSet::bounded(2);

        set.try_insert(Relation::new(1, 1)).unwrap();
        let b = set.try_insert(Relation::new(2, 2)).unwrap();
        assert!(set.is_full());

        let err = set.try_insert(Relation::new(3, 3)).unwrap_err();
        assert_eq!(err.into_inner().into_parts(), (3, 3, None));
        assert_eq!(set.len(), 2);

        set.remove(b);
        assert!(set.try_insert(Relation::new(3, 3)).is_ok());
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut set: TestSet = RelationSet::new();
        let a = set.try_insert(Relation::new(1, 1)).unwrap();
        set.clear();

        assert!(set.is_empty());
        assert!(!set.contains(a));

        let b = set.try_insert(Relation::new(2, 2)).unwrap();
        assert_eq!(b.slot(), a.slot());
        assert!(!set.contains(a));
    }

    #[test]
    fn payload_mut_updates_payload() {
        let mut set: TestSet = RelationSet::new();
        let h = set.try_insert(Relation::new(1, 1)).unwrap();

        *set.payload_mut(h).unwrap() = Some("set");
        assert_eq!(set.get(h).and_then(|r| r.payload()), Some(&"set"));
    }

    #[test]
    fn exact_size_iter() {
        let mut set: TestSet = RelationSet::new();
        for i in 0..5 {
            set.try_insert(Relation::new(i, i)).unwrap();
        }
        let mut iter = set.iter();
        assert_eq!(iter.len(), 5);
        iter.next();
        iter.next_back();
        assert_eq!(iter.len(), 3);
    }
}
