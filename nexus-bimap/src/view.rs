//! Map views: one side of a [`BiMap`] seen as a map from that side's key to
//! the other side's.
//!
//! [`MapView`] borrows the map shared and offers lookup, iteration, and the
//! ordered-only bound queries. [`MapViewMut`] borrows it exclusively and adds
//! erase by key, rebinding, and relocation on sequenced sides.
//!
//! Operations a side's kind cannot serve (`range` on a hashed side, moving a
//! relation within an ordered side) fail with [`Error::Unsupported`].

use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ops::Bound;

use crate::bimap::BiMap;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::index::{Index, NIL, Slot};
use crate::relation::Relation;
use crate::set::{Handle, RelationSet};
use crate::side::{IndexOps, Indices, KeyAccess, SequencedIndex, SideIndex, SideKeys, SideKind};
use crate::tag::{Side, SideId};

fn unsupported<K>(index: &SideIndex<K>, side: SideId, operation: &'static str) -> Error {
    Error::Unsupported {
        side,
        kind: index.kind(),
        operation,
    }
}

// =============================================================================
// Entry
// =============================================================================

/// A relation as seen from side `S`: `key` is `S`'s key, `value` the other
/// side's.
pub struct Entry<'a, L, R, P, S> {
    handle: Handle,
    relation: &'a Relation<L, R, P>,
    _side: PhantomData<S>,
}

impl<L, R, P, S> Clone for Entry<'_, L, R, P, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L, R, P, S> Copy for Entry<'_, L, R, P, S> {}

impl<L: fmt::Debug, R: fmt::Debug, P: fmt::Debug, S> fmt::Debug for Entry<'_, L, R, P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("handle", &self.handle)
            .field("relation", self.relation)
            .finish()
    }
}

impl<'a, L, R, P, S> Entry<'a, L, R, P, S> {
    #[inline]
    pub(crate) fn at(set: &'a RelationSet<L, R, P>, slot: Slot) -> Self {
        Self {
            handle: set.handle_at(slot),
            relation: set.relation_at(slot),
            _side: PhantomData,
        }
    }

    #[inline]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    #[inline]
    pub fn relation(&self) -> &'a Relation<L, R, P> {
        self.relation
    }

    #[inline]
    pub fn payload(&self) -> Option<&'a P> {
        self.relation.payload()
    }
}

impl<'a, L, R, P, S: Side> Entry<'a, L, R, P, S> {
    /// This side's key.
    #[inline]
    pub fn key(&self) -> &'a S::Key<L, R> {
        S::key(self.relation)
    }

    /// The other side's key.
    #[inline]
    pub fn value(&self) -> &'a <S::Other as Side>::Key<L, R> {
        <S::Other as Side>::key(self.relation)
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Iterator over a contiguous run of one side's index.
pub struct SideIter<'a, L, R, P, S> {
    set: &'a RelationSet<L, R, P>,
    indices: &'a Indices<L, R>,
    front: Slot,
    back: Slot,
    done: bool,
    _side: PhantomData<S>,
}

impl<'a, L, R, P, S: Side> SideIter<'a, L, R, P, S> {
    /// Iterates `front` up to, not including, `end` (`NIL` = to the last).
    pub(crate) fn new(
        set: &'a RelationSet<L, R, P>,
        indices: &'a Indices<L, R>,
        front: Slot,
        end: Slot,
    ) -> Self {
        let index = S::index(indices);
        let done = front.is_none() || front == end;
        let back = if done {
            NIL
        } else if end.is_none() {
            index.last()
        } else {
            index.prev(end)
        };
        Self {
            set,
            indices,
            front,
            back,
            done,
            _side: PhantomData,
        }
    }
}

impl<'a, L, R, P, S: Side> Iterator for SideIter<'a, L, R, P, S> {
    type Item = Entry<'a, L, R, P, S>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let slot = self.front;
        if slot == self.back {
            self.done = true;
        } else {
            self.front = S::index(self.indices).next(slot);
        }
        Some(Entry::at(self.set, slot))
    }
}

impl<L, R, P, S: Side> DoubleEndedIterator for SideIter<'_, L, R, P, S> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let slot = self.back;
        if slot == self.front {
            self.done = true;
        } else {
            self.back = S::index(self.indices).prev(slot);
        }
        Some(Entry::at(self.set, slot))
    }
}

impl<L, R, P, S: Side> FusedIterator for SideIter<'_, L, R, P, S> {}

/// Relations matching one key, returned by [`MapView::find`].
///
/// Keyed sides hand back an exact run. Sequenced sides scan, skipping
/// non-matching relations.
pub struct Matches<'a, L, R, P, S: Side> {
    inner: SideIter<'a, L, R, P, S>,
    key: &'a S::Key<L, R>,
    scan: bool,
}

impl<L, R, P, S: Side> Matches<'_, L, R, P, S> {
    #[inline]
    fn accepts(&self, entry: &Entry<'_, L, R, P, S>) -> bool {
        !self.scan
            || S::index(self.inner.indices).matches(
                &SideKeys::<L, R, P, S>::new(self.inner.set),
                self.key,
                entry.handle.slot(),
            )
    }
}

impl<'a, L, R, P, S: Side> Iterator for Matches<'a, L, R, P, S> {
    type Item = Entry<'a, L, R, P, S>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.inner.next()?;
            if self.accepts(&entry) {
                return Some(entry);
            }
        }
    }
}

impl<L, R, P, S: Side> DoubleEndedIterator for Matches<'_, L, R, P, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.inner.next_back()?;
            if self.accepts(&entry) {
                return Some(entry);
            }
        }
    }
}

impl<L, R, P, S: Side> FusedIterator for Matches<'_, L, R, P, S> {}

// =============================================================================
// MapView
// =============================================================================

/// Shared view of a map through side `S`.
///
/// # Example
///
/// ```
/// use core::ops::Bound;
/// use nexus_bimap::{BiMap, SideConfig};
///
/// let mut map: BiMap<u32, &str> =
///     BiMap::new(SideConfig::multi_ordered(), SideConfig::unique_hashed());
/// for (age, name) in [(31, "ann"), (25, "bo"), (31, "cy"), (40, "di")] {
///     map.insert(age, name).unwrap();
/// }
///
/// let ages = map.left();
/// let thirties: Vec<_> = ages
///     .range(Bound::Included(&30), Bound::Excluded(&40))
///     .unwrap()
///     .map(|e| *e.value())
///     .collect();
/// assert_eq!(thirties, vec!["ann", "cy"]);
///
/// // Hashed sides have no order to range over.
/// assert!(map.right().range(Bound::Unbounded, Bound::Unbounded).is_err());
/// ```
pub struct MapView<'a, L, R, P, LT, RT, S> {
    map: &'a BiMap<L, R, P, LT, RT>,
    _side: PhantomData<S>,
}

impl<L, R, P, LT, RT, S> Clone for MapView<'_, L, R, P, LT, RT, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L, R, P, LT, RT, S> Copy for MapView<'_, L, R, P, LT, RT, S> {}

impl<L, R, P, LT, RT, S: Side> fmt::Debug for MapView<'_, L, R, P, LT, RT, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapView")
            .field("side", &S::ID)
            .field("kind", &self.kind())
            .field("len", &self.len())
            .finish()
    }
}

impl<'a, L, R, P, LT, RT, S: Side> MapView<'a, L, R, P, LT, RT, S> {
    #[inline]
    pub(crate) fn new(map: &'a BiMap<L, R, P, LT, RT>) -> Self {
        Self {
            map,
            _side: PhantomData,
        }
    }

    #[inline]
    fn index(&self) -> &'a SideIndex<S::Key<L, R>> {
        S::index(&self.map.indices)
    }

    #[inline]
    fn keys(&self) -> SideKeys<'a, L, R, P, S> {
        SideKeys::new(&self.map.set)
    }

    #[inline]
    fn span(&self, front: Slot, end: Slot) -> SideIter<'a, L, R, P, S> {
        SideIter::new(&self.map.set, &self.map.indices, front, end)
    }

    #[inline]
    fn entry(&self, slot: Slot) -> Option<Entry<'a, L, R, P, S>> {
        slot.get().map(|slot| Entry::at(&self.map.set, slot))
    }

    /// Which side this view reads.
    #[inline]
    pub fn side(&self) -> SideId {
        S::ID
    }

    /// The index kind configured on this side.
    #[inline]
    pub fn kind(&self) -> SideKind {
        self.index().kind()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates every relation in this side's order.
    #[inline]
    pub fn iter(&self) -> SideIter<'a, L, R, P, S> {
        self.span(self.index().first(), NIL)
    }

    /// Iterates the relations whose key on this side equals `key`, in
    /// insertion order among themselves.
    pub fn find<'k>(&self, key: &'k S::Key<L, R>) -> Matches<'k, L, R, P, S>
    where
        'a: 'k,
    {
        let span = self.index().find(&self.keys(), key);
        Matches {
            inner: self.span(span.front, span.end),
            key,
            scan: span.scan,
        }
    }

    /// Returns the first relation with this key.
    #[inline]
    pub fn get(&self, key: &S::Key<L, R>) -> Option<Entry<'a, L, R, P, S>> {
        let span = self.index().find(&self.keys(), key);
        if span.is_empty() {
            None
        } else {
            self.entry(span.front)
        }
    }

    #[inline]
    pub fn contains_key(&self, key: &S::Key<L, R>) -> bool {
        !self.index().find(&self.keys(), key).is_empty()
    }

    /// Number of relations with this key. O(1) on hashed sides.
    pub fn count(&self, key: &S::Key<L, R>) -> usize {
        match self.index() {
            SideIndex::Hashed(index) => index.count(&self.keys(), key),
            _ => self.find(key).count(),
        }
    }

    #[inline]
    pub fn first(&self) -> Option<Entry<'a, L, R, P, S>> {
        self.entry(self.index().first())
    }

    #[inline]
    pub fn last(&self) -> Option<Entry<'a, L, R, P, S>> {
        self.entry(self.index().last())
    }

    /// Cursor at the first relation in this side's order.
    #[inline]
    pub fn begin(&self) -> Cursor<'a, L, R, P, LT, RT, S> {
        Cursor::new(self.map, self.index().first())
    }

    /// Cursor past the last relation.
    #[inline]
    pub fn end(&self) -> Cursor<'a, L, R, P, LT, RT, S> {
        Cursor::new(self.map, NIL)
    }

    /// Cursor at the first relation with this key, or at the end.
    pub fn cursor(&self, key: &S::Key<L, R>) -> Cursor<'a, L, R, P, LT, RT, S> {
        let span = self.index().find(&self.keys(), key);
        Cursor::new(self.map, if span.is_empty() { NIL } else { span.front })
    }

    /// Iterates keys within the given bounds, in order.
    ///
    /// Inverted bounds yield nothing.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] unless this side is ordered.
    pub fn range(
        &self,
        lower: Bound<&S::Key<L, R>>,
        upper: Bound<&S::Key<L, R>>,
    ) -> Result<SideIter<'a, L, R, P, S>> {
        let index = self.index();
        let ordered = index
            .as_ordered()
            .ok_or_else(|| unsupported(index, S::ID, "range"))?;
        let keys = self.keys();

        let front = match lower {
            Bound::Included(key) => ordered.lower_bound(&keys, key),
            Bound::Excluded(key) => ordered.upper_bound(&keys, key),
            Bound::Unbounded => ordered.first(),
        };
        let end = match upper {
            Bound::Included(key) => ordered.upper_bound(&keys, key),
            Bound::Excluded(key) => ordered.lower_bound(&keys, key),
            Bound::Unbounded => NIL,
        };

        let inverted = front.is_some()
            && end.is_some()
            && ordered.compare(keys.key(front), keys.key(end)) == Ordering::Greater;
        if inverted {
            return Ok(self.span(NIL, NIL));
        }
        Ok(self.span(front, end))
    }

    /// Cursor at the first relation whose key is not less than `key`.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] unless this side is ordered.
    pub fn lower_bound(&self, key: &S::Key<L, R>) -> Result<Cursor<'a, L, R, P, LT, RT, S>> {
        let index = self.index();
        let ordered = index
            .as_ordered()
            .ok_or_else(|| unsupported(index, S::ID, "lower_bound"))?;
        Ok(Cursor::new(self.map, ordered.lower_bound(&self.keys(), key)))
    }

    /// Cursor at the first relation whose key is greater than `key`.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] unless this side is ordered.
    pub fn upper_bound(&self, key: &S::Key<L, R>) -> Result<Cursor<'a, L, R, P, LT, RT, S>> {
        let index = self.index();
        let ordered = index
            .as_ordered()
            .ok_or_else(|| unsupported(index, S::ID, "upper_bound"))?;
        Ok(Cursor::new(self.map, ordered.upper_bound(&self.keys(), key)))
    }
}

impl<'a, L, R, P, LT, RT, S: Side> IntoIterator for MapView<'a, L, R, P, LT, RT, S> {
    type Item = Entry<'a, L, R, P, S>;
    type IntoIter = SideIter<'a, L, R, P, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// MapViewMut
// =============================================================================

/// Exclusive view of a map through side `S`.
///
/// # Example
///
/// ```
/// use nexus_bimap::{BiMap, SideConfig};
///
/// let mut map: BiMap<&str, u32> =
///     BiMap::new(SideConfig::sequenced(), SideConfig::unique_ordered());
/// let a = map.insert("a", 1).unwrap();
/// map.insert("b", 2).unwrap();
/// map.insert("c", 3).unwrap();
///
/// map.left_mut().move_to_back(a).unwrap();
/// let order: Vec<_> = map.left().iter().map(|e| *e.key()).collect();
/// assert_eq!(order, vec!["b", "c", "a"]);
///
/// // Ordered sides decide their own order.
/// assert!(map.right_mut().move_to_back(a).is_err());
/// ```
pub struct MapViewMut<'a, L, R, P, LT, RT, S> {
    map: &'a mut BiMap<L, R, P, LT, RT>,
    _side: PhantomData<S>,
}

impl<L, R, P, LT, RT, S: Side> fmt::Debug for MapViewMut<'_, L, R, P, LT, RT, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_view(), f)
    }
}

impl<'a, L, R, P, LT, RT, S: Side> MapViewMut<'a, L, R, P, LT, RT, S> {
    #[inline]
    pub(crate) fn new(map: &'a mut BiMap<L, R, P, LT, RT>) -> Self {
        Self {
            map,
            _side: PhantomData,
        }
    }

    /// Reborrows as a shared view.
    #[inline]
    pub fn as_view(&self) -> MapView<'_, L, R, P, LT, RT, S> {
        MapView::new(&*self.map)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_view().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_view().is_empty()
    }

    #[inline]
    pub fn contains_key(&self, key: &S::Key<L, R>) -> bool {
        self.as_view().contains_key(key)
    }

    #[inline]
    pub fn count(&self, key: &S::Key<L, R>) -> usize {
        self.as_view().count(key)
    }

    #[inline]
    pub fn get(&self, key: &S::Key<L, R>) -> Option<Entry<'_, L, R, P, S>> {
        self.as_view().get(key)
    }

    /// Inserts a relation given this side's key and the other side's.
    ///
    /// Same rules as [`BiMap::insert`].
    #[inline]
    pub fn insert(
        &mut self,
        key: S::Key<L, R>,
        value: <S::Other as Side>::Key<L, R>,
    ) -> Result<Handle> {
        self.map.insert_relation(S::relation(key, value, None))
    }

    /// As [`insert`](Self::insert), carrying a payload.
    #[inline]
    pub fn insert_with(
        &mut self,
        key: S::Key<L, R>,
        value: <S::Other as Side>::Key<L, R>,
        payload: P,
    ) -> Result<Handle> {
        self.map
            .insert_relation(S::relation(key, value, Some(payload)))
    }

    /// Erases every relation with this key. Returns how many were erased.
    pub fn erase(&mut self, key: &S::Key<L, R>) -> usize {
        let doomed: Vec<Slot> = self
            .as_view()
            .find(key)
            .map(|entry| entry.handle.slot())
            .collect();
        for &slot in &doomed {
            self.map.erase_slot(slot);
        }
        doomed.len()
    }

    /// Erases and returns the first relation with this key.
    pub fn remove(&mut self, key: &S::Key<L, R>) -> Option<Relation<L, R, P>> {
        let slot = self.as_view().get(key)?.handle.slot();
        Some(self.map.erase_slot(slot))
    }

    /// Changes this side's key of a relation. See [`BiMap::rebind`].
    #[inline]
    pub fn rebind(&mut self, handle: Handle, key: S::Key<L, R>) -> Result<S::Key<L, R>> {
        self.map.rebind::<S>(handle, key)
    }

    /// Moves a relation to the front of a sequenced side.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] unless this side is sequenced.
    /// [`Error::NotFound`] if the handle is stale.
    pub fn move_to_front(&mut self, handle: Handle) -> Result<()> {
        self.relocate(handle, "move_to_front", |index, slot| index.move_to_front(slot))
    }

    /// Moves a relation to the back of a sequenced side.
    ///
    /// # Errors
    ///
    /// As [`move_to_front`](Self::move_to_front).
    pub fn move_to_back(&mut self, handle: Handle) -> Result<()> {
        self.relocate(handle, "move_to_back", |index, slot| index.move_to_back(slot))
    }

    /// Moves a relation directly in front of `before` on a sequenced side.
    ///
    /// # Errors
    ///
    /// As [`move_to_front`](Self::move_to_front), including when `before` is
    /// stale.
    pub fn move_before(&mut self, handle: Handle, before: Handle) -> Result<()> {
        if !self.map.set.contains(before) {
            return Err(Error::NotFound);
        }
        self.relocate(handle, "move_before", |index, slot| {
            index.move_before(slot, before.slot())
        })
    }

    fn relocate<F>(&mut self, handle: Handle, operation: &'static str, f: F) -> Result<()>
    where
        F: FnOnce(&mut SequencedIndex<S::Key<L, R>>, Slot),
    {
        let live = self.map.set.contains(handle);
        let index = S::index_mut(&mut self.map.indices);
        let kind = index.kind();
        let Some(sequenced) = index.as_sequenced_mut() else {
            return Err(Error::Unsupported {
                side: S::ID,
                kind,
                operation,
            });
        };
        if !live {
            return Err(Error::NotFound);
        }
        f(sequenced, handle.slot());
        Ok(())
    }
}
