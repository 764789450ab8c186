//! The bidirectional map facade.
//!
//! A [`BiMap`] owns one [`RelationSet`] and two side indices. Every mutation
//! goes through here so the three structures always agree: a relation is
//! linked into both sides or neither.
//!
//! # Insert protocol
//!
//! ```text
//! relation set ──ok──► left index ──ok──► right index ──ok──► handle
//!      │                   │                   │
//!     full             duplicate           duplicate
//!      │                   │                   │
//!      ▼                   ▼                   ▼
//!   error        remove from set     unlink left, remove from set
//! ```
//!
//! Side indices never mutate when they reject, so each failure path undoes
//! exactly the steps that succeeded before it.

use core::fmt;
use core::marker::PhantomData;
use core::mem;

use log::{debug, trace};

use crate::config::{Builder, ConflictPolicy};
use crate::cursor::Cursor;
use crate::error::{BulkInsertError, Error, Result};
use crate::index::{NIL, Slot};
use crate::relation::Relation;
use crate::set::{Handle, Iter, RelationSet};
use crate::side::{Indices, SideConfig, SideKeys};
use crate::tag::{Left, Right, Side, SideTag, TagSlot, View};
use crate::view::{MapView, MapViewMut};

/// A store of `(left, right, payload)` relations indexed from both sides.
///
/// Each side is configured independently as unique or multi, and as
/// ordered, hashed or sequenced (see [`SideConfig`]). Lookups through either
/// side return the matching relations; [`Handle`]s stay valid until the
/// relation they name is erased.
///
/// `LT` and `RT` are optional tag types naming the sides, see
/// [`side_tag!`](crate::side_tag).
///
/// # Example
///
/// ```
/// use nexus_bimap::{BiMap, SideConfig};
///
/// let mut map: BiMap<String, u32> =
///     BiMap::new(SideConfig::unique_ordered(), SideConfig::multi_hashed());
///
/// map.insert("alice".into(), 1).unwrap();
/// map.insert("bob".into(), 1).unwrap();
/// map.insert("carol".into(), 2).unwrap();
///
/// let names: Vec<_> = map.right().find(&1).map(|e| e.value().as_str()).collect();
/// assert_eq!(names, vec!["alice", "bob"]);
///
/// // Left side is unique.
/// assert!(map.insert("alice".into(), 3).is_err());
///
/// map.left_mut().erase(&"alice".to_string());
/// assert_eq!(map.right().count(&1), 1);
/// ```
pub struct BiMap<L, R, P = (), LT = Left, RT = Right> {
    pub(crate) set: RelationSet<L, R, P>,
    pub(crate) indices: Indices<L, R>,
    on_conflict: ConflictPolicy,
    _tags: PhantomData<fn() -> (LT, RT)>,
}

impl<L, R, P> BiMap<L, R, P> {
    /// Creates an empty map with the given side configurations.
    pub fn new(left: SideConfig<L>, right: SideConfig<R>) -> Self {
        Builder::new(left, right).build()
    }

    /// Starts building a map with capacity, bound, conflict policy, seed or
    /// tags.
    pub fn builder(left: SideConfig<L>, right: SideConfig<R>) -> Builder<L, R, P> {
        Builder::new(left, right)
    }

    /// Builds a map from a sequence of relations.
    ///
    /// # Errors
    ///
    /// Fails as a whole on the first relation that cannot be inserted, naming
    /// its position.
    ///
    /// ```
    /// use nexus_bimap::{BiMap, Error, SideConfig, SideId};
    ///
    /// let err = BiMap::<u32, char>::from_relations(
    ///     SideConfig::unique_ordered(),
    ///     SideConfig::unique_ordered(),
    ///     [(1, 'a'), (2, 'b'), (3, 'a')],
    /// )
    /// .unwrap_err();
    ///
    /// assert_eq!(err.position, 2);
    /// assert_eq!(err.error, Error::DuplicateKey { side: SideId::Right });
    /// ```
    pub fn from_relations<I>(
        left: SideConfig<L>,
        right: SideConfig<R>,
        relations: I,
    ) -> Result<Self, BulkInsertError>
    where
        I: IntoIterator,
        I::Item: Into<Relation<L, R, P>>,
    {
        let mut map = Self::new(left, right);
        map.try_extend(relations)?;
        Ok(map)
    }
}

impl<L: Ord, R: Ord, P> Default for BiMap<L, R, P> {
    /// Both sides unique and ordered.
    fn default() -> Self {
        Self::new(SideConfig::unique_ordered(), SideConfig::unique_ordered())
    }
}

impl<L, R, P, LT, RT> fmt::Debug for BiMap<L, R, P, LT, RT>
where
    L: fmt::Debug,
    R: fmt::Debug,
    P: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BiMap")
            .field("left", &self.indices.left.kind())
            .field("right", &self.indices.right.kind())
            .field("relations", &self.set)
            .finish()
    }
}

impl<L, R, P, LT, RT> BiMap<L, R, P, LT, RT> {
    pub(crate) fn from_parts(
        set: RelationSet<L, R, P>,
        indices: Indices<L, R>,
        on_conflict: ConflictPolicy,
    ) -> Self {
        Self {
            set,
            indices,
            on_conflict,
            _tags: PhantomData,
        }
    }

    // ========================================================================
    // Size and configuration
    // ========================================================================

    /// Returns the number of relations.
    #[inline]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Returns `true` if the map holds no relations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Returns the configured size bound, if any.
    #[inline]
    pub fn max_len(&self) -> Option<usize> {
        self.set.max_len()
    }

    #[inline]
    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.on_conflict
    }

    // ========================================================================
    // Relation access
    // ========================================================================

    /// Returns the underlying relation set (creation order, handles).
    #[inline]
    pub fn relations(&self) -> &RelationSet<L, R, P> {
        &self.set
    }

    /// Iterates `(handle, relation)` pairs in creation order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, L, R, P> {
        self.set.iter()
    }

    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&Relation<L, R, P>> {
        self.set.get(handle)
    }

    /// Returns `true` if `handle` names a live relation.
    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.set.contains(handle)
    }

    #[inline]
    pub fn payload(&self, handle: Handle) -> Option<&P> {
        self.set.get(handle).and_then(Relation::payload)
    }

    /// Returns the payload mutably, if the relation is live and has one.
    ///
    /// Payloads take no part in indexing, so they can be changed in place.
    #[inline]
    pub fn payload_mut(&mut self, handle: Handle) -> Option<&mut P> {
        self.set.payload_mut(handle).and_then(Option::as_mut)
    }

    /// Sets or clears a relation's payload, returning the previous one.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the handle is stale.
    pub fn replace_payload(&mut self, handle: Handle, payload: Option<P>) -> Result<Option<P>> {
        self.set
            .payload_mut(handle)
            .map(|slot| mem::replace(slot, payload))
            .ok_or(Error::NotFound)
    }

    // ========================================================================
    // Side views
    // ========================================================================

    /// Read view through the left index.
    #[inline]
    pub fn left(&self) -> MapView<'_, L, R, P, LT, RT, Left> {
        MapView::new(self)
    }

    /// Read view through the right index.
    #[inline]
    pub fn right(&self) -> MapView<'_, L, R, P, LT, RT, Right> {
        MapView::new(self)
    }

    /// Read view through side `S`.
    #[inline]
    pub fn view<S: Side>(&self) -> MapView<'_, L, R, P, LT, RT, S> {
        MapView::new(self)
    }

    /// Read view through the side tagged `T`.
    #[inline]
    pub fn by<T>(&self) -> MapView<'_, L, R, P, LT, RT, T::Side>
    where
        T: SideTag,
        T::Side: TagSlot<LT, RT, Tag = T>,
    {
        MapView::new(self)
    }

    #[inline]
    pub fn left_mut(&mut self) -> MapViewMut<'_, L, R, P, LT, RT, Left> {
        MapViewMut::new(self)
    }

    #[inline]
    pub fn right_mut(&mut self) -> MapViewMut<'_, L, R, P, LT, RT, Right> {
        MapViewMut::new(self)
    }

    #[inline]
    pub fn view_mut<S: Side>(&mut self) -> MapViewMut<'_, L, R, P, LT, RT, S> {
        MapViewMut::new(self)
    }

    /// Mutable view through the side tagged `T`.
    #[inline]
    pub fn by_mut<T>(&mut self) -> MapViewMut<'_, L, R, P, LT, RT, T::Side>
    where
        T: SideTag,
        T::Side: TagSlot<LT, RT, Tag = T>,
    {
        MapViewMut::new(self)
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Inserts a relation without payload.
    ///
    /// # Errors
    ///
    /// Under [`ConflictPolicy::Reject`], [`Error::DuplicateKey`] if a unique
    /// side already holds the key. [`Error::CapacityExceeded`] if the map is
    /// bounded and full. The map is unchanged on error.
    #[inline]
    pub fn insert(&mut self, left: L, right: R) -> Result<Handle> {
        self.insert_relation(Relation::new(left, right))
    }

    /// Inserts a relation carrying `payload`.
    #[inline]
    pub fn insert_with(&mut self, left: L, right: R, payload: P) -> Result<Handle> {
        self.insert_relation(Relation::with_payload(left, right, payload))
    }

    /// Inserts a prepared relation, honouring the map's conflict policy.
    pub fn insert_relation(&mut self, relation: Relation<L, R, P>) -> Result<Handle> {
        match self.on_conflict {
            ConflictPolicy::Reject => self.insert_rejecting(relation),
            ConflictPolicy::Evict => self.insert_evicting(relation).map(|(handle, _)| handle),
        }
    }

    /// Inserts a relation, first erasing whatever relations hold its keys on
    /// unique sides. Returns the new handle and the evicted relations.
    ///
    /// Works regardless of the configured policy.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExceeded`] if the map is full and nothing was evicted.
    /// The map is unchanged on error.
    ///
    /// ```
    /// use nexus_bimap::{BiMap, SideConfig};
    ///
    /// let mut map: BiMap<u32, char> = BiMap::default();
    /// map.insert(1, 'a').unwrap();
    /// map.insert(2, 'b').unwrap();
    ///
    /// let (_, evicted) = map.insert_evicting((1, 'b').into()).unwrap();
    /// let evicted: Vec<_> = evicted.into_iter().map(|r| (*r.left(), *r.right())).collect();
    /// assert_eq!(evicted, vec![(1, 'a'), (2, 'b')]);
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert_evicting(
        &mut self,
        relation: Relation<L, R, P>,
    ) -> Result<(Handle, Vec<Relation<L, R, P>>)> {
        let mut conflicts: Vec<Slot> = Vec::with_capacity(2);
        if let Err(slot) = self.probe::<Left>(&relation.left, NIL) {
            conflicts.push(slot);
        }
        if let Err(slot) = self.probe::<Right>(&relation.right, NIL) {
            if !conflicts.contains(&slot) {
                conflicts.push(slot);
            }
        }

        if conflicts.is_empty() && self.set.is_full() {
            return Err(self.capacity_error());
        }

        let evicted: Vec<_> = conflicts
            .into_iter()
            .map(|slot| self.erase_slot(slot))
            .collect();
        if !evicted.is_empty() {
            debug!("evicted {} conflicting relation(s)", evicted.len());
        }

        let handle = self.insert_rejecting(relation)?;
        Ok((handle, evicted))
    }

    fn insert_rejecting(&mut self, relation: Relation<L, R, P>) -> Result<Handle> {
        let handle = match self.set.try_insert(relation) {
            Ok(handle) => handle,
            Err(_) => return Err(self.capacity_error()),
        };
        let slot = handle.slot();

        if let Err(holder) = self.link::<Left>(slot) {
            self.set.remove_slot(slot);
            debug!("insert rejected: left key held by slot {holder}");
            return Err(Error::DuplicateKey { side: Left::ID });
        }
        if let Err(holder) = self.link::<Right>(slot) {
            self.unlink::<Left>(slot);
            self.set.remove_slot(slot);
            debug!("insert rejected: right key held by slot {holder}");
            return Err(Error::DuplicateKey { side: Right::ID });
        }

        trace!("linked relation at slot {slot}");
        Ok(handle)
    }

    /// Inserts every relation from `relations`, all or nothing.
    ///
    /// Conflicts are always rejected here, whatever the configured policy,
    /// so a failure can restore the map exactly. Returns the number of
    /// relations inserted.
    ///
    /// # Errors
    ///
    /// On the first failing relation, every relation inserted by this call is
    /// erased again and the error names the failing position.
    pub fn try_extend<I>(&mut self, relations: I) -> Result<usize, BulkInsertError>
    where
        I: IntoIterator,
        I::Item: Into<Relation<L, R, P>>,
    {
        let mut inserted: Vec<Slot> = Vec::new();
        for (position, relation) in relations.into_iter().enumerate() {
            match self.insert_rejecting(relation.into()) {
                Ok(handle) => inserted.push(handle.slot()),
                Err(error) => {
                    debug!(
                        "bulk insert failed at #{position}, rolling back {} relation(s)",
                        inserted.len()
                    );
                    for slot in inserted.into_iter().rev() {
                        self.erase_slot(slot);
                    }
                    return Err(BulkInsertError { position, error });
                }
            }
        }
        Ok(inserted.len())
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Erases the relation behind `handle` from both sides and the set.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the handle is stale, including a second erase
    /// through the same handle.
    pub fn erase(&mut self, handle: Handle) -> Result<Relation<L, R, P>> {
        if !self.set.contains(handle) {
            return Err(Error::NotFound);
        }
        Ok(self.erase_slot(handle.slot()))
    }

    /// Keeps only the relations for which `keep` returns `true`. Returns the
    /// number erased.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Relation<L, R, P>) -> bool,
    {
        let doomed: Vec<Slot> = self
            .set
            .iter()
            .filter(|(_, relation)| !keep(relation))
            .map(|(handle, _)| handle.slot())
            .collect();
        for &slot in &doomed {
            self.erase_slot(slot);
        }
        doomed.len()
    }

    /// Erases every relation. All handles become stale.
    pub fn clear(&mut self) {
        self.indices.left.clear();
        self.indices.right.clear();
        self.set.clear();
    }

    // ========================================================================
    // Rebinding
    // ========================================================================

    /// Changes side `S`'s key of a relation, returning the old key.
    ///
    /// The relation keeps its handle, its payload, and its position on the
    /// other side. On a keyed side it moves to the new key's position; on a
    /// sequenced side it stays where it is.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the handle is stale. [`Error::DuplicateKey`] if
    /// side `S` is unique and another relation holds `key`. Conflicts are
    /// rejected whatever the insert policy. The map is unchanged on error.
    pub fn rebind<S: Side>(&mut self, handle: Handle, key: S::Key<L, R>) -> Result<S::Key<L, R>> {
        if !self.set.contains(handle) {
            return Err(Error::NotFound);
        }
        let slot = handle.slot();
        if self.probe::<S>(&key, slot).is_err() {
            return Err(Error::DuplicateKey { side: S::ID });
        }
        Ok(self.rekey::<S>(slot, key))
    }

    /// [`rebind`](Self::rebind) on the left side.
    #[inline]
    pub fn rebind_left(&mut self, handle: Handle, key: L) -> Result<L> {
        self.rebind::<Left>(handle, key)
    }

    /// [`rebind`](Self::rebind) on the right side.
    #[inline]
    pub fn rebind_right(&mut self, handle: Handle, key: R) -> Result<R> {
        self.rebind::<Right>(handle, key)
    }

    /// Replaces both keys of a relation, returning the old pair.
    ///
    /// Both sides are checked before either is touched.
    ///
    /// # Errors
    ///
    /// As [`rebind`](Self::rebind), reporting the left side first.
    pub fn replace(&mut self, handle: Handle, left: L, right: R) -> Result<(L, R)> {
        if !self.set.contains(handle) {
            return Err(Error::NotFound);
        }
        let slot = handle.slot();
        if self.probe::<Left>(&left, slot).is_err() {
            return Err(Error::DuplicateKey { side: Left::ID });
        }
        if self.probe::<Right>(&right, slot).is_err() {
            return Err(Error::DuplicateKey { side: Right::ID });
        }
        let old_left = self.rekey::<Left>(slot, left);
        let old_right = self.rekey::<Right>(slot, right);
        Ok((old_left, old_right))
    }

    // ========================================================================
    // Cursors and projection
    // ========================================================================

    /// Cursor at the first relation in view `V`.
    #[inline]
    pub fn cursor_front<V: View>(&self) -> Cursor<'_, L, R, P, LT, RT, V> {
        Cursor::new(self, V::first(&self.set, &self.indices))
    }

    /// Cursor at the relation behind `handle`, positioned in view `V`.
    ///
    /// Any live relation can be projected into any view in O(1).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidIterator`] if the handle's relation was erased.
    pub fn project<V: View>(&self, handle: Handle) -> Result<Cursor<'_, L, R, P, LT, RT, V>> {
        if !self.set.contains(handle) {
            return Err(Error::InvalidIterator);
        }
        Ok(Cursor::new(self, handle.slot()))
    }

    /// [`project`](Self::project) into the side tagged `T`.
    pub fn project_by<T>(&self, handle: Handle) -> Result<Cursor<'_, L, R, P, LT, RT, T::Side>>
    where
        T: SideTag,
        T::Side: TagSlot<LT, RT, Tag = T>,
    {
        self.project::<T::Side>(handle)
    }

    // ========================================================================
    // Consistency
    // ========================================================================

    /// Verifies that both side indices cover exactly the relations in the
    /// set and that each index's structure is intact.
    ///
    /// O(n). Meant for tests and debugging.
    pub fn check_invariants(&self) -> bool {
        let len = self.set.len();
        if self.indices.left.len() != len || self.indices.right.len() != len {
            return false;
        }
        let covered = self.set.handles().all(|handle| {
            self.indices.left.contains(handle.slot()) && self.indices.right.contains(handle.slot())
        });
        covered
            && self.indices.left.validate(&self.keys::<Left>())
            && self.indices.right.validate(&self.keys::<Right>())
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    #[inline]
    pub(crate) fn keys<S: Side>(&self) -> SideKeys<'_, L, R, P, S> {
        SideKeys::new(&self.set)
    }

    /// Checks whether side `S` would accept `key`, ignoring `exclude`.
    #[inline]
    fn probe<S: Side>(&self, key: &S::Key<L, R>, exclude: Slot) -> Result<(), Slot> {
        S::index(&self.indices).check_insert(&self.keys::<S>(), key, exclude)
    }

    #[inline]
    fn link<S: Side>(&mut self, slot: Slot) -> Result<(), Slot> {
        let keys = SideKeys::<L, R, P, S>::new(&self.set);
        S::index_mut(&mut self.indices).insert_ref(&keys, slot)
    }

    #[inline]
    fn unlink<S: Side>(&mut self, slot: Slot) {
        let keys = SideKeys::<L, R, P, S>::new(&self.set);
        S::index_mut(&mut self.indices).erase_ref(&keys, slot);
    }

    /// Swaps side `S`'s key of a live slot. The new key must already have
    /// passed [`probe`](Self::probe).
    fn rekey<S: Side>(&mut self, slot: Slot, key: S::Key<L, R>) -> S::Key<L, R> {
        S::index_mut(&mut self.indices).rekey_begin(&SideKeys::<L, R, P, S>::new(&self.set), slot);
        let old = mem::replace(S::key_mut(self.set.relation_at_mut(slot)), key);
        S::index_mut(&mut self.indices).rekey_end(&SideKeys::<L, R, P, S>::new(&self.set), slot);
        trace!("rebound {} key of slot {slot}", S::ID);
        old
    }

    /// Unlinks a live slot from both sides, then frees it.
    pub(crate) fn erase_slot(&mut self, slot: Slot) -> Relation<L, R, P> {
        self.unlink::<Left>(slot);
        self.unlink::<Right>(slot);
        trace!("erased relation at slot {slot}");
        self.set.remove_slot(slot)
    }

    fn capacity_error(&self) -> Error {
        Error::CapacityExceeded {
            max: self.set.max_len().unwrap_or(usize::MAX),
        }
    }
}

impl<'a, L, R, P, LT, RT> IntoIterator for &'a BiMap<L, R, P, LT, RT> {
    type Item = (Handle, &'a Relation<L, R, P>);
    type IntoIter = Iter<'a, L, R, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side::SideKind;
    use crate::tag::{Relations, SideId};

    type Users = BiMap<String, u32, &'static str>;

    fn users() -> Users {
        BiMap::new(SideConfig::unique_ordered(), SideConfig::multi_hashed())
    }

    fn s(value: &str) -> String {
        value.to_string()
    }

    #[test]
    fn new_is_empty() {
        let map = users();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.left().kind(), SideKind::UniqueOrdered);
        assert_eq!(map.right().kind(), SideKind::MultiHashed);
        assert!(map.check_invariants());
    }

    #[test]
    fn insert_and_lookup_both_sides() {
        let mut map = users();
        let h = map.insert_with(s("alice"), 1, "admin").unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map.left().get(&s("alice")).map(|e| *e.value()), Some(1));
        assert_eq!(map.right().get(&1).map(|e| e.value().clone()), Some(s("alice")));
        assert_eq!(map.payload(h), Some(&"admin"));
        assert!(map.check_invariants());
    }

    #[test]
    fn duplicate_left_leaves_map_unchanged() {
        let mut map = users();
        map.insert(s("alice"), 1).unwrap();

        let err = map.insert(s("alice"), 2).unwrap_err();
        assert_eq!(err, Error::DuplicateKey { side: SideId::Left });
        assert_eq!(map.len(), 1);
        assert_eq!(map.right().count(&2), 0);
        assert!(map.check_invariants());
    }

    #[test]
    fn duplicate_right_unlinks_left() {
        let mut map: BiMap<u32, u32> = BiMap::default();
        map.insert(1, 10).unwrap();

        let err = map.insert(2, 10).unwrap_err();
        assert_eq!(err, Error::DuplicateKey { side: SideId::Right });
        assert!(!map.left().contains_key(&2));
        assert_eq!(map.len(), 1);
        assert!(map.check_invariants());
    }

    #[test]
    fn erase_by_handle() {
        let mut map = users();
        let a = map.insert(s("alice"), 1).unwrap();
        map.insert(s("bob"), 1).unwrap();

        let relation = map.erase(a).unwrap();
        assert_eq!(relation.left(), "alice");
        assert_eq!(map.right().count(&1), 1);
        assert!(!map.left().contains_key(&s("alice")));

        assert_eq!(map.erase(a), Err(Error::NotFound));
        assert!(map.check_invariants());
    }

    #[test]
    fn handle_survives_other_mutations() {
        let mut map = users();
        let a = map.insert(s("alice"), 1).unwrap();
        let b = map.insert(s("bob"), 2).unwrap();
        map.insert(s("carol"), 3).unwrap();
        map.erase(b).unwrap();
        map.insert(s("dave"), 4).unwrap();

        assert_eq!(map.get(a).map(|r| r.left().as_str()), Some("alice"));
    }

    #[test]
    fn rebind_moves_key() {
        let mut map = users();
        let h = map.insert(s("alice"), 1).unwrap();
        map.insert(s("bob"), 2).unwrap();

        assert_eq!(map.rebind_right(h, 2), Ok(1));
        assert_eq!(map.right().count(&2), 2);
        assert_eq!(map.right().count(&1), 0);

        assert_eq!(map.rebind_left(h, s("zed")), Ok(s("alice")));
        let order: Vec<_> = map.left().iter().map(|e| e.key().clone()).collect();
        assert_eq!(order, vec![s("bob"), s("zed")]);
        assert!(map.check_invariants());
    }

    #[test]
    fn rebind_rejects_duplicate() {
        let mut map = users();
        let h = map.insert(s("alice"), 1).unwrap();
        map.insert(s("bob"), 2).unwrap();

        assert_eq!(
            map.rebind_left(h, s("bob")),
            Err(Error::DuplicateKey { side: SideId::Left })
        );
        assert_eq!(map.get(h).map(|r| r.left().as_str()), Some("alice"));

        // Rebinding to its own key is not a conflict.
        assert_eq!(map.rebind_left(h, s("alice")), Ok(s("alice")));
        assert!(map.check_invariants());
    }

    #[test]
    fn rebind_stale_handle() {
        let mut map = users();
        let h = map.insert(s("alice"), 1).unwrap();
        map.erase(h).unwrap();
        assert_eq!(map.rebind_right(h, 5), Err(Error::NotFound));
    }

    #[test]
    fn replace_checks_both_sides_first() {
        let mut map: BiMap<u32, u32> = BiMap::default();
        let h = map.insert(1, 10).unwrap();
        map.insert(2, 20).unwrap();

        assert_eq!(
            map.replace(h, 3, 20),
            Err(Error::DuplicateKey { side: SideId::Right })
        );
        assert_eq!(map.get(h).map(|r| (*r.left(), *r.right())), Some((1, 10)));

        assert_eq!(map.replace(h, 3, 30), Ok((1, 10)));
        assert_eq!(map.left().get(&3).map(|e| *e.value()), Some(30));
        assert!(map.check_invariants());
    }

    #[test]
    fn payload_updates() {
        let mut map = users();
        let h = map.insert(s("alice"), 1).unwrap();
        assert_eq!(map.payload(h), None);

        assert_eq!(map.replace_payload(h, Some("x")), Ok(None));
        *map.payload_mut(h).unwrap() = "y";
        assert_eq!(map.payload(h), Some(&"y"));

        map.erase(h).unwrap();
        assert_eq!(map.replace_payload(h, None), Err(Error::NotFound));
    }

    #[test]
    fn bounded_map_rejects_when_full() {
        let mut map: BiMap<u32, u32> =
            BiMap::builder(SideConfig::unique_ordered(), SideConfig::unique_ordered())
                .max_len(2)
                .build();
        map.insert(1, 1).unwrap();
        map.insert(2, 2).unwrap();

        assert_eq!(
            map.insert(3, 3),
            Err(Error::CapacityExceeded { max: 2 })
        );
        assert_eq!(map.len(), 2);
        assert!(map.check_invariants());
    }

    #[test]
    fn evict_policy_replaces_conflicts() {
        let mut map: BiMap<u32, char> =
            BiMap::builder(SideConfig::unique_ordered(), SideConfig::unique_hashed())
                .on_conflict(ConflictPolicy::Evict)
                .build();
        map.insert(1, 'a').unwrap();
        map.insert(2, 'b').unwrap();

        map.insert(1, 'c').unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.left().get(&1).map(|e| *e.value()), Some('c'));
        assert!(!map.right().contains_key(&'a'));
        assert!(map.check_invariants());
    }

    #[test]
    fn evict_full_map_without_conflict_fails_cleanly() {
        let mut map: BiMap<u32, u32> = BiMap::builder(
            SideConfig::unique_ordered(),
            SideConfig::unique_ordered(),
        )
        .max_len(1)
        .build();
        map.insert(1, 1).unwrap();

        let err = map.insert_evicting(Relation::new(2, 2)).unwrap_err();
        assert_eq!(err, Error::CapacityExceeded { max: 1 });
        assert!(map.left().contains_key(&1));
    }

    #[test]
    fn try_extend_rolls_back() {
        let mut map: BiMap<u32, u32> = BiMap::default();
        map.insert(100, 100).unwrap();

        let err = map.try_extend([(1, 1), (2, 2), (3, 100)]).unwrap_err();
        assert_eq!(
            err,
            BulkInsertError {
                position: 2,
                error: Error::DuplicateKey { side: SideId::Right },
            }
        );
        assert_eq!(map.len(), 1);
        assert!(!map.left().contains_key(&1));
        assert!(map.check_invariants());

        assert_eq!(map.try_extend([(1, 1), (2, 2)]), Ok(2));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn retain_erases_from_both_sides() {
        let mut map: BiMap<u32, u32> = BiMap::default();
        for i in 0..10 {
            map.insert(i, i * 10).unwrap();
        }

        assert_eq!(map.retain(|r| r.left() % 2 == 0), 5);
        assert_eq!(map.len(), 5);
        assert!(!map.right().contains_key(&10));
        assert!(map.right().contains_key(&20));
        assert!(map.check_invariants());
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut map = users();
        let h = map.insert(s("alice"), 1).unwrap();
        map.clear();

        assert!(map.is_empty());
        assert!(!map.contains(h));
        assert!(map.left().iter().next().is_none());
        assert!(map.check_invariants());

        map.insert(s("alice"), 1).unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn project_erased_handle_is_invalid() {
        let mut map = users();
        let h = map.insert(s("alice"), 1).unwrap();
        map.erase(h).unwrap();

        assert!(matches!(
            map.project::<Relations>(h),
            Err(Error::InvalidIterator)
        ));
    }

    #[test]
    fn iteration_is_creation_order() {
        let mut map = users();
        for name in ["carol", "alice", "bob"] {
            map.insert(s(name), 0).unwrap();
        }
        let order: Vec<_> = map.iter().map(|(_, r)| r.left().clone()).collect();
        assert_eq!(order, vec![s("carol"), s("alice"), s("bob")]);
    }
}
