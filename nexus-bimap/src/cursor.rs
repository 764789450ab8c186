//! Cursors: positions within one view of a map.
//!
//! A cursor sits on a relation, or on the "end" position past the last one.
//! Moving off either end lands on end; moving from end wraps to the first
//! (forward) or last (backward) relation.
//!
//! Because every view addresses relations by the same slot, a cursor can be
//! re-seated in another view with [`Cursor::project`] without searching.

use core::fmt;
use core::marker::PhantomData;

use crate::bimap::BiMap;
use crate::index::{Index, Slot};
use crate::relation::Relation;
use crate::set::Handle;
use crate::tag::{Side, SideTag, TagSlot, View};

/// Position within view `V` of a map.
///
/// # Example
///
/// ```
/// use nexus_bimap::{BiMap, Left, Relations, Right, SideConfig};
///
/// let mut map: BiMap<&str, u32> =
///     BiMap::new(SideConfig::unique_hashed(), SideConfig::unique_ordered());
/// map.insert("c", 3).unwrap();
/// let b = map.insert("b", 2).unwrap();
/// map.insert("a", 1).unwrap();
///
/// // Walk the right side in key order starting from "b"'s relation.
/// let mut cursor = map.project::<Right>(b).unwrap();
/// assert_eq!(cursor.key(), Some(&2));
/// cursor.move_next();
/// assert_eq!(cursor.value(), Some(&"c"));
///
/// // Same relation, now in creation order.
/// let mut in_creation = cursor.project::<Relations>();
/// in_creation.move_next();
/// assert_eq!(in_creation.relation().map(|r| *r.left()), Some("b"));
///
/// // And the left side's view of it.
/// assert_eq!(cursor.project::<Left>().key(), Some(&"c"));
/// ```
pub struct Cursor<'a, L, R, P, LT, RT, V> {
    map: &'a BiMap<L, R, P, LT, RT>,
    slot: Slot,
    _view: PhantomData<V>,
}

impl<L, R, P, LT, RT, V> Clone for Cursor<'_, L, R, P, LT, RT, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L, R, P, LT, RT, V> Copy for Cursor<'_, L, R, P, LT, RT, V> {}

impl<L, R, P, LT, RT, V> PartialEq for Cursor<'_, L, R, P, LT, RT, V> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.map, other.map) && self.slot == other.slot
    }
}

impl<L, R, P, LT, RT, V> Eq for Cursor<'_, L, R, P, LT, RT, V> {}

impl<L, R, P, LT, RT, V> fmt::Debug for Cursor<'_, L, R, P, LT, RT, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot.get() {
            Some(slot) => f.debug_tuple("Cursor").field(&slot).finish(),
            None => f.write_str("Cursor(end)"),
        }
    }
}

impl<'a, L, R, P, LT, RT, V: View> Cursor<'a, L, R, P, LT, RT, V> {
    #[inline]
    pub(crate) fn new(map: &'a BiMap<L, R, P, LT, RT>, slot: Slot) -> Self {
        Self {
            map,
            slot,
            _view: PhantomData,
        }
    }

    /// Returns `true` at the end position.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.slot.is_none()
    }

    /// Handle of the current relation.
    #[inline]
    pub fn handle(&self) -> Option<Handle> {
        self.slot.get().map(|slot| self.map.set.handle_at(slot))
    }

    #[inline]
    pub fn relation(&self) -> Option<&'a Relation<L, R, P>> {
        self.slot.get().map(|slot| self.map.set.relation_at(slot))
    }

    #[inline]
    pub fn payload(&self) -> Option<&'a P> {
        self.relation().and_then(Relation::payload)
    }

    #[inline]
    pub fn move_next(&mut self) {
        self.slot = self.after(self.slot);
    }

    #[inline]
    pub fn move_prev(&mut self) {
        self.slot = self.before(self.slot);
    }

    /// The relation [`move_next`](Self::move_next) would land on.
    #[inline]
    pub fn peek_next(&self) -> Option<&'a Relation<L, R, P>> {
        self.after(self.slot)
            .get()
            .map(|slot| self.map.set.relation_at(slot))
    }

    /// The relation [`move_prev`](Self::move_prev) would land on.
    #[inline]
    pub fn peek_prev(&self) -> Option<&'a Relation<L, R, P>> {
        self.before(self.slot)
            .get()
            .map(|slot| self.map.set.relation_at(slot))
    }

    /// The same relation seen through view `W`. End projects to end.
    #[inline]
    pub fn project<W: View>(&self) -> Cursor<'a, L, R, P, LT, RT, W> {
        Cursor::new(self.map, self.slot)
    }

    /// Iterates from the current relation to the end of the view.
    pub fn iter(self) -> impl Iterator<Item = (Handle, &'a Relation<L, R, P>)> {
        let mut cursor = self;
        core::iter::from_fn(move || {
            let slot = cursor.slot.get()?;
            cursor.move_next();
            Some((
                cursor.map.set.handle_at(slot),
                cursor.map.set.relation_at(slot),
            ))
        })
    }

    /// [`project`](Self::project) into the side tagged `T`.
    #[inline]
    pub fn project_by<T>(&self) -> Cursor<'a, L, R, P, LT, RT, T::Side>
    where
        T: SideTag,
        T::Side: TagSlot<LT, RT, Tag = T>,
    {
        self.project::<T::Side>()
    }

    #[inline]
    fn after(&self, slot: Slot) -> Slot {
        if slot.is_none() {
            V::first(&self.map.set, &self.map.indices)
        } else {
            V::next(&self.map.set, &self.map.indices, slot)
        }
    }

    #[inline]
    fn before(&self, slot: Slot) -> Slot {
        if slot.is_none() {
            V::last(&self.map.set, &self.map.indices)
        } else {
            V::prev(&self.map.set, &self.map.indices, slot)
        }
    }
}

impl<'a, L, R, P, LT, RT, S: Side> Cursor<'a, L, R, P, LT, RT, S> {
    /// Side `S`'s key of the current relation.
    #[inline]
    pub fn key(&self) -> Option<&'a S::Key<L, R>> {
        self.relation().map(S::key)
    }

    /// The other side's key of the current relation.
    #[inline]
    pub fn value(&self) -> Option<&'a <S::Other as Side>::Key<L, R>> {
        self.relation().map(<S::Other as Side>::key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side::SideConfig;
    use crate::tag::{Left, Relations, Right};

    fn map() -> BiMap<u32, char> {
        let mut map = BiMap::new(SideConfig::unique_ordered(), SideConfig::unique_hashed());
        for (key, value) in [(2, 'b'), (3, 'c'), (1, 'a')] {
            map.insert(key, value).unwrap();
        }
        map
    }

    #[test]
    fn walk_forward_and_back() {
        let map = map();
        let mut cursor = map.cursor_front::<Left>();

        let mut seen = Vec::new();
        while !cursor.is_end() {
            seen.push(*cursor.key().unwrap());
            cursor.move_next();
        }
        assert_eq!(seen, vec![1, 2, 3]);

        cursor.move_prev();
        assert_eq!(cursor.key(), Some(&3));
    }

    #[test]
    fn end_wraps() {
        let map = map();
        let mut cursor = map.left().end();
        assert!(cursor.relation().is_none());

        cursor.move_next();
        assert_eq!(cursor.key(), Some(&1));

        let mut cursor = map.left().end();
        cursor.move_prev();
        assert_eq!(cursor.key(), Some(&3));
    }

    #[test]
    fn peek_does_not_move() {
        let map = map();
        let cursor = map.cursor_front::<Left>();
        assert_eq!(cursor.peek_next().map(|r| *r.left()), Some(2));
        assert!(cursor.peek_prev().is_none());
        assert_eq!(cursor.key(), Some(&1));
    }

    #[test]
    fn projection_round_trip() {
        let map = map();
        for (handle, _) in map.iter() {
            let left = map.project::<Left>(handle).unwrap();
            let right = left.project::<Right>();
            let back = right.project::<Relations>().project::<Left>();

            assert_eq!(right.handle(), Some(handle));
            assert_eq!(back, left);
        }
    }

    #[test]
    fn end_projects_to_end() {
        let map = map();
        assert!(map.left().end().project::<Right>().is_end());
    }

    #[test]
    fn iterates_from_position() {
        let map = map();
        let rest: Vec<_> = map
            .left()
            .cursor(&2)
            .iter()
            .map(|(_, relation)| *relation.right())
            .collect();
        assert_eq!(rest, vec!['b', 'c']);
    }

    #[test]
    fn creation_order_view() {
        let map = map();
        let order: Vec<_> = map
            .cursor_front::<Relations>()
            .iter()
            .map(|(_, r)| *r.left())
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}
