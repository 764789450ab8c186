//! Intrusive doubly-linked list over slot storage.
//!
//! Nodes embed their own prev/next links, so a relation can be unlinked in
//! O(1) given only its slot. The relation set threads its creation order
//! through one of these; the sequenced and hashed side indices each thread
//! their iteration order through another.

use crate::index::{Index, NIL, Slot};
use crate::storage::Storage;

/// Types that can participate in a [`List`].
pub(crate) trait Linked {
    /// Returns the next slot, or `NIL` at the tail.
    fn next(&self) -> Slot;

    /// Returns the previous slot, or `NIL` at the head.
    fn prev(&self) -> Slot;

    fn set_next(&mut self, slot: Slot);

    fn set_prev(&mut self, slot: Slot);
}

/// A doubly-linked list over external storage.
///
/// The list only stores head, tail and length. All operations must be given
/// the same storage instance the linked nodes live in.
#[derive(Debug, Clone)]
pub(crate) struct List {
    head: Slot,
    tail: Slot,
    len: usize,
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl List {
    /// Creates an empty list.
    #[inline]
    pub(crate) const fn new() -> Self {
        Self {
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    #[inline]
    pub(crate) const fn head(&self) -> Slot {
        self.head
    }

    #[inline]
    pub(crate) const fn tail(&self) -> Slot {
        self.tail
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    #[inline]
    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Links `slot` at the back of the list.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not valid in storage.
    #[inline]
    pub(crate) fn push_back<T, S>(&mut self, storage: &mut S, slot: Slot)
    where
        T: Linked,
        S: Storage<T>,
    {
        {
            let node = storage.get_mut(slot).expect("invalid slot");
            node.set_prev(self.tail);
            node.set_next(NIL);
        }

        if self.tail.is_some() {
            link_mut(storage, self.tail).set_next(slot);
        } else {
            self.head = slot;
        }

        self.tail = slot;
        self.len += 1;
    }

    /// Links `slot` at the front of the list.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not valid in storage.
    #[inline]
    pub(crate) fn push_front<T, S>(&mut self, storage: &mut S, slot: Slot)
    where
        T: Linked,
        S: Storage<T>,
    {
        {
            let node = storage.get_mut(slot).expect("invalid slot");
            node.set_next(self.head);
            node.set_prev(NIL);
        }

        if self.head.is_some() {
            link_mut(storage, self.head).set_prev(slot);
        } else {
            self.tail = slot;
        }

        self.head = slot;
        self.len += 1;
    }

    /// Links `slot` directly after `after`, which must be in this list.
    ///
    /// # Panics
    ///
    /// Panics if `after` or `slot` is not valid in storage.
    #[inline]
    pub(crate) fn insert_after<T, S>(&mut self, storage: &mut S, after: Slot, slot: Slot)
    where
        T: Linked,
        S: Storage<T>,
    {
        let next = storage.get(after).expect("invalid 'after' slot").next();
        {
            let node = storage.get_mut(slot).expect("invalid slot");
            node.set_prev(after);
            node.set_next(next);
        }

        link_mut(storage, after).set_next(slot);

        if next.is_some() {
            link_mut(storage, next).set_prev(slot);
        } else {
            self.tail = slot;
        }

        self.len += 1;
    }

    /// Links `slot` directly before `before`, which must be in this list.
    ///
    /// # Panics
    ///
    /// Panics if `before` or `slot` is not valid in storage.
    #[inline]
    pub(crate) fn insert_before<T, S>(&mut self, storage: &mut S, before: Slot, slot: Slot)
    where
        T: Linked,
        S: Storage<T>,
    {
        let prev = storage.get(before).expect("invalid 'before' slot").prev();
        {
            let node = storage.get_mut(slot).expect("invalid slot");
            node.set_next(before);
            node.set_prev(prev);
        }

        link_mut(storage, before).set_prev(slot);

        if prev.is_some() {
            link_mut(storage, prev).set_next(slot);
        } else {
            self.head = slot;
        }

        self.len += 1;
    }

    /// Unlinks `slot`. The node stays in storage with cleared links.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not valid in storage.
    #[inline]
    pub(crate) fn remove<T, S>(&mut self, storage: &mut S, slot: Slot)
    where
        T: Linked,
        S: Storage<T>,
    {
        let (prev, next) = {
            let node = storage.get(slot).expect("invalid slot");
            (node.prev(), node.next())
        };

        if prev.is_some() {
            link_mut(storage, prev).set_next(next);
        } else {
            self.head = next;
        }

        if next.is_some() {
            link_mut(storage, next).set_prev(prev);
        } else {
            self.tail = prev;
        }

        let node = link_mut(storage, slot);
        node.set_prev(NIL);
        node.set_next(NIL);

        self.len -= 1;
    }

    /// Forgets every node without touching storage.
    #[inline]
    pub(crate) fn reset(&mut self) {
        self.head = NIL;
        self.tail = NIL;
        self.len = 0;
    }
}

#[inline]
fn link_mut<T: Linked, S: Storage<T>>(storage: &mut S, slot: Slot) -> &mut T {
    storage.get_mut(slot).expect("broken list link")
}
