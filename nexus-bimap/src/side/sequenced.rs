//! Sequenced side index: an insertion-ordered list that callers can reorder.

use super::{IndexOps, KeyAccess, SideKind, Span, validate_links};
use crate::index::{Index, NIL, Slot};
use crate::linked::{Linked, List};
use crate::storage::{NodeTable, Storage};

#[derive(Debug, Clone, Copy)]
pub(crate) struct SeqNode {
    prev: Slot,
    next: Slot,
    linked: bool,
}

impl Default for SeqNode {
    fn default() -> Self {
        Self {
            prev: NIL,
            next: NIL,
            linked: false,
        }
    }
}

impl Linked for SeqNode {
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

/// Linked list in insertion order. Never unique; lookups scan.
pub struct SequencedIndex<K> {
    nodes: NodeTable<SeqNode>,
    order: List,
    eq: Box<dyn Fn(&K, &K) -> bool + Send + Sync>,
}

impl<K> SequencedIndex<K> {
    pub(crate) fn new(eq: Box<dyn Fn(&K, &K) -> bool + Send + Sync>, capacity: usize) -> Self {
        Self {
            nodes: NodeTable::with_capacity(capacity),
            order: List::new(),
            eq,
        }
    }

    #[inline]
    pub(crate) fn key_eq(&self, a: &K, b: &K) -> bool {
        (self.eq)(a, b)
    }

    pub(crate) fn move_to_front(&mut self, slot: Slot) {
        if self.order.head() == slot {
            return;
        }
        self.order.remove(&mut self.nodes, slot);
        self.order.push_front(&mut self.nodes, slot);
    }

    pub(crate) fn move_to_back(&mut self, slot: Slot) {
        if self.order.tail() == slot {
            return;
        }
        self.order.remove(&mut self.nodes, slot);
        self.order.push_back(&mut self.nodes, slot);
    }

    /// Moves `slot` directly in front of `before`; `NIL` moves it to the back.
    pub(crate) fn move_before(&mut self, slot: Slot, before: Slot) {
        if slot == before {
            return;
        }
        if before.is_none() {
            self.move_to_back(slot);
            return;
        }
        self.order.remove(&mut self.nodes, slot);
        self.order.insert_before(&mut self.nodes, before, slot);
    }
}

impl<K> IndexOps<K> for SequencedIndex<K> {
    #[inline]
    fn kind(&self) -> SideKind {
        SideKind::Sequenced
    }

    #[inline]
    fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    fn contains(&self, slot: Slot) -> bool {
        slot.is_some() && self.nodes.get(slot).is_some_and(|node| node.linked)
    }

    #[inline]
    fn check_insert<A: KeyAccess<K>>(&self, _: &A, _: &K, _: Slot) -> Result<(), Slot> {
        Ok(())
    }

    fn insert_ref<A: KeyAccess<K>>(&mut self, _: &A, slot: Slot) -> Result<(), Slot> {
        self.nodes.reset(slot).linked = true;
        self.order.push_back(&mut self.nodes, slot);
        Ok(())
    }

    fn erase_ref<A: KeyAccess<K>>(&mut self, _: &A, slot: Slot) {
        debug_assert!(self.contains(slot), "erasing unlinked slot");
        self.order.remove(&mut self.nodes, slot);
        self.nodes.node_mut(slot).linked = false;
    }

    /// Scan span from the first match to the end of the list.
    fn find<A: KeyAccess<K>>(&self, keys: &A, key: &K) -> Span {
        let mut slot = self.order.head();
        while slot.is_some() {
            if self.key_eq(keys.key(slot), key) {
                return Span {
                    front: slot,
                    end: NIL,
                    scan: true,
                };
            }
            slot = self.nodes.node(slot).next;
        }
        Span::EMPTY
    }

    #[inline]
    fn first(&self) -> Slot {
        self.order.head()
    }

    #[inline]
    fn last(&self) -> Slot {
        self.order.tail()
    }

    #[inline]
    fn next(&self, slot: Slot) -> Slot {
        self.nodes.node(slot).next
    }

    #[inline]
    fn prev(&self, slot: Slot) -> Slot {
        self.nodes.node(slot).prev
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.order.reset();
    }

    fn validate<A: KeyAccess<K>>(&self, _: &A) -> bool {
        validate_links::<K, _>(self)
    }
}
