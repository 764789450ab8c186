//! Hashed side index.
//!
//! A [`HashTable`] maps each distinct key to a group record, and one
//! intrusive list threads every linked slot. Slots with equal keys are kept
//! adjacent in that list, in insertion order, so `find` is a contiguous run
//! from the group's first slot to the slot after its last.
//!
//! The table stores no keys, only `(first, last, len, hash)`. Equality probes
//! read the group's first key out of the relation set.

use hashbrown::HashTable;
use hashbrown::hash_table::Entry;

use super::{IndexOps, KeyAccess, KeyHasher, SideKind, Span, validate_links};
use crate::index::{Index, NIL, Slot};
use crate::linked::{Linked, List};
use crate::storage::{NodeTable, Storage};

#[derive(Debug, Clone, Copy)]
struct Group {
    first: Slot,
    last: Slot,
    len: u32,
    hash: u64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct HashNode {
    prev: Slot,
    next: Slot,
    hash: u64,
    linked: bool,
}

impl Default for HashNode {
    fn default() -> Self {
        Self {
            prev: NIL,
            next: NIL,
            hash: 0,
            linked: false,
        }
    }
}

impl Linked for HashNode {
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

/// Hash index with equal keys grouped.
pub struct HashedIndex<K> {
    groups: HashTable<Group>,
    nodes: NodeTable<HashNode>,
    order: List,
    unique: bool,
    hasher: Box<dyn KeyHasher<K> + Send + Sync>,
}

impl<K> HashedIndex<K> {
    pub(crate) fn new(
        hasher: Box<dyn KeyHasher<K> + Send + Sync>,
        unique: bool,
        capacity: usize,
    ) -> Self {
        Self {
            groups: HashTable::with_capacity(capacity),
            nodes: NodeTable::with_capacity(capacity),
            order: List::new(),
            unique,
            hasher,
        }
    }

    /// Number of slots linked under `key`.
    pub(crate) fn count<A: KeyAccess<K>>(&self, keys: &A, key: &K) -> usize {
        self.group(keys, key).map_or(0, |group| group.len as usize)
    }

    /// Number of distinct keys.
    pub(crate) fn distinct(&self) -> usize {
        self.groups.len()
    }

    fn group<A: KeyAccess<K>>(&self, keys: &A, key: &K) -> Option<&Group> {
        let hash = self.hasher.hash_key(key);
        self.groups
            .find(hash, |group| self.hasher.eq_keys(keys.key(group.first), key))
    }
}

impl<K> IndexOps<K> for HashedIndex<K> {
    #[inline]
    fn kind(&self) -> SideKind {
        if self.unique {
            SideKind::UniqueHashed
        } else {
            SideKind::MultiHashed
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    fn contains(&self, slot: Slot) -> bool {
        slot.is_some() && self.nodes.get(slot).is_some_and(|node| node.linked)
    }

    fn check_insert<A: KeyAccess<K>>(&self, keys: &A, key: &K, exclude: Slot) -> Result<(), Slot> {
        if !self.unique {
            return Ok(());
        }
        match self.group(keys, key) {
            Some(group) if group.first != exclude => Err(group.first),
            _ => Ok(()),
        }
    }

    fn insert_ref<A: KeyAccess<K>>(&mut self, keys: &A, slot: Slot) -> Result<(), Slot> {
        let key = keys.key(slot);
        let hash = self.hasher.hash_key(key);
        let hasher = &self.hasher;

        let entry = self.groups.entry(
            hash,
            |group| hasher.eq_keys(keys.key(group.first), key),
            |group| group.hash,
        );

        match entry {
            Entry::Occupied(mut occupied) => {
                if self.unique {
                    return Err(occupied.get().first);
                }
                let group = occupied.get_mut();
                let after = group.last;
                group.last = slot;
                group.len += 1;

                let node = self.nodes.reset(slot);
                node.hash = hash;
                node.linked = true;
                self.order.insert_after(&mut self.nodes, after, slot);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Group {
                    first: slot,
                    last: slot,
                    len: 1,
                    hash,
                });

                let node = self.nodes.reset(slot);
                node.hash = hash;
                node.linked = true;
                self.order.push_back(&mut self.nodes, slot);
            }
        }
        Ok(())
    }

    fn erase_ref<A: KeyAccess<K>>(&mut self, keys: &A, slot: Slot) {
        let (hash, prev, next) = {
            let node = self.nodes.node(slot);
            debug_assert!(node.linked, "erasing unlinked slot");
            (node.hash, node.prev, node.next)
        };
        let key = keys.key(slot);
        let hasher = &self.hasher;

        let mut entry = self
            .groups
            .find_entry(hash, |group| hasher.eq_keys(keys.key(group.first), key))
            .expect("linked slot missing from its hash group");

        let group = entry.get_mut();
        if group.len == 1 {
            entry.remove();
        } else {
            // Groups are contiguous, so the neighbours stay inside the group.
            if group.first == slot {
                group.first = next;
            }
            if group.last == slot {
                group.last = prev;
            }
            group.len -= 1;
        }

        self.order.remove(&mut self.nodes, slot);
        self.nodes.node_mut(slot).linked = false;
    }

    fn find<A: KeyAccess<K>>(&self, keys: &A, key: &K) -> Span {
        match self.group(keys, key) {
            Some(group) => Span::exact(group.first, self.nodes.node(group.last).next),
            None => Span::EMPTY,
        }
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
        self.groups.clear();
        self.nodes.clear();
        self.order.reset();
    }

    fn validate<A: KeyAccess<K>>(&self, keys: &A) -> bool {
        if !validate_links::<K, _>(self) {
            return false;
        }

        let mut covered = 0;
        for group in self.groups.iter() {
            if group.len == 0 || (self.unique && group.len != 1) {
                return false;
            }
            let first_key = keys.key(group.first);
            let mut slot = group.first;
            for n in 0..group.len {
                if slot.is_none()
                    || !self.hasher.eq_keys(keys.key(slot), first_key)
                    || self.nodes.node(slot).hash != group.hash
                {
                    return false;
                }
                if n + 1 == group.len && slot != group.last {
                    return false;
                }
                slot = self.nodes.node(slot).next;
            }
            covered += group.len as usize;
        }
        covered == self.order.len()
    }
}
