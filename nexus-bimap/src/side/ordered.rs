//! Ordered side index: a skip list over relation slots.
//!
//! Nodes hold forward pointers only; keys are read from the relation set.
//! Every node also carries an insertion sequence number, and the list is
//! sorted by `(key, seq)`. That makes each node's position unique even when
//! keys repeat, so equal keys iterate in insertion order and a node can be
//! located for removal without scanning its equal-key run.
//!
//! ```text
//! Level 2:  HEAD ───────────────► (20,4) ─────────────────────► NIL
//! Level 1:  HEAD ──► (10,0) ────► (20,4) ──────────► (30,2) ──► NIL
//! Level 0:  HEAD ──► (10,0) ──► (20,1) ──► (20,4) ──► (30,2) ──► NIL
//!                          ◄──        ◄──        ◄──           (prev, level 0)
//! ```

use core::cmp::Ordering;

use rand::rngs::SmallRng;
use rand_core::{RngCore, SeedableRng};

use super::{Comparator, IndexOps, KeyAccess, SideKind, Span, validate_links};
use crate::index::{Index, NIL, Slot};
use crate::storage::{NodeTable, Storage};

/// Maximum skip list height; efficient up to ~65K relations per level ratio.
const MAX_LEVEL: usize = 16;

#[derive(Debug, Clone)]
pub(crate) struct SkipNode {
    /// `forward[i]` is the next node at level `i`.
    forward: [Slot; MAX_LEVEL],
    /// Previous node at level 0, for reverse iteration.
    prev: Slot,
    seq: u64,
    /// Node participates in levels `0..=level`.
    level: u8,
    linked: bool,
}

impl Default for SkipNode {
    fn default() -> Self {
        Self {
            forward: [NIL; MAX_LEVEL],
            prev: NIL,
            seq: 0,
            level: 0,
            linked: false,
        }
    }
}

/// Skip list ordering relation slots by key.
pub struct OrderedIndex<K> {
    nodes: NodeTable<SkipNode>,
    head: [Slot; MAX_LEVEL],
    tail: Slot,
    /// Highest level currently in use.
    level: usize,
    len: usize,
    next_seq: u64,
    unique: bool,
    rng: SmallRng,
    cmp: Box<dyn Comparator<K> + Send + Sync>,
}

impl<K> OrderedIndex<K> {
    pub(crate) fn new(
        cmp: Box<dyn Comparator<K> + Send + Sync>,
        unique: bool,
        capacity: usize,
        seed: u64,
    ) -> Self {
        Self {
            nodes: NodeTable::with_capacity(capacity),
            head: [NIL; MAX_LEVEL],
            tail: NIL,
            level: 0,
            len: 0,
            next_seq: 0,
            unique,
            rng: SmallRng::seed_from_u64(seed),
            cmp,
        }
    }

    /// Returns the first slot whose key is not less than `key`, or `NIL`.
    pub(crate) fn lower_bound<A: KeyAccess<K>>(&self, keys: &A, key: &K) -> Slot {
        self.seek(keys, key, false)
    }

    /// Returns the first slot whose key is greater than `key`, or `NIL`.
    pub(crate) fn upper_bound<A: KeyAccess<K>>(&self, keys: &A, key: &K) -> Slot {
        self.seek(keys, key, true)
    }

    #[inline]
    pub(crate) fn compare(&self, a: &K, b: &K) -> Ordering {
        self.cmp.compare(a, b)
    }

    #[inline]
    fn forward(&self, current: Slot, level: usize) -> Slot {
        if current.is_none() {
            self.head[level]
        } else {
            self.nodes.node(current).forward[level]
        }
    }

    /// Descends to the last node ordered before `key` (or before-or-at when
    /// `inclusive`) and returns its successor at level 0.
    fn seek<A: KeyAccess<K>>(&self, keys: &A, key: &K, inclusive: bool) -> Slot {
        let mut current = NIL;

        for i in (0..=self.level).rev() {
            let mut next = self.forward(current, i);
            while next.is_some() {
                match self.cmp.compare(keys.key(next), key) {
                    Ordering::Less => {}
                    Ordering::Equal if inclusive => {}
                    _ => break,
                }
                current = next;
                next = self.nodes.node(next).forward[i];
            }
        }

        self.forward(current, 0)
    }

    #[inline]
    fn cmp_node<A: KeyAccess<K>>(&self, keys: &A, slot: Slot, key: &K, seq: u64) -> Ordering {
        self.cmp
            .compare(keys.key(slot), key)
            .then_with(|| self.nodes.node(slot).seq.cmp(&seq))
    }

    /// Fills `update` with the last node ordered before `(key, seq)` at each
    /// level. `NIL` entries mean the head.
    fn search<A: KeyAccess<K>>(
        &self,
        keys: &A,
        key: &K,
        seq: u64,
        update: &mut [Slot; MAX_LEVEL],
    ) {
        let mut current = NIL;

        for i in (0..=self.level).rev() {
            let mut next = self.forward(current, i);
            while next.is_some() && self.cmp_node(keys, next, key, seq) == Ordering::Less {
                current = next;
                next = self.nodes.node(next).forward[i];
            }
            update[i] = current;
        }
    }

    /// Geometric level with p = 0.5.
    #[inline]
    fn random_level(&mut self) -> u8 {
        let level = self.rng.next_u32().trailing_ones() as usize;
        level.min(MAX_LEVEL - 1) as u8
    }

    fn link_node(&mut self, slot: Slot, new_level: u8, update: &[Slot; MAX_LEVEL]) {
        let top = new_level as usize;

        let mut forwards = [NIL; MAX_LEVEL];
        for i in 0..=top {
            forwards[i] = self.forward(update[i], i);
        }
        let successor = forwards[0];

        {
            let node = self.nodes.node_mut(slot);
            node.forward = forwards;
            node.prev = update[0];
        }

        for i in 0..=top {
            if update[i].is_none() {
                self.head[i] = slot;
            } else {
                self.nodes.node_mut(update[i]).forward[i] = slot;
            }
        }

        if successor.is_some() {
            self.nodes.node_mut(successor).prev = slot;
        } else {
            self.tail = slot;
        }

        if top > self.level {
            self.level = top;
        }
        self.len += 1;
    }
}

impl<K> IndexOps<K> for OrderedIndex<K> {
    #[inline]
    fn kind(&self) -> SideKind {
        if self.unique {
            SideKind::UniqueOrdered
        } else {
            SideKind::MultiOrdered
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn contains(&self, slot: Slot) -> bool {
        slot.is_some() && self.nodes.get(slot).is_some_and(|node| node.linked)
    }

    fn check_insert<A: KeyAccess<K>>(&self, keys: &A, key: &K, exclude: Slot) -> Result<(), Slot> {
        if !self.unique {
            return Ok(());
        }
        let found = self.lower_bound(keys, key);
        if found.is_some()
            && found != exclude
            && self.cmp.compare(keys.key(found), key) == Ordering::Equal
        {
            return Err(found);
        }
        Ok(())
    }

    fn insert_ref<A: KeyAccess<K>>(&mut self, keys: &A, slot: Slot) -> Result<(), Slot> {
        let key = keys.key(slot);
        self.check_insert(keys, key, NIL)?;

        // Fresh nodes sort after every equal key already linked.
        let seq = self.next_seq;
        self.next_seq += 1;

        let mut update = [NIL; MAX_LEVEL];
        self.search(keys, key, seq, &mut update);

        let level = self.random_level();
        {
            let node = self.nodes.reset(slot);
            node.seq = seq;
            node.level = level;
            node.linked = true;
        }
        self.link_node(slot, level, &update);
        Ok(())
    }

    fn erase_ref<A: KeyAccess<K>>(&mut self, keys: &A, slot: Slot) {
        let (seq, level, forward, prev) = {
            let node = self.nodes.node(slot);
            debug_assert!(node.linked, "erasing unlinked slot");
            (node.seq, node.level as usize, node.forward, node.prev)
        };

        let mut update = [NIL; MAX_LEVEL];
        self.search(keys, keys.key(slot), seq, &mut update);
        debug_assert_eq!(self.forward(update[0], 0), slot);

        for i in 0..=level {
            if update[i].is_none() {
                self.head[i] = forward[i];
            } else {
                self.nodes.node_mut(update[i]).forward[i] = forward[i];
            }
        }

        if forward[0].is_some() {
            self.nodes.node_mut(forward[0]).prev = prev;
        } else {
            self.tail = prev;
        }

        while self.level > 0 && self.head[self.level].is_none() {
            self.level -= 1;
        }

        let node = self.nodes.node_mut(slot);
        node.linked = false;
        node.forward = [NIL; MAX_LEVEL];
        node.prev = NIL;
        self.len -= 1;
    }

    fn find<A: KeyAccess<K>>(&self, keys: &A, key: &K) -> Span {
        // With no equal key both bounds land on the same slot.
        Span::exact(self.lower_bound(keys, key), self.upper_bound(keys, key))
    }

    #[inline]
    fn first(&self) -> Slot {
        self.head[0]
    }

    #[inline]
    fn last(&self) -> Slot {
        self.tail
    }

    #[inline]
    fn next(&self, slot: Slot) -> Slot {
        self.nodes.node(slot).forward[0]
    }

    #[inline]
    fn prev(&self, slot: Slot) -> Slot {
        self.nodes.node(slot).prev
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.head = [NIL; MAX_LEVEL];
        self.tail = NIL;
        self.level = 0;
        self.len = 0;
    }

    fn validate<A: KeyAccess<K>>(&self, keys: &A) -> bool {
        if !validate_links::<K, _>(self) {
            return false;
        }

        for i in 0..MAX_LEVEL {
            if i > self.level {
                if self.head[i].is_some() {
                    return false;
                }
                continue;
            }
            let mut prev = NIL;
            let mut slot = self.head[i];
            while slot.is_some() {
                let node = self.nodes.node(slot);
                if !node.linked || (node.level as usize) < i {
                    return false;
                }
                if prev.is_some() {
                    let order = self.cmp_node(keys, prev, keys.key(slot), node.seq);
                    if order != Ordering::Less {
                        return false;
                    }
                    if self.unique
                        && i == 0
                        && self.cmp.compare(keys.key(prev), keys.key(slot)) == Ordering::Equal
                    {
                        return false;
                    }
                }
                prev = slot;
                slot = node.forward[i];
            }
        }
        true
    }
}
