//! Slot-addressed node storage.
//!
//! The relation set owns relations in a slab; every side index keeps its own
//! per-slot node table alongside it. Both are addressed by the same [`Slot`],
//! which is what lets a position in one structure be found in any other in
//! O(1).

use crate::index::{Index, Slot};

/// Storage addressed by stable slots.
///
/// # Requirements
///
/// - **Stable slots**: a slot stays valid until its element is removed
/// - **O(1)** get/get_mut
pub(crate) trait Storage<T> {
    /// Returns a reference to the node at `slot`, if present.
    fn get(&self, slot: Slot) -> Option<&T>;

    /// Returns a mutable reference to the node at `slot`, if present.
    fn get_mut(&mut self, slot: Slot) -> Option<&mut T>;
}

impl<T> Storage<T> for slab::Slab<T> {
    #[inline]
    fn get(&self, slot: Slot) -> Option<&T> {
        slab::Slab::get(self, slot.as_usize())
    }

    #[inline]
    fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        slab::Slab::get_mut(self, slot.as_usize())
    }
}

/// Per-slot node table for a side index.
///
/// Grows on demand to cover any slot the relation set hands out. Vacant
/// entries hold `N::default()`; whether a slot is linked is tracked by the
/// node itself.
#[derive(Debug, Clone)]
pub(crate) struct NodeTable<N> {
    nodes: Vec<N>,
}

impl<N: Default> NodeTable<N> {
    #[cfg(test)]
    pub(crate) const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Makes sure `slot` is addressable and resets its node.
    #[inline]
    pub(crate) fn reset(&mut self, slot: Slot) -> &mut N {
        let i = slot.as_usize();
        if i >= self.nodes.len() {
            self.nodes.resize_with(i + 1, N::default);
        }
        let node = &mut self.nodes[i];
        *node = N::default();
        node
    }

    /// Returns the node at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` was never reset into the table.
    #[inline]
    pub(crate) fn node(&self, slot: Slot) -> &N {
        &self.nodes[slot.as_usize()]
    }

    /// Returns the node at `slot` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `slot` was never reset into the table.
    #[inline]
    pub(crate) fn node_mut(&mut self, slot: Slot) -> &mut N {
        &mut self.nodes[slot.as_usize()]
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl<N> Storage<N> for NodeTable<N> {
    #[inline]
    fn get(&self, slot: Slot) -> Option<&N> {
        self.nodes.get(slot.as_usize())
    }

    #[inline]
    fn get_mut(&mut self, slot: Slot) -> Option<&mut N> {
        self.nodes.get_mut(slot.as_usize())
    }
}
