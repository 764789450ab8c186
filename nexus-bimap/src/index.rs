//! Slot numbers with a sentinel.
//!
//! Every structure in this crate links relations by their slot in the
//! relation set. `u32::MAX` is reserved to mean "no slot", which keeps each
//! link at four bytes where `Option<u32>` would take eight.

/// A slot number whose maximum value means "none".
///
/// # Example
///
/// ```
/// use nexus_bimap::Index;
///
/// let slot: u32 = 5;
///
/// assert!(slot.is_some());
/// assert!(u32::NONE.is_none());
/// assert_eq!(slot.get(), Some(5));
/// assert_eq!(u32::NONE.get(), None);
/// ```
pub trait Index: Copy + Eq {
    /// The "no slot" value.
    const NONE: Self;

    #[inline]
    fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    fn is_some(self) -> bool {
        self != Self::NONE
    }

    /// `None` for the sentinel, `Some(self)` otherwise.
    #[inline]
    fn get(self) -> Option<Self> {
        if self.is_none() { None } else { Some(self) }
    }

    /// Position in a `Vec` or slab.
    fn as_usize(self) -> usize;

    /// Slot for a slab key. Keys past the slot range are a caller bug.
    fn from_usize(key: usize) -> Self;
}

impl Index for u32 {
    const NONE: Self = u32::MAX;

    #[inline]
    fn as_usize(self) -> usize {
        self as usize
    }

    #[inline]
    fn from_usize(key: usize) -> Self {
        debug_assert!(key < u32::MAX as usize, "slot {key} out of range");
        key as u32
    }
}

/// Slot number shared by the relation set and every side index.
pub(crate) type Slot = u32;

/// The "no slot" sentinel.
pub(crate) const NIL: Slot = <Slot as Index>::NONE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_is_none() {
        assert!(NIL.is_none());
        assert!(!NIL.is_some());
        assert_eq!(NIL.get(), None);
    }

    #[test]
    fn ordinary_slots_are_some() {
        for slot in [0u32, 7, u32::MAX - 1] {
            assert!(slot.is_some());
            assert_eq!(slot.get(), Some(slot));
            assert_eq!(Slot::from_usize(slot.as_usize()), slot);
        }
    }
}
