//! Construction-time configuration.
//!
//! Everything a map needs to know is fixed when it is built: the kind of each
//! side, pre-allocated capacity, an optional size bound, how inserts resolve
//! key conflicts, the seed for the ordered sides' level generator, and the
//! tag types naming each side.

use core::fmt;
use core::marker::PhantomData;

use crate::bimap::BiMap;
use crate::set::RelationSet;
use crate::side::{Indices, SideConfig, SideIndex};
use crate::tag::{Left, Right, SideTag};

/// Default seed for skip list level generation.
pub const DEFAULT_SEED: u64 = 0x6e65_7875_735f_626d;

/// Mixed into the right side's seed so the two sides draw different levels.
const RIGHT_SEED_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// What an insert does when a unique side already holds one of its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConflictPolicy {
    /// Fail with [`Error::DuplicateKey`](crate::Error::DuplicateKey) and
    /// leave the map unchanged.
    #[default]
    Reject,
    /// Erase the conflicting relations first, then insert.
    Evict,
}

/// Builder for [`BiMap`].
///
/// Created via [`BiMap::builder`].
///
/// # Example
///
/// ```
/// use nexus_bimap::{BiMap, ConflictPolicy, SideConfig};
///
/// let mut map = BiMap::<u32, &str>::builder(
///     SideConfig::unique_ordered(),
///     SideConfig::unique_hashed(),
/// )
/// .capacity(64)
/// .max_len(2)
/// .on_conflict(ConflictPolicy::Evict)
/// .build();
///
/// map.insert(1, "a").unwrap();
/// map.insert(2, "b").unwrap();
///
/// // Evicts (1, "a") to make room for the conflicting key.
/// map.insert(3, "a").unwrap();
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.right().get(&"a").map(|e| *e.value()), Some(3));
///
/// // No conflict to evict and the set is full.
/// assert!(map.insert(4, "d").is_err());
/// ```
pub struct Builder<L, R, P = (), LT = Left, RT = Right> {
    left: SideConfig<L>,
    right: SideConfig<R>,
    capacity: usize,
    max_len: Option<usize>,
    on_conflict: ConflictPolicy,
    seed: u64,
    _marker: PhantomData<fn() -> (P, LT, RT)>,
}

impl<L, R, P, LT, RT> fmt::Debug for Builder<L, R, P, LT, RT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("left", &self.left)
            .field("right", &self.right)
            .field("capacity", &self.capacity)
            .field("max_len", &self.max_len)
            .field("on_conflict", &self.on_conflict)
            .field("seed", &self.seed)
            .finish()
    }
}

impl<L, R, P> Builder<L, R, P> {
    pub(crate) fn new(left: SideConfig<L>, right: SideConfig<R>) -> Self {
        Self {
            left,
            right,
            capacity: 0,
            max_len: None,
            on_conflict: ConflictPolicy::Reject,
            seed: DEFAULT_SEED,
            _marker: PhantomData,
        }
    }
}

impl<L, R, P, LT, RT> Builder<L, R, P, LT, RT> {
    /// Pre-allocate room for this many relations. The map still grows past
    /// it unless bounded by [`max_len`](Self::max_len). Default: 0.
    pub fn capacity(mut self, relations: usize) -> Self {
        self.capacity = relations;
        self
    }

    /// Hard limit on the number of relations. Inserts beyond it fail with
    /// [`Error::CapacityExceeded`](crate::Error::CapacityExceeded).
    /// Only caps growth; pre-allocation comes from
    /// [`capacity`](Self::capacity). Default: unbounded.
    pub fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    /// How inserts resolve unique-key conflicts. Default: reject.
    pub fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.on_conflict = policy;
        self
    }

    /// Seed for the ordered sides' level generator. Same seed, same
    /// operations, same internal shape.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Names the sides with caller-defined tags.
    pub fn tags<LT2, RT2>(self) -> Builder<L, R, P, LT2, RT2>
    where
        LT2: SideTag<Side = Left>,
        RT2: SideTag<Side = Right>,
    {
        Builder {
            left: self.left,
            right: self.right,
            capacity: self.capacity,
            max_len: self.max_len,
            on_conflict: self.on_conflict,
            seed: self.seed,
            _marker: PhantomData,
        }
    }

    /// Builds the map.
    pub fn build(self) -> BiMap<L, R, P, LT, RT> {
        let capacity = self.max_len.map_or(self.capacity, |max| self.capacity.min(max));
        let set = match self.max_len {
            Some(max) => RelationSet::bounded_with_capacity(max, capacity),
            None => RelationSet::with_capacity(capacity),
        };
        let indices = Indices {
            left: SideIndex::new(self.left, capacity, self.seed),
            right: SideIndex::new(self.right, capacity, self.seed ^ RIGHT_SEED_MIX),
        };
        BiMap::from_parts(set, indices, self.on_conflict)
    }
}
