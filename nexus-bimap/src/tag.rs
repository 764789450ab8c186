//! Side markers and user tags.
//!
//! The two sides of a map are addressed by the zero-sized markers [`Left`]
//! and [`Right`]. Maps can additionally be given caller-defined tag types,
//! declared with [`side_tag!`](crate::side_tag), so call sites read
//! `map.by::<Name>()` rather than `map.left()`.
//!
//! Tag resolution happens entirely in the type system. A tag names the side
//! it stands for, and [`BiMap::by`](crate::BiMap::by) only accepts it if the
//! map was built with that tag on that side:
//!
//! ```
//! use nexus_bimap::{BiMap, SideConfig, side_tag};
//!
//! side_tag! {
//!     pub struct Name => Left;
//!     pub struct Id => Right;
//! }
//!
//! let mut map = BiMap::<String, u32>::builder(
//!     SideConfig::unique_ordered(),
//!     SideConfig::unique_hashed(),
//! )
//! .tags::<Name, Id>()
//! .build();
//!
//! map.insert("alice".into(), 7).unwrap();
//! assert_eq!(map.by::<Id>().get(&7).map(|e| e.value().as_str()), Some("alice"));
//! assert_eq!(map.by::<Name>().get(&"alice".to_string()).map(|e| *e.value()), Some(7));
//! ```
//!
//! A tag the map was not built with does not compile:
//!
//! ```compile_fail
//! use nexus_bimap::{BiMap, SideConfig, side_tag};
//!
//! side_tag! {
//!     struct Name => Left;
//!     struct Id => Right;
//!     struct Other => Left;
//! }
//!
//! let map = BiMap::<String, u32>::builder(
//!     SideConfig::unique_ordered(),
//!     SideConfig::unique_hashed(),
//! )
//! .tags::<Name, Id>()
//! .build();
//!
//! let _ = map.by::<Other>();
//! ```

use core::fmt;

use crate::relation::Relation;
use crate::set::RelationSet;
use crate::side::{Indices, SideIndex};

mod sealed {
    pub trait Sealed {}
}

/// Runtime name of a side, carried by errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideId {
    Left,
    Right,
}

impl SideId {
    /// Returns the opposite side.
    #[inline]
    pub const fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

/// Marker for the left side. Also the default left tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Left;

/// Marker for the right side. Also the default right tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Right;

/// Marker for the relation-set view (creation order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Relations;

impl sealed::Sealed for Left {}
impl sealed::Sealed for Right {}
impl sealed::Sealed for Relations {}

/// One side of a map, [`Left`] or [`Right`].
///
/// Sealed. Selects the key type, the key inside a relation, and the side's
/// index, all at compile time.
pub trait Side: View + Sized {
    const ID: SideId;

    /// This side's key type for a map over `L` and `R`.
    type Key<L, R>;

    /// The opposite side.
    type Other: Side;

    /// Reads this side's key out of a relation.
    fn key<L, R, P>(relation: &Relation<L, R, P>) -> &Self::Key<L, R>;

    #[doc(hidden)]
    fn key_mut<L, R, P>(relation: &mut Relation<L, R, P>) -> &mut Self::Key<L, R>;

    /// Builds a relation from this side's key and the other side's.
    #[doc(hidden)]
    fn relation<L, R, P>(
        key: Self::Key<L, R>,
        value: <Self::Other as Side>::Key<L, R>,
        payload: Option<P>,
    ) -> Relation<L, R, P>;

    #[doc(hidden)]
    fn index<L, R>(indices: &Indices<L, R>) -> &SideIndex<Self::Key<L, R>>;

    #[doc(hidden)]
    fn index_mut<L, R>(indices: &mut Indices<L, R>) -> &mut SideIndex<Self::Key<L, R>>;
}

impl Side for Left {
    const ID: SideId = SideId::Left;
    type Key<L, R> = L;
    type Other = Right;

    #[inline]
    fn key<L, R, P>(relation: &Relation<L, R, P>) -> &L {
        &relation.left
    }

    #[inline]
    fn key_mut<L, R, P>(relation: &mut Relation<L, R, P>) -> &mut L {
        &mut relation.left
    }

    #[inline]
    fn relation<L, R, P>(
        key: L,
        value: <Self::Other as Side>::Key<L, R>,
        payload: Option<P>,
    ) -> Relation<L, R, P> {
        Relation {
            left: key,
            right: value,
            payload,
        }
    }

    #[inline]
    fn index<L, R>(indices: &Indices<L, R>) -> &SideIndex<L> {
        &indices.left
    }

    #[inline]
    fn index_mut<L, R>(indices: &mut Indices<L, R>) -> &mut SideIndex<L> {
        &mut indices.left
    }
}

impl Side for Right {
    const ID: SideId = SideId::Right;
    type Key<L, R> = R;
    type Other = Left;

    #[inline]
    fn key<L, R, P>(relation: &Relation<L, R, P>) -> &R {
        &relation.right
    }

    #[inline]
    fn key_mut<L, R, P>(relation: &mut Relation<L, R, P>) -> &mut R {
        &mut relation.right
    }

    #[inline]
    fn relation<L, R, P>(
        key: R,
        value: <Self::Other as Side>::Key<L, R>,
        payload: Option<P>,
    ) -> Relation<L, R, P> {
        Relation {
            left: value,
            right: key,
            payload,
        }
    }

    #[inline]
    fn index<L, R>(indices: &Indices<L, R>) -> &SideIndex<R> {
        &indices.right
    }

    #[inline]
    fn index_mut<L, R>(indices: &mut Indices<L, R>) -> &mut SideIndex<R> {
        &mut indices.right
    }
}

/// A traversal order a [`Cursor`](crate::Cursor) can walk: either side's
/// index, or the relation set's creation order.
///
/// Projection between views is O(1) because all three address relations by
/// the same slot.
pub trait View: sealed::Sealed + 'static {
    #[doc(hidden)]
    fn first<L, R, P>(set: &RelationSet<L, R, P>, indices: &Indices<L, R>) -> u32;

    #[doc(hidden)]
    fn last<L, R, P>(set: &RelationSet<L, R, P>, indices: &Indices<L, R>) -> u32;

    #[doc(hidden)]
    fn next<L, R, P>(set: &RelationSet<L, R, P>, indices: &Indices<L, R>, slot: u32) -> u32;

    #[doc(hidden)]
    fn prev<L, R, P>(set: &RelationSet<L, R, P>, indices: &Indices<L, R>, slot: u32) -> u32;
}

macro_rules! impl_side_view {
    ($($side:ty),*) => {
        $(
            impl View for $side {
                #[inline]
                fn first<L, R, P>(_: &RelationSet<L, R, P>, indices: &Indices<L, R>) -> u32 {
                    <$side as Side>::index(indices).first()
                }

                #[inline]
                fn last<L, R, P>(_: &RelationSet<L, R, P>, indices: &Indices<L, R>) -> u32 {
                    <$side as Side>::index(indices).last()
                }

                #[inline]
                fn next<L, R, P>(
                    _: &RelationSet<L, R, P>,
                    indices: &Indices<L, R>,
                    slot: u32,
                ) -> u32 {
                    <$side as Side>::index(indices).next(slot)
                }

                #[inline]
                fn prev<L, R, P>(
                    _: &RelationSet<L, R, P>,
                    indices: &Indices<L, R>,
                    slot: u32,
                ) -> u32 {
                    <$side as Side>::index(indices).prev(slot)
                }
            }
        )*
    };
}

impl_side_view!(Left, Right);

impl View for Relations {
    #[inline]
    fn first<L, R, P>(set: &RelationSet<L, R, P>, _: &Indices<L, R>) -> u32 {
        set.head()
    }

    #[inline]
    fn last<L, R, P>(set: &RelationSet<L, R, P>, _: &Indices<L, R>) -> u32 {
        set.tail()
    }

    #[inline]
    fn next<L, R, P>(set: &RelationSet<L, R, P>, _: &Indices<L, R>, slot: u32) -> u32 {
        set.next_slot(slot)
    }

    #[inline]
    fn prev<L, R, P>(set: &RelationSet<L, R, P>, _: &Indices<L, R>, slot: u32) -> u32 {
        set.prev_slot(slot)
    }
}

/// A caller-defined name for one side of a map.
///
/// Declare tags with [`side_tag!`](crate::side_tag). [`Left`] and [`Right`]
/// are their own tags.
pub trait SideTag: 'static {
    /// The side this tag stands for.
    type Side: Side;
}

impl SideTag for Left {
    type Side = Left;
}

impl SideTag for Right {
    type Side = Right;
}

/// Maps a side to the tag a map of tags `(LT, RT)` gives it.
///
/// `Left` resolves to `LT` and `Right` to `RT`. Requiring
/// `T::Side: TagSlot<LT, RT, Tag = T>` is what rejects foreign tags.
pub trait TagSlot<LT, RT>: Side {
    type Tag;
}

impl<LT, RT> TagSlot<LT, RT> for Left {
    type Tag = LT;
}

impl<LT, RT> TagSlot<LT, RT> for Right {
    type Tag = RT;
}

/// Declares zero-sized tag types naming the sides of a map.
///
/// ```
/// use nexus_bimap::side_tag;
///
/// side_tag! {
///     /// Account holder.
///     pub struct Owner => Left;
///     pub struct Account => Right;
/// }
/// ```
#[macro_export]
macro_rules! side_tag {
    ($($(#[$meta:meta])* $vis:vis struct $name:ident => $side:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
            $vis struct $name;

            impl $crate::SideTag for $name {
                type Side = $crate::$side;
            }
        )+
    };
}
