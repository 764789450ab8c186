//! Bidirectional maps over a shared relation set.
//!
//! A [`BiMap`] stores `(left, right, payload)` relations and indexes them
//! from both sides at once. Each side is configured independently, so the
//! same container serves as a one-to-one map, a one-to-many index, or a
//! many-to-many relation with an insertion-ordered side.
//!
//! # Design
//!
//! Storage is separated from structure:
//!
//! ```text
//! RelationSet (slab)   - owns relations, hands out stable slots
//! left index           - orders slots by left key, owns no keys
//! right index          - orders slots by right key, owns no keys
//! ```
//!
//! Every index node is addressed by the relation's slot, so:
//! - **Stable handles**: erasing one relation never moves another
//! - **O(1) projection**: a position in one view is found in any other
//!   without a search
//! - **No key copies**: indices read keys back out of the relation set
//!
//! # Quick Start
//!
//! ```
//! use nexus_bimap::{BiMap, SideConfig};
//!
//! // Each user has one id; an id may be shared by several usernames.
//! let mut users: BiMap<String, u32> =
//!     BiMap::new(SideConfig::unique_ordered(), SideConfig::multi_hashed());
//!
//! let alice = users.insert("alice".into(), 1).unwrap();
//! users.insert("bob".into(), 1).unwrap();
//! users.insert("carol".into(), 2).unwrap();
//!
//! // Look up from either side.
//! assert_eq!(users.left().get(&"carol".to_string()).map(|e| *e.value()), Some(2));
//! assert_eq!(users.right().count(&1), 2);
//!
//! // Change a key in place; the handle stays valid.
//! users.rebind_right(alice, 2).unwrap();
//! assert_eq!(users.right().count(&2), 2);
//!
//! // Erasing from one side erases from both.
//! users.right_mut().erase(&2);
//! assert_eq!(users.len(), 1);
//! assert!(users.get(alice).is_none());
//! ```
//!
//! # Side Kinds
//!
//! | Kind | Duplicates | Lookup | Order |
//! |------|------------|--------|-------|
//! | [`SideKind::UniqueOrdered`] | no | O(log n) | by key |
//! | [`SideKind::MultiOrdered`] | yes | O(log n) | by key, then insertion |
//! | [`SideKind::UniqueHashed`] | no | O(1) | unspecified |
//! | [`SideKind::MultiHashed`] | yes | O(1) | equal keys adjacent |
//! | [`SideKind::Sequenced`] | yes | O(n) | insertion, relocatable |
//!
//! # Failure Semantics
//!
//! Every fallible operation either completes or leaves the map exactly as it
//! was. An insert that trips a unique side unlinks whatever it had linked
//! before reporting [`Error::DuplicateKey`]; bulk inserts roll back every
//! relation they added.
//!
//! # Tags
//!
//! Sides can be named with caller-defined types via [`side_tag!`], and the
//! compiler rejects a tag the map was not built with. See [`tag`].
//!
//! # Logging
//!
//! Rejections, rollbacks and evictions are reported through the [`log`]
//! facade at `debug`; individual links and unlinks at `trace`.

pub mod tag;

mod bimap;
mod config;
mod cursor;
mod error;
mod index;
mod linked;
mod relation;
mod set;
mod side;
mod storage;
mod view;

pub use bimap::BiMap;
pub use config::{Builder, ConflictPolicy, DEFAULT_SEED};
pub use cursor::Cursor;
pub use error::{BulkInsertError, Error, Result};
pub use index::Index;
pub use relation::Relation;
pub use set::{Full, Handle, Iter, RelationSet};
pub use side::{Comparator, HashWith, KeyHasher, NaturalOrder, SideConfig, SideKind};
pub use tag::{Left, Relations, Right, Side, SideId, SideTag, TagSlot, View};
pub use view::{Entry, MapView, MapViewMut, Matches, SideIter};
