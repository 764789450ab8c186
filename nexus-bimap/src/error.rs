//! Error types for bimap operations.
//!
//! Every failure is reported as a value and leaves the map exactly as it was
//! before the call.

use crate::side::SideKind;
use crate::tag::SideId;

/// Errors returned by [`BiMap`](crate::BiMap) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A unique side already holds the key (insert, rebind or replace).
    #[error("duplicate key on the {side} side")]
    DuplicateKey {
        /// The side whose uniqueness constraint rejected the key.
        side: SideId,
    },
    /// No relation for the key, or the handle's relation was erased.
    #[error("relation not found")]
    NotFound,
    /// A position was projected from a relation that no longer exists.
    #[error("position refers to an erased relation")]
    InvalidIterator,
    /// The relation set reached its configured `max_len`.
    #[error("relation set is full ({max} relations)")]
    CapacityExceeded {
        /// The configured limit.
        max: usize,
    },
    /// The operation needs a different index kind on that side.
    #[error("{operation} is not supported by the {side} index ({kind})")]
    Unsupported {
        /// The side the operation was issued against.
        side: SideId,
        /// The kind configured on that side.
        kind: SideKind,
        /// Name of the rejected operation.
        operation: &'static str,
    },
}

/// Error returned by bulk construction and [`BiMap::try_extend`](crate::BiMap::try_extend).
///
/// Bulk operations reject as a whole: nothing from the input is kept when any
/// relation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("relation #{position} rejected: {error}")]
pub struct BulkInsertError {
    /// Zero-based position of the failing relation in the input.
    pub position: usize,
    /// Why it was rejected.
    #[source]
    pub error: Error,
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
