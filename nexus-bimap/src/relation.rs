//! The stored unit: a left key, a right key, and an optional payload.

/// A `(left, right, payload)` triple stored in a [`BiMap`](crate::BiMap).
///
/// Identity is positional, not by value: two relations with equal fields
/// are distinct elements if the configured sides allow both in.
///
/// # Example
///
/// ```
/// use nexus_bimap::Relation;
///
/// let relation = Relation::with_payload("alice", 1, "admin");
/// assert_eq!(relation.left(), &"alice");
/// assert_eq!(relation.right(), &1);
/// assert_eq!(relation.payload(), Some(&"admin"));
///
/// let (left, right, payload) = relation.into_parts();
/// assert_eq!((left, right, payload), ("alice", 1, Some("admin")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation<L, R, P = ()> {
    pub(crate) left: L,
    pub(crate) right: R,
    pub(crate) payload: Option<P>,
}

impl<L, R, P> Relation<L, R, P> {
    /// Creates a relation without payload.
    #[inline]
    pub const fn new(left: L, right: R) -> Self {
        Self {
            left,
            right,
            payload: None,
        }
    }

    /// Creates a relation carrying `payload`.
    #[inline]
    pub const fn with_payload(left: L, right: R, payload: P) -> Self {
        Self {
            left,
            right,
            payload: Some(payload),
        }
    }

    #[inline]
    pub const fn left(&self) -> &L {
        &self.left
    }

    #[inline]
    pub const fn right(&self) -> &R {
        &self.right
    }

    #[inline]
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    /// Splits the relation into its parts.
    #[inline]
    pub fn into_parts(self) -> (L, R, Option<P>) {
        (self.left, self.right, self.payload)
    }
}

impl<L, R, P> From<(L, R)> for Relation<L, R, P> {
    fn from((left, right): (L, R)) -> Self {
        Self::new(left, right)
    }
}

impl<L, R, P> From<(L, R, Option<P>)> for Relation<L, R, P> {
    fn from((left, right, payload): (L, R, Option<P>)) -> Self {
        Self {
            left,
            right,
            payload,
        }
    }
}
