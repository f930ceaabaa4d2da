//! Row and relation model shared by every engine.
//!
//! A relation is an ordered, in-memory sequence of [`Row`]s. Engines that
//! sort or partition take their relations by `&mut` and may permute them;
//! everything else borrows immutably. Results pair each left row with the
//! finalized aggregate for that row.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Blanket bound for keys and payloads flowing through the engines.
///
/// Everything a join touches must be cloneable and sendable across the
/// worker pool; this alias keeps the signatures readable.
pub trait GJBound: 'static + Send + Sync + Clone {}
impl<T> GJBound for T where T: 'static + Send + Sync + Clone {}

/// A single relation row: a join key plus an opaque payload.
///
/// The payload is never inspected by the engines; it is only handed to the
/// aggregate (for right rows) or carried into the result (for left rows).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Row<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> Row<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

impl<K, V> From<(K, V)> for Row<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self { key, value }
    }
}

/// An in-memory relation: an ordered sequence of rows.
pub type Relation<K, V> = Vec<Row<K, V>>;

/// The output of a GroupJoin: one `(left row, finalized aggregate)` pair per
/// left row, in whatever order the chosen engine documents.
pub type GroupJoinResult<K, V, S> = Vec<(Row<K, V>, S)>;
