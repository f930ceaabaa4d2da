//! Testing utilities for GroupJoin results.
//!
//! The engines only promise a *multiset* of result rows — hash iteration,
//! sorting, and partitioning each impose their own order — so tests compare
//! results after a canonical sort by left row. Two rows with the same
//! `(key, payload)` necessarily carry the same aggregate, which keeps the
//! sorted comparison stable under duplicates.

use crate::row::{GroupJoinResult, Relation, Row};
use std::fmt::Debug;

/// Build a relation from `(key, payload)` pairs.
///
/// # Example
/// ```
/// use groupjoin::testing::relation_of;
///
/// let rel = relation_of(vec![(1, 10), (2, 20)]);
/// assert_eq!(rel[1].key, 2);
/// ```
pub fn relation_of<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Relation<K, V> {
    pairs.into_iter().map(Row::from).collect()
}

/// Sort a result canonically by `(key, payload)` of the left row.
#[must_use]
pub fn sorted_results<K, V, S>(mut results: GroupJoinResult<K, V, S>) -> GroupJoinResult<K, V, S>
where
    K: Ord,
    V: Ord,
{
    results.sort_by(|a, b| a.0.key.cmp(&b.0.key).then_with(|| a.0.value.cmp(&b.0.value)));
    results
}

/// Assert that two results are equal as multisets of `(left row, aggregate)`
/// pairs.
///
/// # Panics
/// If the canonically sorted results differ.
pub fn assert_same_results<K, V, S>(
    actual: GroupJoinResult<K, V, S>,
    expected: GroupJoinResult<K, V, S>,
) where
    K: Ord + Debug,
    V: Ord + Debug,
    S: PartialEq + Debug,
{
    let actual = sorted_results(actual);
    let expected = sorted_results(expected);
    assert_eq!(actual, expected);
}
