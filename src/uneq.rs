//! Inequality (`≠`) GroupJoin engines.
//!
//! For each left row, aggregate every right row whose key **differs**. All
//! strategies exploit the identity
//!
//! ```text
//! agg({ r | r.key != l.key }) == subtract(agg(R), agg({ r | r.key == l.key }))
//! ```
//!
//! so they compute the global total plus per-key totals and never touch the
//! (near-quadratic) set of non-matching rows. Every engine therefore
//! requires the combine and subtract capabilities.

use crate::aggregate::FullAggregate;
use crate::row::{GJBound, GroupJoinResult, Relation, Row};
use std::collections::HashMap;
use std::hash::Hash;

/// `≠`-GroupJoin hashing the left input.
///
/// Per-key states are kept for the left keys only; the global total is
/// accumulated on the fly during the same scan of `R`. Preserves the order
/// of `L`.
pub fn hash_build_left<K, Lp, Rp, A>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: FullAggregate<K, Rp>,
{
    let mut table: HashMap<&K, A::Acc> = HashMap::with_capacity(l.len());
    for row in l {
        table.entry(&row.key).or_insert_with(|| agg.init());
    }

    let mut total = agg.init();
    for row in r {
        agg.accumulate(&mut total, row);
        if let Some(group) = table.get_mut(&row.key) {
            agg.accumulate(group, row);
        }
    }

    let mut out = Vec::with_capacity(l.len());
    for row in l {
        let rest = agg.subtract(total.clone(), table[&row.key].clone());
        out.push((row.clone(), agg.finish(rest)));
    }
    out
}

/// `≠`-GroupJoin hashing the right input.
///
/// Accumulates every right row under its key, then combines the per-key
/// states into the global total. Left keys missing from the table subtract
/// a fresh `init`. Preserves the order of `L`.
pub fn hash_build_right<K, Lp, Rp, A>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: FullAggregate<K, Rp>,
{
    let mut table: HashMap<&K, A::Acc> = HashMap::with_capacity(r.len());
    for row in r {
        let group = table.entry(&row.key).or_insert_with(|| agg.init());
        agg.accumulate(group, row);
    }

    let mut total = agg.init();
    for group in table.values() {
        agg.combine(&mut total, group.clone());
    }

    let mut out = Vec::with_capacity(l.len());
    for row in l {
        let group = table.get(&row.key).cloned().unwrap_or_else(|| agg.init());
        out.push((row.clone(), agg.finish(agg.subtract(total.clone(), group))));
    }
    out
}

/// `≠`-GroupJoin hashing whichever side the size ratio favors, using the
/// same policy as [`crate::equi::hash_adaptive`].
pub fn hash_adaptive<K, Lp, Rp, A>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: FullAggregate<K, Rp>,
{
    if l.len() * crate::equi::BUILD_LEFT_FACTOR < r.len() {
        hash_build_left(l, r, agg)
    } else {
        hash_build_right(l, r, agg)
    }
}

/// `≠`-GroupJoin sorting both inputs in place, then merging.
///
/// The global total comes from one accumulation pass over `R`; the merge
/// walks both relations once computing the per-key states, and duplicate
/// left keys reuse the subtracted state. Output is key-ascending.
pub fn sort_merge<K, Lp, Rp, A>(
    l: &mut Relation<K, Lp>,
    r: &mut Relation<K, Rp>,
    agg: &A,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound + Ord,
    Lp: GJBound,
    Rp: GJBound,
    A: FullAggregate<K, Rp>,
{
    l.sort_unstable_by(|a, b| a.key.cmp(&b.key));
    r.sort_unstable_by(|a, b| a.key.cmp(&b.key));

    let mut total = agg.init();
    for row in r.iter() {
        agg.accumulate(&mut total, row);
    }

    let mut out = Vec::with_capacity(l.len());
    let Some(first) = l.first() else {
        return out;
    };

    let mut ri = 0;
    let mut group = agg.init();
    let mut prev_key = &first.key;
    while ri < r.len() && r[ri].key < *prev_key {
        ri += 1;
    }
    while ri < r.len() && r[ri].key == *prev_key {
        agg.accumulate(&mut group, &r[ri]);
        ri += 1;
    }
    let mut rest = agg.subtract(total.clone(), group);

    for row in l.iter() {
        if row.key != *prev_key {
            let mut group = agg.init();
            while ri < r.len() && r[ri].key < row.key {
                ri += 1;
            }
            while ri < r.len() && r[ri].key == row.key {
                agg.accumulate(&mut group, &r[ri]);
                ri += 1;
            }
            rest = agg.subtract(total.clone(), group);
            prev_key = &row.key;
        }
        out.push((row.clone(), agg.finish(rest.clone())));
    }
    out
}

// Slice forms used by the parallel drivers. The global total is computed by
// the partition pass over the full right relation and threaded in here;
// within a partition the per-key states are complete, because the partition
// function sends equal keys to the same partition.

/// Slice form of [`hash_build_left`] with an externally computed global
/// total; `out.len()` must equal `l.len()`.
pub fn hash_build_left_into<K, Lp, Rp, A>(
    l: &[Row<K, Lp>],
    r: &[Row<K, Rp>],
    out: &mut [(Row<K, Lp>, A::Output)],
    total: &A::Acc,
    agg: &A,
) where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: FullAggregate<K, Rp>,
{
    debug_assert_eq!(l.len(), out.len());
    let mut table: HashMap<&K, A::Acc> = HashMap::with_capacity(l.len());
    for row in l {
        table.entry(&row.key).or_insert_with(|| agg.init());
    }

    for row in r {
        if let Some(group) = table.get_mut(&row.key) {
            agg.accumulate(group, row);
        }
    }

    for (row, slot) in l.iter().zip(out) {
        let rest = agg.subtract(total.clone(), table[&row.key].clone());
        *slot = (row.clone(), agg.finish(rest));
    }
}

/// Slice form of [`hash_build_right`] with an externally computed global
/// total; `out.len()` must equal `l.len()`.
pub fn hash_build_right_into<K, Lp, Rp, A>(
    l: &[Row<K, Lp>],
    r: &[Row<K, Rp>],
    out: &mut [(Row<K, Lp>, A::Output)],
    total: &A::Acc,
    agg: &A,
) where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: FullAggregate<K, Rp>,
{
    debug_assert_eq!(l.len(), out.len());
    let mut table: HashMap<&K, A::Acc> = HashMap::with_capacity(r.len());
    for row in r {
        let group = table.entry(&row.key).or_insert_with(|| agg.init());
        agg.accumulate(group, row);
    }

    for (row, slot) in l.iter().zip(out) {
        let group = table.get(&row.key).cloned().unwrap_or_else(|| agg.init());
        *slot = (
            row.clone(),
            agg.finish(agg.subtract(total.clone(), group)),
        );
    }
}

/// Slice form of [`hash_adaptive`]; `out.len()` must equal `l.len()`.
pub fn hash_adaptive_into<K, Lp, Rp, A>(
    l: &[Row<K, Lp>],
    r: &[Row<K, Rp>],
    out: &mut [(Row<K, Lp>, A::Output)],
    total: &A::Acc,
    agg: &A,
) where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: FullAggregate<K, Rp>,
{
    if l.len() * crate::equi::BUILD_LEFT_FACTOR < r.len() {
        hash_build_left_into(l, r, out, total, agg);
    } else {
        hash_build_right_into(l, r, out, total, agg);
    }
}
