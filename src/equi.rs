//! Equality (`=`) GroupJoin engines.
//!
//! All strategies produce, for each left row, the aggregate over the right
//! rows with the **same** key. They differ in which side they hash, whether
//! they sort, and what result order they guarantee:
//!
//! - [`hash_build_left`] / [`hash_build_right`] / [`hash_adaptive`] —
//!   hash-based, preserve the order of `L`.
//! - [`hash_grouped`] / [`hash_unique`] — single-table variants that emit in
//!   table order; `hash_unique` assumes the keys of `L` are unique.
//! - [`merge_sorted`] — linear merge over inputs already sorted ascending by
//!   key.
//! - [`sort_merge`] — sorts both inputs in place, then merges.
//!
//! Every hash strategy has an `_into` slice form writing into a
//! pre-positioned output range, which is what the parallel drivers dispatch
//! per partition.

use crate::aggregate::Aggregate;
use crate::row::{GJBound, GroupJoinResult, Relation, Row};
use std::collections::HashMap;
use std::hash::Hash;

/// Size ratio above which the adaptive strategy hashes `L` instead of `R`.
///
/// Hashing the left side wins once `R` outnumbers `L` by this factor,
/// because the table stays small while the big side is only streamed.
/// Policy knob; tune freely.
pub const BUILD_LEFT_FACTOR: usize = 10;

/// `=`-GroupJoin hashing the left input.
///
/// Builds a `key -> state` table seeded with `init` for every left key
/// (duplicate keys share one slot), streams `R` through it, then emits in
/// the original order of `L`.
pub fn hash_build_left<K, Lp, Rp, A>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
{
    let mut table: HashMap<&K, A::Acc> = HashMap::with_capacity(l.len());
    for row in l {
        table.entry(&row.key).or_insert_with(|| agg.init());
    }

    for row in r {
        if let Some(total) = table.get_mut(&row.key) {
            agg.accumulate(total, row);
        }
    }

    let mut out = Vec::with_capacity(l.len());
    for row in l {
        out.push((row.clone(), agg.finish(table[&row.key].clone())));
    }
    out
}

/// `=`-GroupJoin hashing the right input.
///
/// Accumulates every right row into a `key -> state` table, then looks each
/// left row up; missing keys finalize a fresh `init`. Preserves the order of
/// `L`.
pub fn hash_build_right<K, Lp, Rp, A>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
{
    let mut table: HashMap<&K, A::Acc> = HashMap::with_capacity(r.len());
    for row in r {
        let total = table.entry(&row.key).or_insert_with(|| agg.init());
        agg.accumulate(total, row);
    }

    let mut out = Vec::with_capacity(l.len());
    for row in l {
        let total = table.get(&row.key).cloned().unwrap_or_else(|| agg.init());
        out.push((row.clone(), agg.finish(total)));
    }
    out
}

/// `=`-GroupJoin hashing whichever side the size ratio favors.
///
/// Hashes `L` when `|L| * BUILD_LEFT_FACTOR < |R|`, otherwise `R`. Preserves
/// the order of `L` either way.
pub fn hash_adaptive<K, Lp, Rp, A>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
{
    if l.len() * BUILD_LEFT_FACTOR < r.len() {
        hash_build_left(l, r, agg)
    } else {
        hash_build_right(l, r, agg)
    }
}

/// `=`-GroupJoin keeping one `(payload, state)` pair per left row in a
/// single key-grouped table.
///
/// Emits in table order, not `L` order.
pub fn hash_grouped<K, Lp, Rp, A>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
{
    let mut table: HashMap<&K, Vec<(Lp, A::Acc)>> = HashMap::with_capacity(l.len());
    for row in l {
        table
            .entry(&row.key)
            .or_default()
            .push((row.value.clone(), agg.init()));
    }

    for row in r {
        if let Some(group) = table.get_mut(&row.key) {
            for (_, total) in group {
                agg.accumulate(total, row);
            }
        }
    }

    let mut out = Vec::with_capacity(l.len());
    for (key, group) in table {
        for (value, total) in group {
            out.push((Row::new(key.clone(), value), agg.finish(total)));
        }
    }
    out
}

/// `=`-GroupJoin fast path for a left relation with **unique** keys: one
/// `(payload, state)` pair per key, no per-key group vectors.
///
/// With duplicate left keys only the first payload survives; callers are
/// expected to know their keys are unique. Emits in table order.
pub fn hash_unique<K, Lp, Rp, A>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
{
    let mut table: HashMap<&K, (Lp, A::Acc)> = HashMap::with_capacity(l.len());
    for row in l {
        table
            .entry(&row.key)
            .or_insert_with(|| (row.value.clone(), agg.init()));
    }

    for row in r {
        if let Some((_, total)) = table.get_mut(&row.key) {
            agg.accumulate(total, row);
        }
    }

    let mut out = Vec::with_capacity(l.len());
    for (key, (value, total)) in table {
        out.push((Row::new(key.clone(), value), agg.finish(total)));
    }
    out
}

/// `=`-GroupJoin over inputs **already sorted** ascending by key, merging
/// with a single advancing cursor over `R`.
///
/// Computes one state per distinct left key and reuses it for duplicates.
/// Preserves the (sorted) order of `L`.
pub fn merge_sorted<K, Lp, Rp, A>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound + Ord,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
{
    let mut out = Vec::with_capacity(l.len());
    let Some(first) = l.first() else {
        return out;
    };

    let mut ri = 0;
    let mut total = agg.init();

    // First left key: skip the smaller right keys, then take the equal run.
    let mut prev_key = &first.key;
    while ri < r.len() && r[ri].key < *prev_key {
        ri += 1;
    }
    while ri < r.len() && r[ri].key == *prev_key {
        agg.accumulate(&mut total, &r[ri]);
        ri += 1;
    }

    for row in l {
        if row.key != *prev_key {
            total = agg.init();
            while ri < r.len() && r[ri].key < row.key {
                ri += 1;
            }
            while ri < r.len() && r[ri].key == row.key {
                agg.accumulate(&mut total, &r[ri]);
                ri += 1;
            }
            prev_key = &row.key;
        }
        out.push((row.clone(), agg.finish(total.clone())));
    }
    out
}

/// `=`-GroupJoin that sorts both inputs in place, then calls
/// [`merge_sorted`]. Output is key-ascending.
pub fn sort_merge<K, Lp, Rp, A>(
    l: &mut Relation<K, Lp>,
    r: &mut Relation<K, Rp>,
    agg: &A,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound + Ord,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
{
    l.sort_unstable_by(|a, b| a.key.cmp(&b.key));
    r.sort_unstable_by(|a, b| a.key.cmp(&b.key));
    merge_sorted(l, r, agg)
}

// Slice forms used by the parallel drivers.

/// Slice form of [`hash_build_left`]; `out.len()` must equal `l.len()`.
pub fn hash_build_left_into<K, Lp, Rp, A>(
    l: &[Row<K, Lp>],
    r: &[Row<K, Rp>],
    out: &mut [(Row<K, Lp>, A::Output)],
    agg: &A,
) where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
{
    debug_assert_eq!(l.len(), out.len());
    let mut table: HashMap<&K, A::Acc> = HashMap::with_capacity(l.len());
    for row in l {
        table.entry(&row.key).or_insert_with(|| agg.init());
    }

    for row in r {
        if let Some(total) = table.get_mut(&row.key) {
            agg.accumulate(total, row);
        }
    }

    for (row, slot) in l.iter().zip(out) {
        *slot = (row.clone(), agg.finish(table[&row.key].clone()));
    }
}

/// Slice form of [`hash_build_right`]; `out.len()` must equal `l.len()`.
pub fn hash_build_right_into<K, Lp, Rp, A>(
    l: &[Row<K, Lp>],
    r: &[Row<K, Rp>],
    out: &mut [(Row<K, Lp>, A::Output)],
    agg: &A,
) where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
{
    debug_assert_eq!(l.len(), out.len());
    let mut table: HashMap<&K, A::Acc> = HashMap::with_capacity(r.len());
    for row in r {
        let total = table.entry(&row.key).or_insert_with(|| agg.init());
        agg.accumulate(total, row);
    }

    for (row, slot) in l.iter().zip(out) {
        let total = table.get(&row.key).cloned().unwrap_or_else(|| agg.init());
        *slot = (row.clone(), agg.finish(total));
    }
}

/// Slice form of [`hash_adaptive`]; `out.len()` must equal `l.len()`.
pub fn hash_adaptive_into<K, Lp, Rp, A>(
    l: &[Row<K, Lp>],
    r: &[Row<K, Rp>],
    out: &mut [(Row<K, Lp>, A::Output)],
    agg: &A,
) where
    K: GJBound + Hash + Eq,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
{
    if l.len() * BUILD_LEFT_FACTOR < r.len() {
        hash_build_left_into(l, r, out, agg);
    } else {
        hash_build_right_into(l, r, out, agg);
    }
}
