//! Less-than (`<`) GroupJoin engines.
//!
//! For each left row, aggregate every right row whose key is **strictly
//! greater** than the left key. Both strategies sort, walk the key space
//! from the top down, and let a running state grow as the left key shrinks,
//! so each right row is folded in exactly once.

use crate::aggregate::{Aggregate, CombineAggregate};
use crate::row::{GJBound, GroupJoinResult, Relation, Row};
use std::collections::HashMap;
use std::hash::Hash;

/// `<`-GroupJoin sorting both inputs **descending** in place, then merging
/// with a running state.
///
/// Walking `L` from the largest key down, every right row with a strictly
/// greater key is folded into the running state before the left row is
/// emitted. Output is key-descending.
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
    let mut out = Vec::with_capacity(l.len());
    sort_merge_run(l, r, &mut out, agg.init(), agg);
    out
}

/// Slice form of [`sort_merge`] with a carried-in starting state.
///
/// The parallel driver hands each partition the suffix total of all
/// higher-keyed partitions as `carry`, so the running state starts where
/// the partition above left off. `out.len()` must equal `l.len()`.
pub fn sort_merge_into<K, Lp, Rp, A>(
    l: &mut [Row<K, Lp>],
    r: &mut [Row<K, Rp>],
    out: &mut [(Row<K, Lp>, A::Output)],
    carry: A::Acc,
    agg: &A,
) where
    K: GJBound + Ord,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
{
    debug_assert_eq!(l.len(), out.len());
    l.sort_unstable_by(|a, b| b.key.cmp(&a.key));
    r.sort_unstable_by(|a, b| b.key.cmp(&a.key));

    let mut total = carry;
    let mut ri = 0;
    for (row, slot) in l.iter().zip(out) {
        while ri < r.len() && row.key < r[ri].key {
            agg.accumulate(&mut total, &r[ri]);
            ri += 1;
        }
        *slot = (row.clone(), agg.finish(total.clone()));
    }
}

fn sort_merge_run<K, Lp, Rp, A>(
    l: &mut [Row<K, Lp>],
    r: &mut [Row<K, Rp>],
    out: &mut Vec<(Row<K, Lp>, A::Output)>,
    carry: A::Acc,
    agg: &A,
) where
    K: GJBound + Ord,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
{
    l.sort_unstable_by(|a, b| b.key.cmp(&a.key));
    r.sort_unstable_by(|a, b| b.key.cmp(&a.key));

    let mut total = carry;
    let mut ri = 0;
    for row in l.iter() {
        while ri < r.len() && row.key < r[ri].key {
            agg.accumulate(&mut total, &r[ri]);
            ri += 1;
        }
        out.push((row.clone(), agg.finish(total.clone())));
    }
}

/// `<`-GroupJoin routing each right row to the **nearest strictly smaller**
/// left key, then propagating downwards with one combine per distinct key.
///
/// Sorts `L` ascending in place and seeds a `key -> state` table. Each right
/// row with a key above the smallest left key is binary-searched to the
/// largest left key strictly below it and accumulated into that single slot;
/// the closing walk over `L` in descending key order then folds each slot
/// into a running state exactly once, which is where the associativity of
/// `combine` pays for the table build. Output is key-descending.
pub fn hash_prefix<K, Lp, Rp, A>(
    l: &mut Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound + Hash + Ord,
    Lp: GJBound,
    Rp: GJBound,
    A: CombineAggregate<K, Rp>,
{
    if l.is_empty() {
        return Vec::new();
    }
    l.sort_unstable_by(|a, b| a.key.cmp(&b.key));
    let l: &[Row<K, Lp>] = l;

    let mut table: HashMap<&K, A::Acc> = HashMap::with_capacity(l.len());
    for row in l {
        table.entry(&row.key).or_insert_with(|| agg.init());
    }

    let min_key = &l[0].key;
    for row in r {
        // Rows at or below the smallest left key have no join partners.
        if *min_key < row.key {
            let at = l.partition_point(|lrow| lrow.key < row.key);
            let target = &l[at - 1].key;
            let slot = table.get_mut(target).expect("every left key is seeded");
            agg.accumulate(slot, row);
        }
    }

    let mut out = Vec::with_capacity(l.len());
    let mut total = agg.init();
    let mut prev_key = &l[l.len() - 1].key;
    agg.combine(&mut total, table[prev_key].clone());

    for row in l.iter().rev() {
        if row.key < *prev_key {
            prev_key = &row.key;
            agg.combine(&mut total, table[prev_key].clone());
        }
        out.push((row.clone(), agg.finish(total.clone())));
    }
    out
}
