//! Parallel GroupJoin operators.
//!
//! Every operator here follows the same shape:
//!
//! 1. spawn a scoped helper thread that preallocates the output while the
//!    partition passes run;
//! 2. shard `L` and `R` into `P = max(|L| / partition_rows, 1)` key-aligned
//!    partitions (collecting the right-side totals the predicate needs);
//! 3. run the matching serial engine on each partition pair through the
//!    bounded worker pool, writing into disjoint pre-carved output ranges.
//!
//! The full-parallel family ([`equi`], [`uneq`], [`less`]) permutes both
//! relations in place with the two-pass partition engine. The simple family
//! ([`equi_simple`], [`uneq_simple`], [`less_simple`]) leaves the inputs
//! untouched and materializes per-partition vectors sequentially — one
//! scoped thread for `L` while the calling thread takes `R` — which is the
//! better trade at small partition counts.
//!
//! The output is prefilled with `(left row, finish(init()))` — the correct
//! result for rows without join partners — and every partition engine then
//! overwrites its whole range. Results come back in partition order:
//! unspecified for the modulo-partitioned `=`/`≠` flavors, key-ascending
//! across partitions (key-descending within) for `<`. Callers needing row
//! order must sort.
//!
//! An empty left relation is a contract violation and panics; worker-pool
//! construction is the only fallible step.
//!
//! # Example
//! ```
//! use groupjoin::aggregate::SumN;
//! use groupjoin::{parallel, ParallelConfig, Row};
//!
//! let mut l = vec![Row::new(1, "a"), Row::new(2, "b"), Row::new(1, "c")];
//! let mut r = vec![Row::new(1, 10i64), Row::new(1, 5), Row::new(3, 7)];
//! let config = ParallelConfig::new(2, 2);
//!
//! let mut res = parallel::equi(&mut l, &mut r, &SumN::new(), config)?;
//! res.sort_by_key(|(row, _)| (row.key, row.value));
//! assert_eq!(res[0].1, 15);
//! # anyhow::Result::<()>::Ok(())
//! ```

use crate::aggregate::{CombineAggregate, FullAggregate};
use crate::config::ParallelConfig;
use crate::equi;
use crate::less;
use crate::partition::{
    ModPartition, PartitionFn, PartitionIndex, RangePartition, carve, carve_mut,
    partition_in_place, partition_with_suffix_totals, partition_with_total, suffix_combine,
};
use crate::row::{GJBound, GroupJoinResult, Relation, Row};
use crate::uneq;
use anyhow::Result;
use rayon::prelude::*;
use std::hash::Hash;
use std::thread;

/// Parallel `=`-GroupJoin with in-place modulo partitioning.
///
/// Both relations are permuted into partition order; each partition runs
/// [`equi::hash_adaptive_into`].
pub fn equi<K, Lp, Rp, A>(
    l: &mut Relation<K, Lp>,
    r: &mut Relation<K, Rp>,
    agg: &A,
    config: ParallelConfig,
) -> Result<GroupJoinResult<K, Lp, A::Output>>
where
    K: GJBound + Hash + Eq + PartitionIndex,
    Lp: GJBound,
    Rp: GJBound,
    A: CombineAggregate<K, Rp>,
    A::Output: GJBound,
{
    assert!(
        !l.is_empty(),
        "parallel GroupJoin requires a non-empty left relation"
    );
    let pool = config.build_pool()?;
    let partitions = config.partition_count(l.len());
    let pf = ModPartition::new(partitions);
    let left_rows = l.len();

    let (mut out, bounds_l, bounds_r) = thread::scope(|scope| {
        let allocator = scope.spawn(move || Vec::with_capacity(left_rows));
        let bounds_l = partition_in_place(&pool, l, partitions, &pf);
        let bounds_r = partition_in_place(&pool, r, partitions, &pf);
        let out = allocator.join().expect("output allocator thread panicked");
        (out, bounds_l, bounds_r)
    });

    prefill(&pool, l, &mut out, agg.finish(agg.init()));

    let l_parts = carve(l, &bounds_l);
    let r_parts = carve(r, &bounds_r);
    let out_parts = carve_mut(&mut out, &bounds_l);
    pool.install(|| {
        l_parts
            .into_par_iter()
            .zip(r_parts)
            .zip(out_parts)
            .for_each(|((lp, rp), op)| equi::hash_adaptive_into(lp, rp, op, agg));
    });
    Ok(out)
}

/// Parallel `≠`-GroupJoin with in-place modulo partitioning.
///
/// The partition pass over `R` also produces the global total, which each
/// partition's [`uneq::hash_adaptive_into`] subtracts from.
pub fn uneq<K, Lp, Rp, A>(
    l: &mut Relation<K, Lp>,
    r: &mut Relation<K, Rp>,
    agg: &A,
    config: ParallelConfig,
) -> Result<GroupJoinResult<K, Lp, A::Output>>
where
    K: GJBound + Hash + Eq + PartitionIndex,
    Lp: GJBound,
    Rp: GJBound,
    A: FullAggregate<K, Rp>,
    A::Output: GJBound,
{
    assert!(
        !l.is_empty(),
        "parallel GroupJoin requires a non-empty left relation"
    );
    let pool = config.build_pool()?;
    let partitions = config.partition_count(l.len());
    let pf = ModPartition::new(partitions);
    let left_rows = l.len();

    let (mut out, bounds_l, bounds_r, total) = thread::scope(|scope| {
        let allocator = scope.spawn(move || Vec::with_capacity(left_rows));
        let bounds_l = partition_in_place(&pool, l, partitions, &pf);
        let (bounds_r, total) = partition_with_total(&pool, r, partitions, &pf, agg);
        let out = allocator.join().expect("output allocator thread panicked");
        (out, bounds_l, bounds_r, total)
    });

    prefill(&pool, l, &mut out, agg.finish(agg.init()));

    let l_parts = carve(l, &bounds_l);
    let r_parts = carve(r, &bounds_r);
    let out_parts = carve_mut(&mut out, &bounds_l);
    pool.install(|| {
        l_parts
            .into_par_iter()
            .zip(r_parts)
            .zip(out_parts)
            .for_each(|((lp, rp), op)| uneq::hash_adaptive_into(lp, rp, op, &total, agg));
    });
    Ok(out)
}

/// Parallel `<`-GroupJoin with in-place range partitioning.
///
/// Dividers sampled from `L` give partitions with totally ordered key
/// ranges; the partition pass over `R` returns suffix totals, and each
/// partition's descending [`less::sort_merge_into`] starts from the total
/// of everything above it.
pub fn less<K, Lp, Rp, A>(
    l: &mut Relation<K, Lp>,
    r: &mut Relation<K, Rp>,
    agg: &A,
    config: ParallelConfig,
) -> Result<GroupJoinResult<K, Lp, A::Output>>
where
    K: GJBound + Ord,
    Lp: GJBound,
    Rp: GJBound,
    A: CombineAggregate<K, Rp>,
    A::Output: GJBound,
{
    assert!(
        !l.is_empty(),
        "parallel GroupJoin requires a non-empty left relation"
    );
    let pool = config.build_pool()?;
    let partitions = config.partition_count(l.len());
    let pf = RangePartition::from_samples(l, partitions);
    let left_rows = l.len();

    let (mut out, bounds_l, bounds_r, totals) = thread::scope(|scope| {
        let allocator = scope.spawn(move || Vec::with_capacity(left_rows));
        let bounds_l = partition_in_place(&pool, l, partitions, &pf);
        let (bounds_r, totals) = partition_with_suffix_totals(&pool, r, partitions, &pf, agg);
        let out = allocator.join().expect("output allocator thread panicked");
        (out, bounds_l, bounds_r, totals)
    });

    prefill(&pool, l, &mut out, agg.finish(agg.init()));

    let l_parts = carve_mut(l, &bounds_l);
    let r_parts = carve_mut(r, &bounds_r);
    let out_parts = carve_mut(&mut out, &bounds_l);
    pool.install(|| {
        l_parts
            .into_par_iter()
            .zip(r_parts)
            .zip(out_parts)
            .zip(totals[..partitions].par_iter())
            .for_each(|(((lp, rp), op), carry)| {
                less::sort_merge_into(lp, rp, op, carry.clone(), agg);
            });
    });
    Ok(out)
}

/// Parallel `=`-GroupJoin over sequentially materialized partitions.
///
/// Leaves both inputs untouched: a scoped thread buckets `L` while the
/// calling thread buckets `R`, then the per-partition joins run in
/// parallel as in [`equi`].
pub fn equi_simple<K, Lp, Rp, A>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
    config: ParallelConfig,
) -> Result<GroupJoinResult<K, Lp, A::Output>>
where
    K: GJBound + Hash + Eq + PartitionIndex,
    Lp: GJBound,
    Rp: GJBound,
    A: CombineAggregate<K, Rp>,
    A::Output: GJBound,
{
    assert!(
        !l.is_empty(),
        "parallel GroupJoin requires a non-empty left relation"
    );
    let pool = config.build_pool()?;
    let partitions = config.partition_count(l.len());
    let pf = ModPartition::new(partitions);
    let left_rows = l.len();

    let (mut out, parts_l, parts_r) = thread::scope(|scope| {
        let allocator = scope.spawn(move || Vec::with_capacity(left_rows));
        let left = scope.spawn(|| split_rows(l, partitions, &pf));
        let parts_r = split_rows(r, partitions, &pf);
        let parts_l = left.join().expect("left partitioner thread panicked");
        let out = allocator.join().expect("output allocator thread panicked");
        (out, parts_l, parts_r)
    });

    let bounds = bucket_bounds(&parts_l);
    prefill_from_buckets(&parts_l, &mut out, agg.finish(agg.init()));

    let out_parts = carve_mut(&mut out, &bounds);
    pool.install(|| {
        parts_l
            .par_iter()
            .zip(&parts_r)
            .zip(out_parts)
            .for_each(|((lp, rp), op)| equi::hash_adaptive_into(lp, rp, op, agg));
    });
    Ok(out)
}

/// Parallel `≠`-GroupJoin over sequentially materialized partitions; the
/// `R` bucketing pass accumulates the global total inline.
pub fn uneq_simple<K, Lp, Rp, A>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
    config: ParallelConfig,
) -> Result<GroupJoinResult<K, Lp, A::Output>>
where
    K: GJBound + Hash + Eq + PartitionIndex,
    Lp: GJBound,
    Rp: GJBound,
    A: FullAggregate<K, Rp>,
    A::Output: GJBound,
{
    assert!(
        !l.is_empty(),
        "parallel GroupJoin requires a non-empty left relation"
    );
    let pool = config.build_pool()?;
    let partitions = config.partition_count(l.len());
    let pf = ModPartition::new(partitions);
    let left_rows = l.len();

    let (mut out, parts_l, parts_r, total) = thread::scope(|scope| {
        let allocator = scope.spawn(move || Vec::with_capacity(left_rows));
        let left = scope.spawn(|| split_rows(l, partitions, &pf));

        let mut total = agg.init();
        let mut parts_r: Vec<Vec<Row<K, Rp>>> = vec![Vec::new(); partitions];
        for row in r {
            parts_r[pf.partition_of(&row.key)].push(row.clone());
            agg.accumulate(&mut total, row);
        }

        let parts_l = left.join().expect("left partitioner thread panicked");
        let out = allocator.join().expect("output allocator thread panicked");
        (out, parts_l, parts_r, total)
    });

    let bounds = bucket_bounds(&parts_l);
    prefill_from_buckets(&parts_l, &mut out, agg.finish(agg.init()));

    let out_parts = carve_mut(&mut out, &bounds);
    pool.install(|| {
        parts_l
            .par_iter()
            .zip(&parts_r)
            .zip(out_parts)
            .for_each(|((lp, rp), op)| uneq::hash_adaptive_into(lp, rp, op, &total, agg));
    });
    Ok(out)
}

/// Parallel `<`-GroupJoin over sequentially materialized partitions; the
/// `R` bucketing pass collects per-partition totals, suffix-combined before
/// the joins launch.
pub fn less_simple<K, Lp, Rp, A>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
    config: ParallelConfig,
) -> Result<GroupJoinResult<K, Lp, A::Output>>
where
    K: GJBound + Ord,
    Lp: GJBound,
    Rp: GJBound,
    A: CombineAggregate<K, Rp>,
    A::Output: GJBound,
{
    assert!(
        !l.is_empty(),
        "parallel GroupJoin requires a non-empty left relation"
    );
    let pool = config.build_pool()?;
    let partitions = config.partition_count(l.len());
    let pf = RangePartition::from_samples(l, partitions);
    let left_rows = l.len();

    let (mut out, mut parts_l, mut parts_r, own) = thread::scope(|scope| {
        let allocator = scope.spawn(move || Vec::with_capacity(left_rows));
        let left = scope.spawn(|| split_rows(l, partitions, &pf));

        let mut own: Vec<A::Acc> = (0..partitions).map(|_| agg.init()).collect();
        let mut parts_r: Vec<Vec<Row<K, Rp>>> = vec![Vec::new(); partitions];
        for row in r {
            let p = pf.partition_of(&row.key);
            parts_r[p].push(row.clone());
            agg.accumulate(&mut own[p], row);
        }

        let parts_l = left.join().expect("left partitioner thread panicked");
        let out = allocator.join().expect("output allocator thread panicked");
        (out, parts_l, parts_r, own)
    });
    let totals = suffix_combine(own, agg);

    let bounds = bucket_bounds(&parts_l);
    prefill_from_buckets(&parts_l, &mut out, agg.finish(agg.init()));

    let out_parts = carve_mut(&mut out, &bounds);
    pool.install(|| {
        parts_l
            .par_iter_mut()
            .zip(parts_r.par_iter_mut())
            .zip(out_parts)
            .zip(totals[..partitions].par_iter())
            .for_each(|(((lp, rp), op), carry)| {
                less::sort_merge_into(lp, rp, op, carry.clone(), agg);
            });
    });
    Ok(out)
}

// One bucket per partition, rows in input order.
fn split_rows<K, V, P>(rel: &[Row<K, V>], partitions: usize, pf: &P) -> Vec<Vec<Row<K, V>>>
where
    K: GJBound,
    V: GJBound,
    P: PartitionFn<K>,
{
    let mut parts: Vec<Vec<Row<K, V>>> = vec![Vec::new(); partitions];
    for row in rel {
        parts[pf.partition_of(&row.key)].push(row.clone());
    }
    parts
}

fn bucket_bounds<T>(buckets: &[Vec<T>]) -> Vec<usize> {
    let mut bounds = Vec::with_capacity(buckets.len() + 1);
    bounds.push(0);
    let mut offset = 0;
    for bucket in buckets {
        offset += bucket.len();
        bounds.push(offset);
    }
    bounds
}

// Fill the preallocated output with the partitioned left rows paired with
// the empty aggregate; every partition engine overwrites its whole range.
fn prefill<K, Lp, S>(
    pool: &rayon::ThreadPool,
    l: &[Row<K, Lp>],
    out: &mut Vec<(Row<K, Lp>, S)>,
    empty: S,
) where
    K: GJBound,
    Lp: GJBound,
    S: GJBound,
{
    pool.install(|| {
        l.par_iter()
            .map(|row| (row.clone(), empty.clone()))
            .collect_into_vec(out);
    });
}

fn prefill_from_buckets<K, Lp, S>(
    buckets: &[Vec<Row<K, Lp>>],
    out: &mut Vec<(Row<K, Lp>, S)>,
    empty: S,
) where
    K: GJBound,
    Lp: GJBound,
    S: Clone,
{
    for bucket in buckets {
        for row in bucket {
            out.push((row.clone(), empty.clone()));
        }
    }
}
