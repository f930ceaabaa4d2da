//! Parallel partitioning engine.
//!
//! [`partition_in_place`] permutes a relation so that all rows mapping to
//! partition `p` occupy the contiguous range `bounds[p]..bounds[p + 1]`.
//! Three phases run on the caller's worker pool:
//!
//! 1. **Count** — the relation is split into one contiguous slice per
//!    worker; each worker bucketizes its slice by partition index and runs
//!    the variant's per-row side effect (subtotal collection).
//! 2. **Prefix** — a serial barrier sums the per-worker bucket sizes into
//!    the partition bounds and post-processes the subtotals.
//! 3. **Scatter** — workers copy the buckets back into the relation, one
//!    worker per destination partition, each writing a disjoint range.
//!
//! Within a partition the rows land in worker order, then original slice
//! order. The two richer variants piggyback aggregate work on the count
//! pass: [`partition_with_total`] also returns the global total over all
//! rows (for the `≠` operators), and [`partition_with_suffix_totals`]
//! returns per-partition totals suffix-combined in partition order (for the
//! `<` operator, whose partitions are totally ordered by key).

use crate::aggregate::CombineAggregate;
use crate::row::{GJBound, Row};
use rayon::prelude::*;

/// Maps keys to partition indices in `0..partitions`.
///
/// Both relations of one parallel join must be sharded through the same
/// partitioner, so equal keys always meet in the same partition.
pub trait PartitionFn<K>: Sync {
    fn partition_of(&self, key: &K) -> usize;
}

/// Integer-like keys that can be reduced to a partition index by modulo.
pub trait PartitionIndex {
    fn index(&self) -> u64;
}

macro_rules! impl_partition_index {
    ($($t:ty),* $(,)?) => {
        $(impl PartitionIndex for $t {
            fn index(&self) -> u64 {
                *self as u64
            }
        })*
    };
}

impl_partition_index!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// `key mod P` partitioner; uniform on dense integer keys.
///
/// Keys go through [`PartitionIndex::index`] first, so negative keys
/// partition deterministically.
#[derive(Clone, Copy, Debug)]
pub struct ModPartition {
    partitions: u64,
}

impl ModPartition {
    #[must_use]
    pub fn new(partitions: usize) -> Self {
        assert!(partitions > 0, "a partitioner needs at least one partition");
        Self {
            partitions: partitions as u64,
        }
    }
}

impl<K: PartitionIndex> PartitionFn<K> for ModPartition {
    fn partition_of(&self, key: &K) -> usize {
        (key.index() % self.partitions) as usize
    }
}

/// Range partitioner over `P - 1` sorted dividers.
///
/// Partition `p` holds the keys between dividers `p - 1` and `p`, so the
/// partitions' key ranges are totally ordered — the property the `<`
/// parallel operator builds on.
#[derive(Clone, Debug)]
pub struct RangePartition<K> {
    dividers: Vec<K>,
}

impl<K: Ord + Clone> RangePartition<K> {
    /// Dividers sampled at a fixed stride from the keys of `rel`.
    ///
    /// The stride sampling gives balanced partitions when `rel` is roughly
    /// ordered or at least representative; a skewed sample degrades balance,
    /// never correctness. `rel` must be non-empty when `partitions > 1`.
    #[must_use]
    pub fn from_samples<V>(rel: &[Row<K, V>], partitions: usize) -> Self {
        if partitions <= 1 {
            return Self {
                dividers: Vec::new(),
            };
        }
        assert!(
            !rel.is_empty(),
            "cannot sample range dividers from an empty relation"
        );
        let stride = rel.len() / (partitions - 1);
        let mut dividers: Vec<K> = (0..partitions - 1)
            .map(|i| rel[i * stride].key.clone())
            .collect();
        dividers.sort_unstable();
        Self { dividers }
    }
}

impl<K: Ord + Sync> PartitionFn<K> for RangePartition<K> {
    fn partition_of(&self, key: &K) -> usize {
        self.dividers.partition_point(|d| d <= key)
    }
}

/// Permute `rel` so each partition occupies one contiguous range.
///
/// Returns the partition bounds: `partitions + 1` offsets with
/// `bounds[0] == 0` and `bounds[partitions] == rel.len()`.
pub fn partition_in_place<K, V, P>(
    pool: &rayon::ThreadPool,
    rel: &mut [Row<K, V>],
    partitions: usize,
    pf: &P,
) -> Vec<usize>
where
    K: GJBound,
    V: GJBound,
    P: PartitionFn<K>,
{
    let (bounds, _) = partition_core(pool, rel, partitions, pf, || (), |_, _, _| {});
    bounds
}

/// [`partition_in_place`] that also accumulates the global aggregate total
/// over all rows, combining the per-worker subtotals in worker order.
pub fn partition_with_total<K, V, P, A>(
    pool: &rayon::ThreadPool,
    rel: &mut [Row<K, V>],
    partitions: usize,
    pf: &P,
    agg: &A,
) -> (Vec<usize>, A::Acc)
where
    K: GJBound,
    V: GJBound,
    P: PartitionFn<K>,
    A: CombineAggregate<K, V>,
{
    let (bounds, subtotals) = partition_core(
        pool,
        rel,
        partitions,
        pf,
        || agg.init(),
        |total, _, row| agg.accumulate(total, row),
    );

    let mut total = agg.init();
    for subtotal in subtotals {
        agg.combine(&mut total, subtotal);
    }
    (bounds, total)
}

/// [`partition_in_place`] that also returns `partitions + 1` suffix totals:
/// `totals[p]` is the aggregate over every row in partitions **above** `p`,
/// and `totals[partitions]` is `init`.
///
/// With a [`RangePartition`], `totals[p]` is exactly the state the
/// descending sort-merge carries into partition `p`.
pub fn partition_with_suffix_totals<K, V, P, A>(
    pool: &rayon::ThreadPool,
    rel: &mut [Row<K, V>],
    partitions: usize,
    pf: &P,
    agg: &A,
) -> (Vec<usize>, Vec<A::Acc>)
where
    K: GJBound,
    V: GJBound,
    P: PartitionFn<K>,
    A: CombineAggregate<K, V>,
{
    let (bounds, per_worker) = partition_core(
        pool,
        rel,
        partitions,
        pf,
        || vec![agg.init(); partitions],
        |subtotals, p, row| agg.accumulate(&mut subtotals[p], row),
    );

    let mut own: Vec<A::Acc> = (0..partitions).map(|_| agg.init()).collect();
    for worker in per_worker {
        for (p, subtotal) in worker.into_iter().enumerate() {
            agg.combine(&mut own[p], subtotal);
        }
    }
    (bounds, suffix_combine(own, agg))
}

/// Turn per-partition totals into suffix totals: entry `p` of the result
/// covers the partitions strictly above `p`, entry `partitions` is `init`.
/// Partition totals are folded in ascending partition order.
pub(crate) fn suffix_combine<K, V, A>(own: Vec<A::Acc>, agg: &A) -> Vec<A::Acc>
where
    A: CombineAggregate<K, V>,
{
    let partitions = own.len();
    let mut totals: Vec<A::Acc> = (0..=partitions).map(|_| agg.init()).collect();
    for p in (0..partitions.saturating_sub(1)).rev() {
        let mut carry = own[p + 1].clone();
        agg.combine(&mut carry, totals[p + 1].clone());
        totals[p] = carry;
    }
    totals
}

/// Shared three-phase skeleton. `seed` creates one side-effect state per
/// worker slice; `visit` sees every row once, with its partition index,
/// during the count pass.
fn partition_core<K, V, P, A, S, F>(
    pool: &rayon::ThreadPool,
    rel: &mut [Row<K, V>],
    partitions: usize,
    pf: &P,
    seed: S,
    visit: F,
) -> (Vec<usize>, Vec<A>)
where
    K: GJBound,
    V: GJBound,
    P: PartitionFn<K>,
    A: Send,
    S: Fn() -> A + Sync,
    F: Fn(&mut A, usize, &Row<K, V>) + Sync,
{
    let workers = pool.current_num_threads().max(1);
    let slice_len = rel.len().div_ceil(workers).max(1);

    // Count: bucketize each worker slice, running the per-row side effect.
    let per_worker: Vec<(Vec<Vec<Row<K, V>>>, A)> = pool.install(|| {
        rel.par_chunks(slice_len)
            .map(|slice| {
                let mut buckets: Vec<Vec<Row<K, V>>> = vec![Vec::new(); partitions];
                let mut state = seed();
                for row in slice {
                    let p = pf.partition_of(&row.key);
                    visit(&mut state, p, row);
                    buckets[p].push(row.clone());
                }
                (buckets, state)
            })
            .collect()
    });

    // Prefix: bucket sizes become the partition bounds.
    let mut bounds = Vec::with_capacity(partitions + 1);
    bounds.push(0);
    let mut offset = 0;
    for p in 0..partitions {
        for (buckets, _) in &per_worker {
            offset += buckets[p].len();
        }
        bounds.push(offset);
    }

    // Regroup the buckets by destination partition, keeping worker order.
    let mut states = Vec::with_capacity(per_worker.len());
    let mut grouped: Vec<Vec<Vec<Row<K, V>>>> = (0..partitions).map(|_| Vec::new()).collect();
    for (buckets, state) in per_worker {
        states.push(state);
        for (p, bucket) in buckets.into_iter().enumerate() {
            grouped[p].push(bucket);
        }
    }

    // Scatter: one worker per destination partition, disjoint ranges.
    let parts = carve_mut(rel, &bounds);
    pool.install(|| {
        parts
            .into_par_iter()
            .zip(grouped)
            .for_each(|(dst, worker_buckets)| {
                let mut at = 0;
                for bucket in worker_buckets {
                    for row in bucket {
                        dst[at] = row;
                        at += 1;
                    }
                }
            });
    });

    (bounds, states)
}

/// Split `data` into the consecutive immutable ranges described by `bounds`.
pub(crate) fn carve<'a, T>(data: &'a [T], bounds: &[usize]) -> Vec<&'a [T]> {
    let mut rest = data;
    let mut parts = Vec::with_capacity(bounds.len().saturating_sub(1));
    for window in bounds.windows(2) {
        let (head, tail) = rest.split_at(window[1] - window[0]);
        parts.push(head);
        rest = tail;
    }
    parts
}

/// Split `data` into the consecutive mutable ranges described by `bounds`.
pub(crate) fn carve_mut<'a, T>(data: &'a mut [T], bounds: &[usize]) -> Vec<&'a mut [T]> {
    let mut rest = data;
    let mut parts = Vec::with_capacity(bounds.len().saturating_sub(1));
    for window in bounds.windows(2) {
        let (head, tail) = rest.split_at_mut(window[1] - window[0]);
        parts.push(head);
        rest = tail;
    }
    parts
}
