//! # groupjoin
//!
//! **GroupJoin operators** over two in-memory relations, serial and
//! parallel. A GroupJoin fuses a theta-join with a grouping aggregation on
//! the left relation: for every row of `L` it produces one aggregate over
//! the payloads of the `R` rows whose keys relate to the `L` key under the
//! chosen predicate. Fusing the two steps avoids materializing the join and
//! opens up hashing, sorting, and partitioning strategies a separate
//! join-then-group plan cannot reach.
//!
//! ## Predicates and engines
//!
//! Three predicate flavors, each with several physical strategies:
//!
//! - [`equi`] (`=`) — hash-build-left/right, adaptive, grouped/unique
//!   single-table variants, merge on sorted inputs, sort-then-merge.
//! - [`uneq`] (`≠`) — hash and sort-merge engines built on the
//!   `subtract(total, per_key_total)` identity.
//! - [`less`] (`<`, right keys strictly greater) — descending sort-merge
//!   with a running state, hash-plus-prefix-combine.
//! - [`parallel`] — all three flavors again, sharded over key-aligned
//!   partitions and driven through a bounded work-stealing pool.
//! - [`nested`] — the quadratic reference, generic over the predicate.
//!
//! Engines that sort or partition take their inputs by `&mut` and permute
//! them; all others borrow immutably.
//!
//! ## Aggregates
//!
//! Reducers are values implementing the [`aggregate`] capability traits:
//! `init` / `accumulate` / `finish` always, `combine` and `subtract` when an
//! engine's bound asks for them. [`SumN`], [`Sum`], [`Min`], [`Max`],
//! [`Count`], and [`Avg`] ship in the [`aggregate`] module; custom reducers
//! implement the same traits.
//!
//! ## Quick start
//!
//! ```
//! use groupjoin::aggregate::SumN;
//! use groupjoin::{equi, Row};
//!
//! let l = vec![Row::new(1, "a"), Row::new(2, "b"), Row::new(1, "c")];
//! let r = vec![Row::new(1, 10i64), Row::new(1, 5), Row::new(3, 7)];
//!
//! let res = equi::hash_adaptive(&l, &r, &SumN::new());
//! assert_eq!(res[0].1, 15); // both rows with key 1 aggregate 10 + 5
//! assert_eq!(res[1].1, 0); // key 2 has no partners
//! assert_eq!(res[2].1, 15);
//! ```
//!
//! For the parallel operators, sizing comes in through [`ParallelConfig`];
//! see the [`parallel`] module.

pub mod aggregate;
pub mod config;
pub mod equi;
pub mod less;
pub mod nested;
pub mod parallel;
pub mod partition;
pub mod row;
pub mod testing;
pub mod uneq;

// General re-exports
pub use aggregate::{
    Aggregate, Avg, CombineAggregate, Count, FullAggregate, Max, Min, Opt, SubtractAggregate, Sum,
    SumN,
};
pub use config::{MAX_PARTITION_ROWS, ParallelConfig};
pub use partition::{ModPartition, PartitionFn, PartitionIndex, RangePartition};
pub use row::{GJBound, GroupJoinResult, Relation, Row};
