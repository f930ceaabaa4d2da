//! Tunables for the parallel operators.

use anyhow::{Context, Result};

/// Upper bound on [`ParallelConfig::partition_rows`].
pub const MAX_PARTITION_ROWS: usize = 1_000_000;

/// Sizing knobs passed into every parallel operator.
///
/// There is no process-wide state: each call carries its own configuration,
/// and each top-level operator builds its own bounded worker pool from it,
/// so nested calls cannot oversubscribe cores.
#[derive(Clone, Copy, Debug)]
pub struct ParallelConfig {
    /// Target number of left rows per partition (at most
    /// [`MAX_PARTITION_ROWS`]).
    pub partition_rows: usize,
    /// Worker pool width.
    pub threads: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            partition_rows: 1 << 16,
            threads: num_cpus::get().max(1),
        }
    }
}

impl ParallelConfig {
    /// Configuration with explicit sizing.
    ///
    /// # Panics
    /// If `partition_rows` is zero or above [`MAX_PARTITION_ROWS`], or
    /// `threads` is zero.
    #[must_use]
    pub fn new(partition_rows: usize, threads: usize) -> Self {
        assert!(
            (1..=MAX_PARTITION_ROWS).contains(&partition_rows),
            "partition_rows must be in 1..={MAX_PARTITION_ROWS}"
        );
        assert!(threads > 0, "the worker pool needs at least one thread");
        Self {
            partition_rows,
            threads,
        }
    }

    /// Number of partitions used for a left relation of `left_rows` rows.
    #[must_use]
    pub fn partition_count(&self, left_rows: usize) -> usize {
        (left_rows / self.partition_rows.max(1)).max(1)
    }

    pub(crate) fn build_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .context("building the bounded worker pool")
    }
}
