//! Statistical aggregates: `Avg`

use crate::aggregate::{Aggregate, CombineAggregate, Opt, SubtractAggregate};
use crate::row::{GJBound, Row};

/* ===================== Avg ===================== */

/// Mean of the payloads as `f64`; invalid over an empty group.
///
/// Payloads must be convertible into `f64` via `Into<f64>`.
///
/// - State: `(sum_f64, count_u64)`
/// - Output: [`Opt<f64>`]
///
/// Capabilities: combine, subtract.
#[derive(Clone, Copy, Debug, Default)]
pub struct Avg;

impl<K, V> Aggregate<K, V> for Avg
where
    V: GJBound + Into<f64>,
{
    type Acc = (f64, u64);
    type Output = Opt<f64>;

    fn init(&self) -> (f64, u64) {
        (0.0, 0)
    }

    fn accumulate(&self, total: &mut (f64, u64), row: &Row<K, V>) {
        total.0 += row.value.clone().into();
        total.1 += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(&self, total: (f64, u64)) -> Opt<f64> {
        if total.1 == 0 {
            Opt::default()
        } else {
            Opt::new(total.0 / total.1 as f64)
        }
    }
}

impl<K, V> CombineAggregate<K, V> for Avg
where
    V: GJBound + Into<f64>,
{
    fn combine(&self, total: &mut (f64, u64), other: (f64, u64)) {
        total.0 += other.0;
        total.1 += other.1;
    }
}

impl<K, V> SubtractAggregate<K, V> for Avg
where
    V: GJBound + Into<f64>,
{
    fn subtract(&self, total: (f64, u64), other: (f64, u64)) -> (f64, u64) {
        (total.0 - other.0, total.1 - other.1)
    }
}
