//! Nested-loop reference engine.
//!
//! Quadratic, allocation-free, and generic over the key predicate, so one
//! routine serves as the correctness reference for all three predicate
//! flavors. Preserves the order of `L`.

use crate::aggregate::Aggregate;
use crate::row::{GJBound, GroupJoinResult, Relation, Row};

/// GroupJoin by scanning all of `R` once per `L` row.
///
/// `pred(l_key, r_key)` decides whether a right row joins a left row; pass
/// `|a, b| a == b` for the `=` flavor, `|a, b| a != b` for `≠`, or
/// `|a, b| a < b` for `<`.
///
/// # Example
/// ```
/// use groupjoin::aggregate::SumN;
/// use groupjoin::{nested, Row};
///
/// let l = vec![Row::new(1, "a"), Row::new(2, "b")];
/// let r = vec![Row::new(1, 10i64), Row::new(1, 5), Row::new(3, 7)];
/// let res = nested::nested(&l, &r, &SumN::new(), |a, b| a == b);
/// assert_eq!(res[0].1, 15);
/// assert_eq!(res[1].1, 0);
/// ```
pub fn nested<K, Lp, Rp, A, P>(
    l: &Relation<K, Lp>,
    r: &Relation<K, Rp>,
    agg: &A,
    pred: P,
) -> GroupJoinResult<K, Lp, A::Output>
where
    K: GJBound,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
    P: Fn(&K, &K) -> bool,
{
    let mut out = Vec::with_capacity(l.len());
    for lrow in l {
        let mut total = agg.init();
        for rrow in r {
            if pred(&lrow.key, &rrow.key) {
                agg.accumulate(&mut total, rrow);
            }
        }
        out.push((lrow.clone(), agg.finish(total)));
    }
    out
}

/// Slice form of [`nested`]: joins `l` against `r` and writes one result per
/// left row into `out`. `out.len()` must equal `l.len()`.
pub fn nested_into<K, Lp, Rp, A, P>(
    l: &[Row<K, Lp>],
    r: &[Row<K, Rp>],
    out: &mut [(Row<K, Lp>, A::Output)],
    agg: &A,
    pred: P,
) where
    K: GJBound,
    Lp: GJBound,
    Rp: GJBound,
    A: Aggregate<K, Rp>,
    P: Fn(&K, &K) -> bool,
{
    debug_assert_eq!(l.len(), out.len());
    for (lrow, slot) in l.iter().zip(out) {
        let mut total = agg.init();
        for rrow in r {
            if pred(&lrow.key, &rrow.key) {
                agg.accumulate(&mut total, rrow);
            }
        }
        *slot = (lrow.clone(), agg.finish(total));
    }
}
