//! Basic arithmetic aggregates: SumN, Sum, Min, Max, Count

use crate::aggregate::{Aggregate, CombineAggregate, Opt, SubtractAggregate};
use crate::row::{GJBound, Row};
use num_traits::Bounded;
use std::marker::PhantomData;
use std::mem::take;
use std::ops::{Add, Sub};

/* ===================== SumN<T> ===================== */

/// Sum of payloads; an empty group sums to `T::default()`.
///
/// - State: `T`
/// - Output: `T`
///
/// Capabilities: combine, subtract. Overflow follows the payload type's own
/// arithmetic.
#[derive(Clone, Copy, Debug, Default)]
pub struct SumN<T>(pub PhantomData<T>);
impl<T> SumN<T> {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K, T> Aggregate<K, T> for SumN<T>
where
    T: GJBound + Default + Add<Output = T>,
{
    type Acc = T;
    type Output = T;

    fn init(&self) -> T {
        T::default()
    }

    fn accumulate(&self, total: &mut T, row: &Row<K, T>) {
        *total = take(total) + row.value.clone();
    }

    fn finish(&self, total: T) -> T {
        total
    }
}

impl<K, T> CombineAggregate<K, T> for SumN<T>
where
    T: GJBound + Default + Add<Output = T>,
{
    fn combine(&self, total: &mut T, other: T) {
        *total = take(total) + other;
    }
}

impl<K, T> SubtractAggregate<K, T> for SumN<T>
where
    T: GJBound + Default + Add<Output = T> + Sub<Output = T>,
{
    fn subtract(&self, total: T, other: T) -> T {
        total - other
    }
}

/* ===================== Sum<T> ===================== */

/// Empty-aware sum: the result is valid only if at least one row
/// contributed.
///
/// - State: [`Opt<T>`]
/// - Output: [`Opt<T>`]
///
/// Capabilities: combine, subtract. `subtract` keeps the value arithmetic
/// and ORs the validity flags, so removing a group from a valid total never
/// turns it invalid.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum<T>(pub PhantomData<T>);
impl<T> Sum<T> {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K, T> Aggregate<K, T> for Sum<T>
where
    T: GJBound + Default + Add<Output = T>,
{
    type Acc = Opt<T>;
    type Output = Opt<T>;

    fn init(&self) -> Opt<T> {
        Opt::default()
    }

    fn accumulate(&self, total: &mut Opt<T>, row: &Row<K, T>) {
        total.value = take(&mut total.value) + row.value.clone();
        total.valid = true;
    }

    fn finish(&self, total: Opt<T>) -> Opt<T> {
        total
    }
}

impl<K, T> CombineAggregate<K, T> for Sum<T>
where
    T: GJBound + Default + Add<Output = T>,
{
    fn combine(&self, total: &mut Opt<T>, other: Opt<T>) {
        if other.valid {
            total.value = take(&mut total.value) + other.value;
            total.valid = true;
        }
    }
}

impl<K, T> SubtractAggregate<K, T> for Sum<T>
where
    T: GJBound + Default + Add<Output = T> + Sub<Output = T>,
{
    fn subtract(&self, mut total: Opt<T>, other: Opt<T>) -> Opt<T> {
        total.value = take(&mut total.value) - other.value;
        total.valid |= other.valid;
        total
    }
}

/* ===================== Min<T> / Max<T> ===================== */

/// Minimum payload; invalid over an empty group.
///
/// - State: [`Opt<T>`] seeded with `T::max_value()`
/// - Output: [`Opt<T>`]
///
/// Capabilities: combine.
#[derive(Clone, Copy, Debug, Default)]
pub struct Min<T>(pub PhantomData<T>);
impl<T> Min<T> {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K, T> Aggregate<K, T> for Min<T>
where
    T: GJBound + Ord + Bounded,
{
    type Acc = Opt<T>;
    type Output = Opt<T>;

    fn init(&self) -> Opt<T> {
        Opt::with_sentinel(T::max_value())
    }

    fn accumulate(&self, total: &mut Opt<T>, row: &Row<K, T>) {
        if !total.valid || row.value < total.value {
            total.value = row.value.clone();
            total.valid = true;
        }
    }

    fn finish(&self, total: Opt<T>) -> Opt<T> {
        total
    }
}

impl<K, T> CombineAggregate<K, T> for Min<T>
where
    T: GJBound + Ord + Bounded,
{
    fn combine(&self, total: &mut Opt<T>, other: Opt<T>) {
        if other.valid && (!total.valid || other.value < total.value) {
            *total = other;
        }
    }
}

/// Maximum payload; invalid over an empty group.
///
/// - State: [`Opt<T>`] seeded with `T::min_value()`
/// - Output: [`Opt<T>`]
///
/// Capabilities: combine.
#[derive(Clone, Copy, Debug, Default)]
pub struct Max<T>(pub PhantomData<T>);
impl<T> Max<T> {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K, T> Aggregate<K, T> for Max<T>
where
    T: GJBound + Ord + Bounded,
{
    type Acc = Opt<T>;
    type Output = Opt<T>;

    fn init(&self) -> Opt<T> {
        Opt::with_sentinel(T::min_value())
    }

    fn accumulate(&self, total: &mut Opt<T>, row: &Row<K, T>) {
        if !total.valid || row.value > total.value {
            total.value = row.value.clone();
            total.valid = true;
        }
    }

    fn finish(&self, total: Opt<T>) -> Opt<T> {
        total
    }
}

impl<K, T> CombineAggregate<K, T> for Max<T>
where
    T: GJBound + Ord + Bounded,
{
    fn combine(&self, total: &mut Opt<T>, other: Opt<T>) {
        if other.valid && (!total.valid || other.value > total.value) {
            *total = other;
        }
    }
}

/* ===================== Count ===================== */

/// Number of joined rows, regardless of payload type.
///
/// - State: `u64`
/// - Output: `u64`
///
/// Capabilities: combine, subtract.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count;

impl<K, V> Aggregate<K, V> for Count {
    type Acc = u64;
    type Output = u64;

    fn init(&self) -> u64 {
        0
    }

    fn accumulate(&self, total: &mut u64, _row: &Row<K, V>) {
        *total += 1;
    }

    fn finish(&self, total: u64) -> u64 {
        total
    }
}

impl<K, V> CombineAggregate<K, V> for Count {
    fn combine(&self, total: &mut u64, other: u64) {
        *total += other;
    }
}

impl<K, V> SubtractAggregate<K, V> for Count {
    fn subtract(&self, total: u64, other: u64) -> u64 {
        total - other
    }
}
