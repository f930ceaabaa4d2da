use groupjoin::aggregate::{Avg, CombineAggregate, Count, Max, Min, Sum, SumN};
use groupjoin::testing::{assert_same_results, relation_of};
use groupjoin::{Relation, Row, less, nested};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Debug;

fn random_relation(rng: &mut StdRng, rows: usize, key_pool: i64) -> Relation<i64, i32> {
    (0..rows)
        .map(|i| Row::new(rng.gen_range(0..key_pool), i as i32))
        .collect()
}

fn check_all_strategies<A>(l: &Relation<i64, i32>, r: &Relation<i64, i32>, agg: &A)
where
    A: CombineAggregate<i64, i32>,
    A::Output: Clone + PartialEq + Debug,
{
    let reference = nested::nested(l, r, agg, |a, b| a < b);

    let (mut ls, mut rs) = (l.clone(), r.clone());
    assert_same_results(less::sort_merge(&mut ls, &mut rs, agg), reference.clone());

    let mut ls = l.clone();
    assert_same_results(less::hash_prefix(&mut ls, r, agg), reference);
}

#[test]
fn matches_the_worked_example() {
    let mut l = relation_of(vec![(1, "a"), (2, "b"), (1, "c")]);
    let mut r = relation_of(vec![(1, 10i64), (1, 5), (3, 7)]);

    // Only the key-3 row is strictly greater than any left key here.
    let res = less::sort_merge(&mut l, &mut r, &SumN::new());
    for (_, total) in res {
        assert_eq!(total, 7);
    }
}

#[test]
fn all_strategies_match_nested_reference() {
    let mut rng = StdRng::seed_from_u64(0x1e01);
    for _ in 0..4 {
        let l = random_relation(&mut rng, 250, 30);
        let r = random_relation(&mut rng, 400, 30);

        check_all_strategies(&l, &r, &SumN::new());
        check_all_strategies(&l, &r, &Sum::new());
        check_all_strategies(&l, &r, &Min::new());
        check_all_strategies(&l, &r, &Max::new());
        check_all_strategies(&l, &r, &Count);
        check_all_strategies(&l, &r, &Avg);
    }
}

#[test]
fn each_right_row_counts_once_per_smaller_key() {
    let mut l = relation_of(vec![(1, 0i32), (2, 1), (3, 2)]);
    let mut r = relation_of(vec![(2, 10i32), (4, 100)]);

    let res = less::sort_merge(&mut l, &mut r, &SumN::new());
    // Descending output: key 3 sees only 100, key 2 the same, key 1 adds 10.
    assert_eq!(
        res,
        vec![
            (Row::new(3, 2), 100),
            (Row::new(2, 1), 100),
            (Row::new(1, 0), 110),
        ]
    );
}

#[test]
fn hash_prefix_handles_duplicate_left_keys() {
    let mut l = relation_of(vec![(5, 0i32), (1, 1), (5, 2), (3, 3)]);
    let r = relation_of(vec![(2, 1i32), (4, 2), (6, 4)]);

    let reference = nested::nested(&l, &r, &SumN::new(), |a, b| a < b);
    let res = less::hash_prefix(&mut l, &r, &SumN::new());
    assert_same_results(res, reference);
}

#[test]
fn empty_inputs_are_handled() {
    let mut empty_l: Relation<i64, i32> = Vec::new();
    let mut r = relation_of(vec![(1, 1i32)]);
    assert!(less::sort_merge(&mut empty_l, &mut r, &SumN::new()).is_empty());
    assert!(less::hash_prefix(&mut empty_l, &r, &SumN::new()).is_empty());

    let mut l = relation_of(vec![(1, 0i32)]);
    let mut empty_r: Relation<i64, i32> = Vec::new();
    let res = less::sort_merge(&mut l, &mut empty_r, &Min::<i32>::new());
    assert_eq!(res.len(), 1);
    assert_eq!(res[0].1.get(), None);
}

#[test]
fn largest_left_key_gets_the_empty_aggregate() {
    let mut l = relation_of(vec![(9, 0i32), (1, 1)]);
    let mut r = relation_of(vec![(9, 50i32), (5, 20)]);

    let res = less::sort_merge(&mut l, &mut r, &SumN::new());
    assert_eq!(res[0], (Row::new(9, 0), 0));
    assert_eq!(res[1], (Row::new(1, 1), 70));
}
