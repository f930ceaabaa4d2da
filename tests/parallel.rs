use anyhow::Result;
use groupjoin::aggregate::{Avg, Count, Max, Min, Sum, SumN};
use groupjoin::testing::{assert_same_results, relation_of};
use groupjoin::{ParallelConfig, Relation, Row, equi, less, parallel, uneq};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_relation(rng: &mut StdRng, rows: usize, key_pool: i64) -> Relation<i64, i32> {
    (0..rows)
        .map(|i| Row::new(rng.gen_range(0..key_pool), i as i32))
        .collect()
}

fn config() -> ParallelConfig {
    ParallelConfig::new(256, 4)
}

#[test]
fn parallel_equi_matches_serial_at_scale() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0xa001);
    let l = random_relation(&mut rng, 10_000, 1_000);
    let r = random_relation(&mut rng, 10_000, 1_000);
    let reference = equi::hash_build_right(&l, &r, &SumN::new());

    let (mut lm, mut rm) = (l.clone(), r.clone());
    let res = parallel::equi(&mut lm, &mut rm, &SumN::new(), config())?;
    assert_same_results(res, reference.clone());

    let res = parallel::equi_simple(&l, &r, &SumN::new(), config())?;
    assert_same_results(res, reference);
    Ok(())
}

#[test]
fn parallel_uneq_matches_serial_at_scale() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0xa002);
    let l = random_relation(&mut rng, 10_000, 1_000);
    let r = random_relation(&mut rng, 10_000, 1_000);
    let reference = uneq::hash_build_right(&l, &r, &SumN::new());

    let (mut lm, mut rm) = (l.clone(), r.clone());
    let res = parallel::uneq(&mut lm, &mut rm, &SumN::new(), config())?;
    assert_same_results(res, reference.clone());

    let res = parallel::uneq_simple(&l, &r, &SumN::new(), config())?;
    assert_same_results(res, reference);
    Ok(())
}

#[test]
fn parallel_less_matches_serial_at_scale() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0xa003);
    let l = random_relation(&mut rng, 10_000, 1_000);
    let r = random_relation(&mut rng, 10_000, 1_000);

    let (mut ls, mut rs) = (l.clone(), r.clone());
    let reference = less::sort_merge(&mut ls, &mut rs, &SumN::new());

    let (mut lm, mut rm) = (l.clone(), r.clone());
    let res = parallel::less(&mut lm, &mut rm, &SumN::new(), config())?;
    assert_same_results(res, reference.clone());

    let res = parallel::less_simple(&l, &r, &SumN::new(), config())?;
    assert_same_results(res, reference);
    Ok(())
}

#[test]
fn empty_aware_aggregates_survive_partitioning() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0xa004);
    // A wide key pool leaves many left rows without partners.
    let l = random_relation(&mut rng, 4_000, 100_000);
    let r = random_relation(&mut rng, 4_000, 100_000);

    let reference = equi::hash_build_right(&l, &r, &Sum::new());
    let (mut lm, mut rm) = (l.clone(), r.clone());
    assert_same_results(
        parallel::equi(&mut lm, &mut rm, &Sum::new(), config())?,
        reference,
    );

    let reference = equi::hash_build_right(&l, &r, &Min::new());
    let (mut lm, mut rm) = (l.clone(), r.clone());
    assert_same_results(
        parallel::equi(&mut lm, &mut rm, &Min::new(), config())?,
        reference,
    );

    let mut ls = l.clone();
    let reference = less::hash_prefix(&mut ls, &r, &Max::new());
    let (mut lm, mut rm) = (l.clone(), r.clone());
    assert_same_results(
        parallel::less(&mut lm, &mut rm, &Max::new(), config())?,
        reference,
    );
    Ok(())
}

#[test]
fn count_and_avg_run_through_every_parallel_flavor() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0xa005);
    let l = random_relation(&mut rng, 3_000, 200);
    let r = random_relation(&mut rng, 3_000, 200);

    let reference = equi::hash_build_right(&l, &r, &Count);
    let (mut lm, mut rm) = (l.clone(), r.clone());
    assert_same_results(parallel::equi(&mut lm, &mut rm, &Count, config())?, reference);

    let reference = uneq::hash_build_right(&l, &r, &Avg);
    let (mut lm, mut rm) = (l.clone(), r.clone());
    assert_same_results(parallel::uneq(&mut lm, &mut rm, &Avg, config())?, reference);

    let reference = uneq::hash_build_right(&l, &r, &Avg);
    assert_same_results(parallel::uneq_simple(&l, &r, &Avg, config())?, reference);
    Ok(())
}

#[test]
fn avg_keeps_duplicate_left_rows_aligned() -> Result<()> {
    let mut l = relation_of(vec![(1i64, 0i32), (1, 1), (2, 2)]);
    let mut r = relation_of(vec![(1, 3i32), (2, 4), (2, 5)]);

    let mut res = parallel::equi(&mut l, &mut r, &Avg, ParallelConfig::new(1, 2))?;
    res.sort_by_key(|(row, _)| (row.key, row.value));

    assert_eq!(res[0].1.get(), Some(&3.0));
    assert_eq!(res[1].1.get(), Some(&3.0));
    assert_eq!(res[2].1.get(), Some(&4.5));
    Ok(())
}

#[test]
fn single_row_left_relation_works() -> Result<()> {
    let mut l = relation_of(vec![(1i64, 0i32)]);
    let mut r: Relation<i64, i32> = Vec::new();

    let res = parallel::equi(&mut l, &mut r, &Min::<i32>::new(), config())?;
    assert_eq!(res.len(), 1);
    assert_eq!(res[0].1.get(), None);
    Ok(())
}

#[test]
#[should_panic(expected = "non-empty left relation")]
fn empty_left_relation_is_a_contract_violation() {
    let mut l: Relation<i64, i32> = Vec::new();
    let mut r = relation_of(vec![(1, 1i32)]);
    let _ = parallel::equi(&mut l, &mut r, &SumN::new(), ParallelConfig::default());
}
