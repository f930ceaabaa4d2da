use anyhow::Result;
use groupjoin::aggregate::SumN;
use groupjoin::partition::{
    ModPartition, PartitionFn, RangePartition, partition_in_place, partition_with_suffix_totals,
    partition_with_total,
};
use groupjoin::{Relation, Row};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_relation(rng: &mut StdRng, rows: usize, key_pool: i64) -> Relation<i64, i32> {
    (0..rows)
        .map(|i| Row::new(rng.gen_range(0..key_pool), i as i32))
        .collect()
}

fn pool(threads: usize) -> Result<rayon::ThreadPool> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?)
}

fn sorted_copy(rel: &Relation<i64, i32>) -> Relation<i64, i32> {
    let mut rel = rel.clone();
    rel.sort_by_key(|row| (row.key, row.value));
    rel
}

#[test]
fn partitions_are_contiguous_and_cover_the_input() -> Result<()> {
    let pool = pool(4)?;
    let mut rng = StdRng::seed_from_u64(0x9001);
    let original = random_relation(&mut rng, 5_000, 999);
    let mut rel = original.clone();

    let partitions = 13;
    let pf = ModPartition::new(partitions);
    let bounds = partition_in_place(&pool, &mut rel, partitions, &pf);

    assert_eq!(bounds.len(), partitions + 1);
    assert_eq!(bounds[0], 0);
    assert_eq!(bounds[partitions], rel.len());

    // Every row landed in the range its partition index prescribes.
    for p in 0..partitions {
        for row in &rel[bounds[p]..bounds[p + 1]] {
            assert_eq!(pf.partition_of(&row.key), p);
        }
    }

    // The shuffle is a permutation of the input.
    assert_eq!(sorted_copy(&rel), sorted_copy(&original));
    Ok(())
}

#[test]
fn with_total_matches_a_direct_accumulation() -> Result<()> {
    let pool = pool(4)?;
    let mut rng = StdRng::seed_from_u64(0x9002);
    let mut rel = random_relation(&mut rng, 3_000, 50);
    let expected: i32 = rel.iter().map(|row| row.value).sum();

    let (_, total) = partition_with_total(&pool, &mut rel, 7, &ModPartition::new(7), &SumN::new());
    assert_eq!(total, expected);
    Ok(())
}

#[test]
fn suffix_totals_aggregate_everything_above_each_partition() -> Result<()> {
    let pool = pool(4)?;
    let mut rng = StdRng::seed_from_u64(0x9003);
    let sample = random_relation(&mut rng, 2_000, 500);
    let mut rel = random_relation(&mut rng, 2_000, 500);

    let partitions = 9;
    let pf = RangePartition::from_samples(&sample, partitions);
    let expected: Vec<i32> = (0..=partitions)
        .map(|p| {
            rel.iter()
                .filter(|row| pf.partition_of(&row.key) > p)
                .map(|row| row.value)
                .sum()
        })
        .collect();

    let (_, totals) =
        partition_with_suffix_totals(&pool, &mut rel, partitions, &pf, &SumN::new());
    assert_eq!(totals, expected);
    assert_eq!(totals[partitions], 0);
    Ok(())
}

#[test]
fn range_partition_orders_the_key_space() -> Result<()> {
    let pool = pool(2)?;
    let mut rng = StdRng::seed_from_u64(0x9004);
    let mut rel = random_relation(&mut rng, 4_000, 10_000);

    let partitions = 8;
    let pf = RangePartition::from_samples(&rel, partitions);
    let bounds = partition_in_place(&pool, &mut rel, partitions, &pf);

    // Keys in partition p are all <= every key in partition p + 1.
    for p in 0..partitions - 1 {
        let here = &rel[bounds[p]..bounds[p + 1]];
        let above = &rel[bounds[p + 1]..bounds[p + 2]];
        if let (Some(max_here), Some(min_above)) = (
            here.iter().map(|row| row.key).max(),
            above.iter().map(|row| row.key).min(),
        ) {
            assert!(max_here <= min_above);
        }
    }
    Ok(())
}

#[test]
fn mod_partition_handles_negative_keys() {
    let pf = ModPartition::new(4);
    for key in [-7i64, -1, 0, 1, 7] {
        assert!(pf.partition_of(&key) < 4);
    }
}

#[test]
fn single_partition_is_the_identity_layout() -> Result<()> {
    let pool = pool(3)?;
    let original = vec![Row::new(3i64, 0i32), Row::new(1, 1), Row::new(2, 2)];
    let mut rel = original.clone();

    let bounds = partition_in_place(&pool, &mut rel, 1, &ModPartition::new(1));
    assert_eq!(bounds, vec![0, 3]);
    assert_eq!(rel, original);
    Ok(())
}

#[test]
fn empty_relation_partitions_cleanly() -> Result<()> {
    let pool = pool(2)?;
    let mut rel: Relation<i64, i32> = Vec::new();
    let bounds = partition_in_place(&pool, &mut rel, 5, &ModPartition::new(5));
    assert_eq!(bounds, vec![0, 0, 0, 0, 0, 0]);
    Ok(())
}
