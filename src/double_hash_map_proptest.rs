#![cfg(test)]

// Property tests for DoubleHashMap kept inside the crate so they can read
// the tombstone counter.

use crate::config::MapConfig;
use crate::double_hash_map::DoubleHashMap;
use crate::prime::is_prime;
use proptest::prelude::*;
use std::collections::HashMap;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=40).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_against_model(
    mut sut: DoubleHashMap<i32>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, i32> = HashMap::new();
    let floor = sut.capacity();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = &pool[i];
                let prev = sut.insert(k, v);
                prop_assert_eq!(prev, model.insert(k.clone(), v));
                // Growth is decided before placing, so the bound holds up to one entry.
                let limit = sut.config().grow_above_percent;
                prop_assert!((sut.len() - 1) * 100 / sut.capacity() <= limit);
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k), model.remove(k));
                prop_assert!(sut.get(k).is_none());
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(&s), model.contains_key(&s));
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.get_mut(k), model.get_mut(k)) {
                    (Some(a), Some(b)) => {
                        *a = a.wrapping_add(d);
                        *b = b.wrapping_add(d);
                    }
                    (None, None) => {}
                    (a, b) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", a, b),
                }
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(is_prime(sut.capacity()));
        prop_assert!(sut.capacity() >= floor);
        prop_assert!(sut.len() + sut.tombstones() < sut.capacity());
    }
    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Upsert returns the displaced value exactly when the model had one.
// - `get`/`contains_key` parity with the model; removed keys are gone.
// - Capacity stays prime and never drops below the initial capacity.
// - At least one slot is always empty, so probes terminate.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_against_model(DoubleHashMap::new(), &pool, ops)?;
    }
}

// Property: Same invariants on a two-slot starting table, where nearly every
// op sequence grows, shrinks and purges tombstones repeatedly.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_tiny_table((pool, ops) in arb_scenario()) {
        let sut = DoubleHashMap::with_config(MapConfig::new().initial_size(0));
        run_against_model(sut, &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_custom_thresholds(
        (pool, ops) in arb_scenario(),
        grow in 30usize..=90,
        shrink in 0usize..30,
    ) {
        let config = MapConfig::new()
            .initial_size(4)
            .grow_above_percent(grow)
            .shrink_below_percent(shrink);
        run_against_model(DoubleHashMap::with_config(config), &pool, ops)?;
    }
}
