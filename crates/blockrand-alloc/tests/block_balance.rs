use std::collections::BTreeMap;

use blockrand_alloc::{build_block, generate_queues};
use blockrand_core::{Group, RngHandle, Stratum, TrialDesign, GROUPS};
use proptest::prelude::*;

fn counts(slots: &[Group]) -> BTreeMap<Group, usize> {
    let mut counts = BTreeMap::new();
    for slot in slots {
        *counts.entry(*slot).or_insert(0) += 1;
    }
    counts
}

#[test]
fn every_stratum_starts_with_full_capacity() {
    let design = TrialDesign::standard();
    let queues = generate_queues(&design, &mut RngHandle::from_seed(42)).expect("queues");
    assert_eq!(queues.len(), 8);
    let expected_keys: Vec<_> = Stratum::all().iter().map(Stratum::key).collect();
    let keys: Vec<_> = queues.keys().cloned().collect();
    assert_eq!(keys, expected_keys);
    for queue in queues.values() {
        assert_eq!(queue.remaining(), 60);
        assert_eq!(queue.initial_len(), 60);
    }
}

proptest! {
    #[test]
    fn larger_balanced_blocks_hold_per_group_copies(seed in any::<u64>(), per_group in 1usize..5) {
        let design = TrialDesign {
            block_size: per_group * GROUPS.len(),
            ..TrialDesign::standard()
        };
        let block = build_block(&design, &mut RngHandle::from_seed(seed));
        prop_assert_eq!(block.len(), design.block_size);
        for count in counts(&block).values() {
            prop_assert_eq!(*count, per_group);
        }
    }
}
