//! Balanced block construction and per-stratum queue generation.

use blockrand_core::{Group, RandError, RngHandle, Stratum, StratumKey, TrialDesign};
use indexmap::IndexMap;
use rand::seq::SliceRandom;

use crate::queue::AllocationQueue;

/// Stratum queues keyed by stratum, in enumeration order.
pub type StratumQueues = IndexMap<StratumKey, AllocationQueue>;

/// Builds one balanced block: every group `design.per_group()` times, shuffled.
///
/// `SliceRandom::shuffle` is a Fisher-Yates shuffle, so every ordering of the
/// multiset is equally likely.
pub fn build_block(design: &TrialDesign, rng: &mut RngHandle) -> Vec<Group> {
    let mut block = Vec::with_capacity(design.block_size);
    for _ in 0..design.per_group() {
        block.extend_from_slice(&design.groups);
    }
    block.shuffle(rng);
    block
}

/// Materializes the queue of every stratum before any allocation happens.
pub fn generate_queues(
    design: &TrialDesign,
    rng: &mut RngHandle,
) -> Result<StratumQueues, RandError> {
    design.validate()?;
    let mut queues = IndexMap::new();
    for stratum in Stratum::all() {
        let blocks = (0..design.blocks_per_stratum)
            .map(|_| build_block(design, rng))
            .collect();
        queues.insert(stratum.key(), AllocationQueue::from_blocks(blocks));
    }
    tracing::debug!(
        strata = queues.len(),
        queue_len = design.queue_len(),
        "generated stratum queues"
    );
    Ok(queues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockrand_core::GROUPS;
    use proptest::prelude::*;

    #[test]
    fn block_contains_each_group_per_group_times() {
        let design = TrialDesign::standard();
        let mut rng = RngHandle::from_seed(7);
        let block = build_block(&design, &mut rng);
        assert_eq!(block.len(), 6);
        for group in &design.groups {
            assert_eq!(block.iter().filter(|g| *g == group).count(), 2);
        }
    }

    #[test]
    fn invalid_design_consumes_no_randomness() {
        let design = TrialDesign {
            block_size: 4,
            ..TrialDesign::standard()
        };
        let mut rng = RngHandle::from_seed(11);
        let mut untouched = RngHandle::from_seed(11);
        assert!(generate_queues(&design, &mut rng).is_err());
        assert_eq!(
            build_block(&TrialDesign::standard(), &mut rng),
            build_block(&TrialDesign::standard(), &mut untouched)
        );
    }

    #[test]
    fn strata_receive_independent_queues() {
        let queues = generate_queues(&TrialDesign::standard(), &mut RngHandle::from_seed(3))
            .expect("queues");
        let sequences: Vec<Vec<Group>> = queues
            .values()
            .map(|queue| queue.iter().copied().collect())
            .collect();
        assert!(sequences.windows(2).any(|pair| pair[0] != pair[1]));
    }

    proptest! {
        #[test]
        fn every_block_is_exactly_balanced(seed in any::<u64>()) {
            let design = TrialDesign::standard();
            let queues = generate_queues(&design, &mut RngHandle::from_seed(seed)).unwrap();
            for queue in queues.values() {
                let slots: Vec<Group> = queue.iter().copied().collect();
                prop_assert_eq!(slots.len(), design.queue_len());
                for block in slots.chunks(design.block_size) {
                    for group in GROUPS {
                        let count = block.iter().filter(|slot| **slot == group).count();
                        prop_assert_eq!(count, 2);
                    }
                }
            }
        }
    }
}
