use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use blockrand_alloc::{AllocationRequest, Allocator, SessionState};
use blockrand_core::{LogStore, RandError, Stratum, GROUPS};
use blockrand_log::MemoryLogStore;

#[test]
fn concurrent_allocations_consume_each_slot_once() {
    let session = Arc::new(SessionState::start().expect("start"));
    let store = Arc::new(MemoryLogStore::new());
    let stratum = Stratum::all()[5];

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let session = Arc::clone(&session);
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let allocator = Allocator::new(session.as_ref(), store.as_ref());
                let mut outcomes = Vec::new();
                for idx in 0..10 {
                    let request = AllocationRequest::new(format!("W{worker}-{idx}"), stratum);
                    outcomes.push(allocator.allocate(&request));
                }
                outcomes
            })
        })
        .collect();

    let mut successes = 0;
    let mut exhausted = 0;
    for handle in handles {
        for outcome in handle.join().expect("worker") {
            match outcome {
                Ok(_) => successes += 1,
                Err(RandError::Exhausted(_)) => exhausted += 1,
                Err(other) => panic!("unexpected error {other}"),
            }
        }
    }
    assert_eq!(successes, 60);
    assert_eq!(exhausted, 20);

    let records = store.read_all_records().expect("read");
    assert_eq!(records.len(), 60);
    let mut counts = BTreeMap::new();
    for record in &records {
        *counts.entry(record.assigned_group).or_insert(0) += 1;
    }
    for group in GROUPS {
        assert_eq!(counts[&group], 20);
    }
}
