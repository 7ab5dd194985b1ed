use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use blockrand_core::{AssignmentRecord, ErrorInfo, LogStore, RandError};

/// In-process [`LogStore`] with fault injection, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    records: Mutex<Vec<AssignmentRecord>>,
    pending_append_failures: AtomicUsize,
    fail_reads: AtomicBool,
    append_calls: AtomicUsize,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` appends fail.
    pub fn fail_next_appends(&self, count: usize) {
        self.pending_append_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of append attempts, successful or not.
    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> Result<MutexGuard<'_, Vec<AssignmentRecord>>, RandError> {
        self.records.lock().map_err(|_| {
            RandError::Persistence(ErrorInfo::new(
                "blockrand_log.poisoned",
                "memory log lock poisoned",
            ))
        })
    }
}

impl LogStore for MemoryLogStore {
    fn append_record(&self, record: &AssignmentRecord) -> Result<(), RandError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .pending_append_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if injected {
            return Err(RandError::Persistence(
                ErrorInfo::new("blockrand_log.append", "injected append failure")
                    .with_context("subject_id", record.subject_id.clone()),
            ));
        }
        self.records()?.push(record.clone());
        Ok(())
    }

    fn read_all_records(&self) -> Result<Vec<AssignmentRecord>, RandError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RandError::Persistence(ErrorInfo::new(
                "blockrand_log.read",
                "injected read failure",
            )));
        }
        Ok(self.records()?.clone())
    }
}
