//! Append retry with exponential backoff.

use std::thread;
use std::time::Duration;

use blockrand_core::{AssignmentRecord, LogStore, RandError};
use serde::{Deserialize, Serialize};

/// Retry schedule for appending an assignment to the log store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total append attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    2_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    /// Delay to wait after the given failed attempt (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        let millis = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }

    /// Appends `record`, retrying with exponential backoff.
    ///
    /// Returns the last persistence error once all attempts are spent.
    pub fn append<S: LogStore + ?Sized>(
        &self,
        store: &S,
        record: &AssignmentRecord,
    ) -> Result<(), RandError> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match store.append_record(record) {
                Ok(()) => return Ok(()),
                Err(err) if attempt < attempts => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        subject_id = %record.subject_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "assignment append failed, retrying"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
