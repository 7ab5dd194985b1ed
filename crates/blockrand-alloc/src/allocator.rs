//! Assignment allocation: a pure decision step followed by append-then-pop.

use blockrand_core::{
    local_timestamp, AssignmentRecord, ErrorInfo, Group, LogStore, RandError, Stratum, StratumKey,
};
use serde::{Deserialize, Serialize};

use crate::blocks::StratumQueues;
use crate::retry::RetryPolicy;
use crate::session::SessionState;

/// Subject details submitted by an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Identifier as typed; surrounding whitespace is trimmed at allocation.
    pub subject_id: String,
    /// Stratum derived from the subject's three level selections.
    pub stratum: Stratum,
}

impl AllocationRequest {
    /// Builds a request from already parsed levels.
    pub fn new(subject_id: impl Into<String>, stratum: Stratum) -> Self {
        Self {
            subject_id: subject_id.into(),
            stratum,
        }
    }

    /// Parses raw form input. Unknown level labels are validation errors.
    pub fn from_labels(
        subject_id: &str,
        age: &str,
        duration: &str,
        bev_free: &str,
    ) -> Result<Self, RandError> {
        Ok(Self::new(
            subject_id,
            Stratum::from_labels(age, duration, bev_free)?,
        ))
    }
}

/// Outcome of a successful allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// The record that was appended to the log.
    pub record: AssignmentRecord,
    /// Slots left in the stratum after this allocation.
    pub remaining: usize,
}

impl Allocation {
    /// Trimmed subject identifier as recorded.
    pub fn subject_id(&self) -> &str {
        &self.record.subject_id
    }

    /// Group popped from the stratum queue.
    pub fn assigned_group(&self) -> Group {
        self.record.assigned_group
    }

    /// Key of the stratum the slot came from.
    pub fn stratum_key(&self) -> &StratumKey {
        &self.record.stratum_key
    }
}

/// Decides the allocation for `request` without mutating anything.
///
/// Validates the subject identifier, derives the stratum key, peeks the front
/// slot of that stratum's queue and assembles the record to persist.
pub fn decide(
    queues: &StratumQueues,
    request: &AllocationRequest,
    timestamp: impl Into<String>,
) -> Result<AssignmentRecord, RandError> {
    let subject_id = request.subject_id.trim();
    if subject_id.is_empty() {
        return Err(RandError::Validation(
            ErrorInfo::new("blockrand.subject_id_empty", "subject identifier is required")
                .with_hint("enter the subject identifier before submitting"),
        ));
    }
    let stratum_key = request.stratum.key();
    let queue = queues.get(&stratum_key).ok_or_else(|| {
        RandError::State(
            ErrorInfo::new("blockrand.stratum_missing", "stratum has no queue")
                .with_context("stratum", stratum_key.as_str()),
        )
    })?;
    let group = queue.peek().ok_or_else(|| {
        RandError::Exhausted(
            ErrorInfo::new(
                "blockrand.stratum_exhausted",
                format!("no allocation slots left for stratum {stratum_key}"),
            )
            .with_context("stratum", stratum_key.as_str())
            .with_context("capacity", queue.initial_len().to_string())
            .with_hint("pre-generated capacity was insufficient; notify the trial operators"),
        )
    })?;
    Ok(AssignmentRecord {
        subject_id: subject_id.to_string(),
        age_level: request.stratum.age,
        duration_level: request.stratum.duration,
        bev_free_level: request.stratum.bev_free,
        stratum_key,
        assigned_group: group,
        timestamp: timestamp.into(),
    })
}

/// Consumes one queue slot per subject and persists the resulting record.
pub struct Allocator<'a, S: LogStore + ?Sized> {
    session: &'a SessionState,
    store: &'a S,
    retry: RetryPolicy,
}

impl<'a, S: LogStore + ?Sized> Allocator<'a, S> {
    /// Allocator over `session` persisting to `store` with the default
    /// [`RetryPolicy`].
    pub fn new(session: &'a SessionState, store: &'a S) -> Self {
        Self {
            session,
            store,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the append retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Allocates the next group in the subject's stratum.
    ///
    /// The record is appended before the slot is popped: if every append
    /// attempt fails the slot stays at the front of the queue and the error is
    /// returned. Validation and exhaustion failures touch neither the queue nor
    /// the store.
    pub fn allocate(&self, request: &AllocationRequest) -> Result<Allocation, RandError> {
        let mut queues = self.session.lock()?;
        let record = match decide(&queues, request, local_timestamp()) {
            Ok(record) => record,
            Err(err) => {
                match &err {
                    RandError::Exhausted(_) => tracing::error!(
                        stratum = %request.stratum.key(),
                        subject_id = %request.subject_id,
                        "allocation capacity exhausted"
                    ),
                    _ => tracing::warn!(error = %err, "allocation rejected"),
                }
                return Err(err);
            }
        };

        if let Err(err) = self.retry.append(self.store, &record) {
            tracing::error!(
                subject_id = %record.subject_id,
                stratum = %record.stratum_key,
                error = %err,
                "assignment could not be persisted; slot retained"
            );
            return Err(err);
        }

        let queue = queues.get_mut(&record.stratum_key).ok_or_else(|| {
            RandError::State(
                ErrorInfo::new("blockrand.stratum_missing", "stratum has no queue")
                    .with_context("stratum", record.stratum_key.as_str()),
            )
        })?;
        queue.pop();
        let remaining = queue.remaining();
        tracing::info!(
            subject_id = %record.subject_id,
            stratum = %record.stratum_key,
            remaining,
            "subject allocated"
        );
        tracing::debug!(group = %record.assigned_group, "allocated group");
        Ok(Allocation { record, remaining })
    }
}
