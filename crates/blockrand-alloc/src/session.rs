//! Session-scoped randomization state.

use std::sync::{Mutex, MutexGuard, OnceLock};

use blockrand_core::{ErrorInfo, RandError, RngHandle, Stratum, StratumKey, TrialDesign};
use serde::{Deserialize, Serialize};

use crate::blocks::{generate_queues, StratumQueues};
use crate::queue::QueueState;

/// Remaining capacity of one stratum, without revealing upcoming groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratumStatus {
    /// Stratum this entry describes.
    pub stratum_key: StratumKey,
    /// Slots still available.
    pub remaining: usize,
    /// Slots consumed by successful allocations.
    pub consumed: usize,
    /// Whether the stratum can still allocate.
    pub state: QueueState,
}

/// Randomization state owned by one trial session.
///
/// Queues are generated by an explicit [`SessionState::initialize`] call that
/// succeeds at most once, always from OS entropy. Every read or mutation goes
/// through one mutex, so the allocator's decide/append/pop sequence is a
/// critical section. Outside this crate only slot counts are observable; the
/// queue contents are reachable through [`crate::Allocator`] alone.
///
/// ```compile_fail
/// let session = blockrand_alloc::SessionState::start().unwrap();
/// let _queues = session.lock();
/// ```
///
/// ```compile_fail
/// use blockrand_core::RngHandle;
/// let session = blockrand_alloc::SessionState::new(blockrand_core::TrialDesign::standard());
/// session.initialize_from(&mut RngHandle::from_seed(1)).unwrap();
/// ```
#[derive(Debug)]
pub struct SessionState {
    design: TrialDesign,
    queues: OnceLock<Mutex<StratumQueues>>,
}

impl SessionState {
    /// Creates an uninitialized session for the given design.
    pub fn new(design: TrialDesign) -> Self {
        Self {
            design,
            queues: OnceLock::new(),
        }
    }

    /// Creates and initializes a session with the fixed design and OS entropy.
    pub fn start() -> Result<Self, RandError> {
        let session = Self::new(TrialDesign::standard());
        session.initialize()?;
        Ok(session)
    }

    /// The design the queues are generated from.
    pub fn design(&self) -> &TrialDesign {
        &self.design
    }

    /// Whether [`SessionState::initialize`] has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.queues.get().is_some()
    }

    /// Generates every stratum queue from OS entropy. A second call fails and
    /// leaves the existing queues untouched.
    pub fn initialize(&self) -> Result<(), RandError> {
        self.initialize_from(&mut RngHandle::from_entropy())
    }

    /// Generates the queues from `rng`.
    fn initialize_from(&self, rng: &mut RngHandle) -> Result<(), RandError> {
        if self.is_initialized() {
            return Err(already_initialized());
        }
        let queues = generate_queues(&self.design, rng)?;
        let strata = queues.len();
        self.queues
            .set(Mutex::new(queues))
            .map_err(|_| already_initialized())?;
        tracing::info!(
            strata,
            block_size = self.design.block_size,
            blocks_per_stratum = self.design.blocks_per_stratum,
            "randomization state initialized"
        );
        Ok(())
    }

    /// Locks the queues for a read or an allocation.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, StratumQueues>, RandError> {
        let queues = self.queues.get().ok_or_else(|| {
            RandError::State(
                ErrorInfo::new(
                    "blockrand.state_uninitialized",
                    "randomization state has not been initialized",
                )
                .with_hint("call SessionState::initialize at session start"),
            )
        })?;
        queues.lock().map_err(|_| {
            RandError::State(ErrorInfo::new(
                "blockrand.state_poisoned",
                "randomization state lock poisoned by an earlier panic",
            ))
        })
    }

    /// Remaining capacity per stratum in enumeration order.
    pub fn status(&self) -> Result<Vec<StratumStatus>, RandError> {
        let queues = self.lock()?;
        Ok(queues
            .iter()
            .map(|(key, queue)| StratumStatus {
                stratum_key: key.clone(),
                remaining: queue.remaining(),
                consumed: queue.consumed(),
                state: queue.state(),
            })
            .collect())
    }

    /// Slots left in one stratum.
    pub fn remaining(&self, stratum: &Stratum) -> Result<usize, RandError> {
        let key = stratum.key();
        let queues = self.lock()?;
        queues.get(&key).map(|queue| queue.remaining()).ok_or_else(|| {
            RandError::State(
                ErrorInfo::new("blockrand.stratum_missing", "stratum has no queue")
                    .with_context("stratum", key.as_str()),
            )
        })
    }
}

fn already_initialized() -> RandError {
    RandError::State(
        ErrorInfo::new(
            "blockrand.state_initialized",
            "randomization state already initialized for this session",
        )
        .with_hint("regenerating queues mid-trial would discard in-progress blocks"),
    )
}

#[cfg(test)]
pub(crate) fn seeded_session(seed: u64) -> SessionState {
    let session = SessionState::new(TrialDesign::standard());
    session
        .initialize_from(&mut RngHandle::from_seed(seed))
        .expect("initialize");
    session
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialize_keeps_existing_queues() {
        let session = seeded_session(1);
        let before: Vec<_> = session
            .lock()
            .expect("lock")
            .values()
            .map(|queue| queue.iter().copied().collect::<Vec<_>>())
            .collect();
        let err = session
            .initialize_from(&mut RngHandle::from_seed(2))
            .expect_err("second init");
        assert_eq!(err.code(), "blockrand.state_initialized");
        let err = session.initialize().expect_err("entropy re-init");
        assert_eq!(err.code(), "blockrand.state_initialized");
        let after: Vec<_> = session
            .lock()
            .expect("lock")
            .values()
            .map(|queue| queue.iter().copied().collect::<Vec<_>>())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn uninitialized_state_is_reported() {
        let session = SessionState::new(TrialDesign::standard());
        let err = session.status().expect_err("uninitialized");
        assert_eq!(err.code(), "blockrand.state_uninitialized");
        let err = session
            .remaining(&Stratum::all()[0])
            .expect_err("uninitialized");
        assert_eq!(err.code(), "blockrand.state_uninitialized");
    }

    #[test]
    fn remaining_tracks_the_locked_queue() {
        let session = seeded_session(3);
        let stratum = Stratum::all()[2];
        assert_eq!(session.remaining(&stratum).expect("remaining"), 60);
        session
            .lock()
            .expect("lock")
            .get_mut(&stratum.key())
            .expect("queue")
            .pop();
        assert_eq!(session.remaining(&stratum).expect("remaining"), 59);
        let status = session.status().expect("status");
        assert_eq!(status[2].consumed, 1);
        assert!(status
            .iter()
            .filter(|entry| entry.stratum_key != stratum.key())
            .all(|entry| entry.remaining == 60));
    }
}
