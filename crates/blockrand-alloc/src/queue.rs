//! Per-stratum allocation queue.

use std::collections::VecDeque;

use blockrand_core::Group;
use serde::{Deserialize, Serialize};

/// Capacity state of a stratum queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueState {
    /// At least one slot remains.
    HasCapacity,
    /// Every slot has been consumed; terminal for the session.
    Exhausted,
}

/// Flattened, pre-shuffled sequence of group labels for one stratum.
///
/// Slots are only ever removed from the front and never replenished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationQueue {
    slots: VecDeque<Group>,
    initial_len: usize,
}

impl AllocationQueue {
    /// Concatenates blocks in generation order.
    pub fn from_blocks(blocks: Vec<Vec<Group>>) -> Self {
        let slots: VecDeque<Group> = blocks.into_iter().flatten().collect();
        let initial_len = slots.len();
        Self { slots, initial_len }
    }

    /// Next group to be assigned, without consuming it.
    pub(crate) fn peek(&self) -> Option<Group> {
        self.slots.front().copied()
    }

    /// Consumes the front slot. Only the allocator calls this, after the
    /// record for the slot has been appended.
    pub(crate) fn pop(&mut self) -> Option<Group> {
        self.slots.pop_front()
    }

    /// Slots still available.
    pub fn remaining(&self) -> usize {
        self.slots.len()
    }

    /// Slots consumed so far.
    pub fn consumed(&self) -> usize {
        self.initial_len - self.slots.len()
    }

    /// Length at generation time.
    pub fn initial_len(&self) -> usize {
        self.initial_len
    }

    /// [`QueueState::Exhausted`] once the last slot has been consumed.
    pub fn state(&self) -> QueueState {
        if self.slots.is_empty() {
            QueueState::Exhausted
        } else {
            QueueState::HasCapacity
        }
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Group> + '_ {
        self.slots.iter()
    }
}
