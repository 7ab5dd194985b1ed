//! Static trial design constants.
//!
//! The randomization scheme is fixed: three arms, blocks of six, ten blocks
//! per stratum and three binary stratification factors. These values are not
//! runtime-tunable; [`TrialDesign`] only exists so the generator can be
//! exercised against malformed designs in tests.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, RandError};
use crate::types::{AgeLevel, BevFreeLevel, DurationLevel, Factor, Group};

/// Treatment arms in allocation order.
pub const GROUPS: [Group; 3] = [Group::A, Group::B, Group::C];

/// Number of slots in each permuted block.
pub const BLOCK_SIZE: usize = 6;

/// Number of blocks pre-generated for every stratum.
pub const BLOCKS_PER_STRATUM: usize = 10;

/// Stratification factors in declaration order.
pub const FACTORS: [Factor; 3] = [
    Factor {
        name: AgeLevel::FACTOR,
        levels: AgeLevel::LABELS,
    },
    Factor {
        name: DurationLevel::FACTOR,
        levels: DurationLevel::LABELS,
    },
    Factor {
        name: BevFreeLevel::FACTOR,
        levels: BevFreeLevel::LABELS,
    },
];

/// Block layout used by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialDesign {
    /// Arms each block is balanced over.
    pub groups: Vec<Group>,
    /// Slots per block; must be a positive multiple of `groups.len()`.
    pub block_size: usize,
    /// Blocks concatenated into each stratum queue.
    pub blocks_per_stratum: usize,
}

impl TrialDesign {
    /// Returns the fixed design used by live sessions.
    pub fn standard() -> Self {
        Self {
            groups: GROUPS.to_vec(),
            block_size: BLOCK_SIZE,
            blocks_per_stratum: BLOCKS_PER_STRATUM,
        }
    }

    /// Checks that blocks built from this design are balanced.
    pub fn validate(&self) -> Result<(), RandError> {
        if self.groups.is_empty() {
            return Err(RandError::Config(ErrorInfo::new(
                "blockrand.design_groups",
                "trial design must declare at least one group",
            )));
        }
        if self.block_size == 0 || self.block_size % self.groups.len() != 0 {
            return Err(RandError::Config(
                ErrorInfo::new(
                    "blockrand.design_block_size",
                    format!(
                        "block size {} is not a positive multiple of {} groups",
                        self.block_size,
                        self.groups.len()
                    ),
                )
                .with_context("block_size", self.block_size.to_string())
                .with_context("groups", self.groups.len().to_string()),
            ));
        }
        if self.blocks_per_stratum == 0 {
            return Err(RandError::Config(ErrorInfo::new(
                "blockrand.design_block_count",
                "at least one block per stratum is required",
            )));
        }
        Ok(())
    }

    /// Number of times each group appears in one block.
    pub fn per_group(&self) -> usize {
        self.block_size / self.groups.len().max(1)
    }

    /// Initial length of every stratum queue.
    pub fn queue_len(&self) -> usize {
        self.block_size * self.blocks_per_stratum
    }
}

impl Default for TrialDesign {
    fn default() -> Self {
        Self::standard()
    }
}
