#![deny(missing_docs)]
#![doc = "Core types and traits for stratified permuted-block randomization: trial design constants, stratification levels, assignment records and the log store contract."]

pub mod design;
pub mod errors;
pub mod rng;
pub mod store;
mod types;

pub use design::{TrialDesign, BLOCKS_PER_STRATUM, BLOCK_SIZE, FACTORS, GROUPS};
pub use errors::{ErrorInfo, RandError};
pub use rng::RngHandle;
pub use store::LogStore;
pub use types::{
    local_timestamp, AgeLevel, AssignmentRecord, BevFreeLevel, DurationLevel, Factor, Group,
    Stratum, StratumKey, RECORD_FIELDS, TIMESTAMP_FORMAT,
};
