//! Stratified permuted-block randomization.
//!
//! [`blocks`] pre-generates balanced, shuffled queues for every stratum,
//! [`session`] owns them for the lifetime of one trial session and
//! [`allocator`] consumes one slot per enrolled subject.

#![deny(missing_docs)]

pub mod allocator;
pub mod blocks;
pub mod queue;
pub mod retry;
pub mod session;

pub use allocator::{decide, Allocation, AllocationRequest, Allocator};
pub use blocks::{build_block, generate_queues, StratumQueues};
pub use queue::{AllocationQueue, QueueState};
pub use retry::RetryPolicy;
pub use session::{SessionState, StratumStatus};
