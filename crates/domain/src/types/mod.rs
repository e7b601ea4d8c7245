//! Domain types for batch writes
//!
//! - [`items`]: the three write item kinds and the [`Batch`] container
//! - [`results`]: per-item outcomes and the aggregated batch result
//! - [`fault`]: raw transport faults reported by a transport adapter
//! - [`retry`]: retry budgets and backoff unit

pub mod fault;
pub mod items;
pub mod results;
pub mod retry;

pub use fault::TransportFault;
pub use items::{
    BeaconRef, Batch, ConsistencyLevel, DeleteFilter, DeleteOutput, ObjectRecord,
    ReferenceRecord, WriteItem,
};
pub use results::{AggregatedResult, AttemptStats, ItemError, ItemResult, ItemStatus};
pub use retry::RetryPolicy;
