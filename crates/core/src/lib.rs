//! # Batchline Core
//!
//! The resilient batch write engine.
//!
//! This crate contains:
//! - The [`BatchTransport`] port implemented by transport adapters
//! - Failure classification and linear backoff budgets
//! - [`BatchExecutor`]: single-batch submit with retry
//! - [`AutoBatcher`]: producer queue, worker pool and flush barrier
//!
//! ## Architecture Principles
//! - Only depends on `batchline-domain`
//! - No HTTP code; the wire protocol lives behind [`BatchTransport`]
//! - Transport faults never escape as `Err`; they land in
//!   [`AggregatedResult::error`](batchline_domain::AggregatedResult)

#![warn(missing_docs)]

pub mod batch;

pub use batch::backoff::{cumulative_delay, delay, RetryBudget};
pub use batch::batcher::{AutoBatcher, BatchCallback, BatcherConfig, BatcherState};
pub use batch::classifier::{classify, AttemptOutcome, FaultClass};
pub use batch::executor::BatchExecutor;
pub use batch::ports::BatchTransport;
