//! Batch submission: classification, backoff, execution and auto-batching.

pub mod backoff;
pub mod batcher;
pub mod classifier;
pub mod executor;
pub mod ports;
