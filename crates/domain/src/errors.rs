//! Error types used throughout the workspace

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Batchline.
///
/// Transport faults raised while submitting a batch are not represented here;
/// the batch executor folds them into
/// [`AggregatedResult::error`](crate::AggregatedResult). This type covers
/// construction, configuration and lifecycle failures.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BatchlineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Batcher is shut down: {0}")]
    Shutdown(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Batchline operations
pub type Result<T> = std::result::Result<T, BatchlineError>;
