//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_POOL_SIZE, DEFAULT_REQUEST_TIMEOUT_MS};
use crate::errors::{BatchlineError, Result};
use crate::types::{ConsistencyLevel, RetryPolicy};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchlineConfig {
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub batching: BatchingConfig,
    pub retry: RetryPolicy,
}

/// Remote endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Read deadline for a single submission; exceeding it is a timeout fault.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub consistency_level: Option<ConsistencyLevel>,
}

/// Auto-batcher sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchingConfig {
    pub batch_size: usize,
    pub pool_size: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE, pool_size: DEFAULT_POOL_SIZE }
    }
}

impl BatchingConfig {
    /// Check sizing bounds: `batch_size > 0`, `pool_size >= 1`.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(BatchlineError::InvalidInput("batch_size must be greater than 0".into()));
        }
        if self.pool_size == 0 {
            return Err(BatchlineError::InvalidInput("pool_size must be at least 1".into()));
        }
        Ok(())
    }
}

impl BatchlineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.base_url.trim().is_empty() {
            return Err(BatchlineError::Config("endpoint.base_url must not be empty".into()));
        }
        if self.endpoint.timeout_ms == 0 {
            return Err(BatchlineError::Config("endpoint.timeout_ms must be positive".into()));
        }
        self.batching.validate().map_err(|err| BatchlineError::Config(err.to_string()))
    }
}

const fn default_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
