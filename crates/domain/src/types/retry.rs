//! Retry budgets.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::serde_util::duration_millis;

/// Retry configuration for one batch executor invocation.
///
/// Connection faults and timeout faults draw from independent budgets. There
/// is no `Default`; every field must be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Backoff unit; the k-th retry of a fault kind waits `k * base_interval`.
    #[serde(rename = "base_interval_ms", with = "duration_millis")]
    pub base_interval: Duration,
    pub max_connection_retries: u32,
    pub max_timeout_retries: u32,
}

impl RetryPolicy {
    pub const fn new(
        base_interval: Duration,
        max_connection_retries: u32,
        max_timeout_retries: u32,
    ) -> Self {
        Self { base_interval, max_connection_retries, max_timeout_retries }
    }

    /// Policy that never retries.
    pub const fn no_retries() -> Self {
        Self::new(Duration::ZERO, 0, 0)
    }

    /// Upper bound on submission attempts for one batch.
    pub const fn max_attempts(&self) -> u32 {
        self.max_connection_retries
            .saturating_add(self.max_timeout_retries)
            .saturating_add(1)
    }
}
