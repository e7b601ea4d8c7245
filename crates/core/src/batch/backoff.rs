//! Linear backoff with independent per-fault-kind budgets.
//!
//! The k-th retry of a fault kind waits `k * base_interval`, so `n` consecutive
//! retries of one kind wait `base_interval * n(n+1)/2` in total.

use std::time::Duration;

use batchline_domain::RetryPolicy;

use super::classifier::FaultClass;

/// Wait before the retry numbered `attempt_index` (1-based, per fault kind).
pub fn delay(base_interval: Duration, attempt_index: u32) -> Duration {
    base_interval.saturating_mul(attempt_index)
}

/// Total wait accumulated by `retries` consecutive retries of one fault kind.
pub fn cumulative_delay(base_interval: Duration, retries: u32) -> Duration {
    let n = u64::from(retries);
    let steps = n * (n + 1) / 2;
    let nanos = base_interval.as_nanos().saturating_mul(u128::from(steps));
    u64::try_from(nanos).map_or(Duration::MAX, Duration::from_nanos)
}

/// Retry counters for one batch execution.
#[derive(Debug, Clone)]
pub struct RetryBudget {
    policy: RetryPolicy,
    connection_retries: u32,
    timeout_retries: u32,
}

impl RetryBudget {
    /// Fresh budget with no retries spent.
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy, connection_retries: 0, timeout_retries: 0 }
    }

    /// Spend one retry of `class`.
    ///
    /// Returns the delay to wait before resubmitting, or `None` when the
    /// budget for that kind is exhausted or the class is not retryable.
    pub fn next_delay(&mut self, class: FaultClass) -> Option<Duration> {
        let (used, max) = match class {
            FaultClass::Connection => {
                (&mut self.connection_retries, self.policy.max_connection_retries)
            }
            FaultClass::Timeout => (&mut self.timeout_retries, self.policy.max_timeout_retries),
            FaultClass::Fatal => return None,
        };

        if *used >= max {
            return None;
        }

        *used += 1;
        Some(delay(self.policy.base_interval, *used))
    }

    /// Connection retries spent so far.
    pub const fn connection_retries(&self) -> u32 {
        self.connection_retries
    }

    /// Timeout retries spent so far.
    pub const fn timeout_retries(&self) -> u32 {
        self.timeout_retries
    }
}
