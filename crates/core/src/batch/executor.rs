//! Single-batch submission with classified retries.
//!
//! The retry loop is a state machine over [`AttemptOutcome`]:
//!
//! ```text
//! submit ──► Response ───────────────────────────► done (no top-level error)
//!    ▲   └─► Fault(Fatal) ───────────────────────► done (error, no items)
//!    │   └─► Fault(Connection | Timeout)
//!    │          ├─ budget left: sleep k * base ──► resubmit same batch
//!    │          └─ exhausted ────────────────────► done (last fault)
//! ```
//!
//! Per-item rejections inside a response are never retried. Retries resend
//! the batch unmodified; an item persisted by an attempt that later timed out
//! may be written twice.

use std::sync::Arc;

use batchline_domain::{AggregatedResult, AttemptStats, Batch, RetryPolicy, WriteItem};
use tracing::{debug, instrument, warn};

use super::backoff::RetryBudget;
use super::classifier::{AttemptOutcome, FaultClass};
use super::ports::BatchTransport;

/// Submits one batch at a time through a [`BatchTransport`].
pub struct BatchExecutor<T: WriteItem> {
    transport: Arc<dyn BatchTransport<T>>,
}

impl<T: WriteItem> Clone for BatchExecutor<T> {
    fn clone(&self) -> Self {
        Self { transport: Arc::clone(&self.transport) }
    }
}

impl<T: WriteItem> BatchExecutor<T> {
    /// Executor that submits through `transport`.
    pub fn new(transport: Arc<dyn BatchTransport<T>>) -> Self {
        Self { transport }
    }

    /// Submit `batch`, retrying connection and timeout faults within `policy`.
    ///
    /// Never fails: transport faults are reported in
    /// [`AggregatedResult::error`]. An empty batch returns an empty result
    /// without touching the transport. Oversized batches are not split.
    #[instrument(
        skip(self, batch, policy),
        fields(batch = batch.sequence(), items = batch.len())
    )]
    pub async fn execute(&self, batch: Batch<T>, policy: &RetryPolicy) -> AggregatedResult {
        let sequence = batch.sequence();
        if batch.is_empty() {
            debug!("Empty batch, skipping submission");
            return AggregatedResult::empty(sequence);
        }

        let mut budget = RetryBudget::new(*policy);
        let mut stats = AttemptStats::default();

        loop {
            stats.attempts = stats.attempts.saturating_add(1);
            debug!(attempt = stats.attempts, "Submitting batch");

            let reply = self.transport.submit(&batch).await;
            let (class, fault) = match AttemptOutcome::from_reply(batch.len(), reply) {
                AttemptOutcome::Response(items) => {
                    let failed = items.iter().filter(|item| item.is_failed()).count();
                    debug!(attempt = stats.attempts, failed, "Batch accepted");
                    return AggregatedResult { batch: sequence, items, error: None, stats };
                }
                AttemptOutcome::Fault { class, fault } => (class, fault),
            };

            if class == FaultClass::Fatal {
                warn!(attempt = stats.attempts, error = %fault, "Non-retryable batch failure");
                return AggregatedResult {
                    batch: sequence,
                    items: Vec::new(),
                    error: Some(fault),
                    stats,
                };
            }

            let Some(wait) = budget.next_delay(class) else {
                warn!(
                    attempt = stats.attempts,
                    fault = class.as_str(),
                    error = %fault,
                    "Retry budget exhausted"
                );
                return AggregatedResult {
                    batch: sequence,
                    items: Vec::new(),
                    error: Some(fault),
                    stats,
                };
            };

            stats.connection_retries = budget.connection_retries();
            stats.timeout_retries = budget.timeout_retries();
            warn!(
                attempt = stats.attempts,
                fault = class.as_str(),
                delay_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                error = %fault,
                "Retryable batch failure, backing off"
            );

            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
            stats.waited = stats.waited.saturating_add(wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use batchline_domain::{ItemError, ItemResult, ObjectRecord, TransportFault};
    use parking_lot::Mutex;

    use super::*;

    type Reply = Result<Vec<ItemResult>, TransportFault>;

    /// Replays queued replies; once drained, accepts every item.
    struct Replay {
        replies: Mutex<VecDeque<Reply>>,
        calls: Mutex<usize>,
    }

    impl Replay {
        fn new(replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self { replies: Mutex::new(replies.into()), calls: Mutex::new(0) })
        }

        fn calls(&self) -> usize {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl BatchTransport<ObjectRecord> for Replay {
        async fn submit(&self, batch: &Batch<ObjectRecord>) -> Reply {
            *self.calls.lock() += 1;
            self.replies.lock().pop_front().unwrap_or_else(|| {
                Ok(batch.items().iter().map(|item| ItemResult::success(item.id.clone())).collect())
            })
        }
    }

    fn batch(ids: &[&str]) -> Batch<ObjectRecord> {
        Batch::new(1, ids.iter().map(|id| ObjectRecord::with_id(*id, "Doc")).collect())
    }

    fn executor(transport: &Arc<Replay>) -> BatchExecutor<ObjectRecord> {
        BatchExecutor::new(transport.clone())
    }

    fn policy(connection: u32, timeout: u32) -> RetryPolicy {
        RetryPolicy::new(std::time::Duration::ZERO, connection, timeout)
    }

    #[tokio::test]
    async fn fatal_fault_stops_immediately() {
        let transport = Replay::new(vec![Err(TransportFault::status(422, "bad class"))]);
        let executor = executor(&transport);

        let result = executor.execute(batch(&["a"]), &policy(5, 5)).await;

        assert_eq!(transport.calls(), 1);
        assert!(result.items.is_empty());
        assert_eq!(result.error, Some(TransportFault::status(422, "bad class")));
        assert_eq!(result.stats.attempts, 1);
    }

    #[tokio::test]
    async fn per_item_failures_are_not_retried() {
        let transport = Replay::new(vec![Ok(vec![
            ItemResult::success("a"),
            ItemResult::failed("b", vec![ItemError::new("no such class")]),
        ])]);
        let executor = executor(&transport);

        let result = executor.execute(batch(&["a", "b"]), &policy(3, 3)).await;

        assert_eq!(transport.calls(), 1);
        assert!(result.error.is_none());
        assert!(result.has_errors());
        assert_eq!(result.failed_count(), 1);
    }

    #[tokio::test]
    async fn mixed_faults_draw_from_separate_budgets() {
        let transport = Replay::new(vec![
            Err(TransportFault::connect("refused")),
            Err(TransportFault::timeout("read")),
            Err(TransportFault::connect("refused")),
        ]);
        let executor = executor(&transport);

        let result = executor.execute(batch(&["a"]), &policy(2, 1)).await;

        assert_eq!(transport.calls(), 4);
        assert!(result.error.is_none());
        assert_eq!(result.stats.connection_retries, 2);
        assert_eq!(result.stats.timeout_retries, 1);
    }

    #[tokio::test]
    async fn zero_budget_reports_first_fault() {
        let transport = Replay::new(vec![Err(TransportFault::timeout("read"))]);
        let executor = executor(&transport);

        let result = executor.execute(batch(&["a"]), &RetryPolicy::no_retries()).await;

        assert_eq!(transport.calls(), 1);
        assert_eq!(result.error, Some(TransportFault::timeout("read")));
    }
}
