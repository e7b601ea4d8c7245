//! Scripted in-memory transport.
//!
//! Each submission is answered by a script closure that sees the batch and
//! how many times that batch (by sequence number) has been submitted so far.
//! Every submission is recorded, and concurrent submissions are counted so
//! tests can assert on the pool's concurrency bound.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use batchline_core::BatchTransport;
use batchline_domain::{Batch, ItemResult, ObjectRecord, TransportFault};
use parking_lot::Mutex;

pub type Reply = Result<Vec<ItemResult>, TransportFault>;
type Script = dyn Fn(&Batch<ObjectRecord>, usize) -> Reply + Send + Sync;

/// One recorded submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub sequence: u64,
    pub ids: Vec<String>,
    pub at: tokio::time::Instant,
}

pub struct ScriptedTransport {
    script: Box<Script>,
    latency: Duration,
    submissions: Mutex<Vec<Submission>>,
    attempts: Mutex<HashMap<u64, usize>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&Batch<ObjectRecord>, usize) -> Reply + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            latency: Duration::ZERO,
            submissions: Mutex::new(Vec::new()),
            attempts: Mutex::new(HashMap::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Transport that accepts every item.
    pub fn accept_all() -> Self {
        Self::new(|batch, _| Ok(accept(batch)))
    }

    /// Transport whose every attempt fails with `fault`.
    pub fn always(fault: TransportFault) -> Self {
        Self::new(move |_, _| Err(fault.clone()))
    }

    /// Simulated time spent on the wire per submission.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }

    /// Highest number of submissions observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchTransport<ObjectRecord> for ScriptedTransport {
    async fn submit(&self, batch: &Batch<ObjectRecord>) -> Reply {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        let attempt = {
            let mut attempts = self.attempts.lock();
            let counter = attempts.entry(batch.sequence()).or_insert(0);
            *counter += 1;
            *counter
        };
        self.submissions.lock().push(Submission {
            sequence: batch.sequence(),
            ids: batch.ids().into_iter().map(str::to_string).collect(),
            at: tokio::time::Instant::now(),
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        (self.script)(batch, attempt)
    }
}

/// Success results for every item of `batch`.
pub fn accept(batch: &Batch<ObjectRecord>) -> Vec<ItemResult> {
    batch.items().iter().map(|item| ItemResult::success(item.id.clone())).collect()
}

pub fn objects(prefix: &str, count: usize) -> Vec<ObjectRecord> {
    (0..count).map(|i| ObjectRecord::with_id(format!("{prefix}-{i}"), "Article")).collect()
}
