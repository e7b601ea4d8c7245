//! Auto-batching front end: producer queue, worker pool and flush barrier.
//!
//! ```text
//! enqueue ─► pending (≥ batch_size?) ─► batch channel ─► worker 1..=pool_size
//!                                                           │ BatchExecutor
//!                         callback ◄─ dispatcher ◄─ result channel
//! ```
//!
//! Batches are cut under the pending lock and pushed into the bounded batch
//! channel while that lock is still held, so formation order is dispatch
//! order. Workers take batches FIFO. Results are delivered to the callback by
//! a single dispatcher task, exactly once per batch, in completion order.
//!
//! `flush` cuts the remaining partial batch and then waits for the in-flight
//! counter to reach zero. The counter is incremented when a batch enters the
//! channel and decremented after its callback returns.

use std::mem;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use batchline_domain::{
    impl_status_conversions, AggregatedResult, Batch, BatchingConfig, BatchlineError,
    Result as BatchlineResult, RetryPolicy, WriteItem,
};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex as AsyncMutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::executor::BatchExecutor;
use super::ports::BatchTransport;

/// Completion callback, invoked once per batch from the dispatcher task.
///
/// The callback must not call [`AutoBatcher::flush`] on the same instance:
/// flush waits for the dispatcher, which is busy running the callback.
pub type BatchCallback = Arc<dyn Fn(AggregatedResult) + Send + Sync>;

/// Configuration for [`AutoBatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatcherConfig {
    /// Items per dispatched batch
    pub batch_size: usize,
    /// Number of concurrent submission workers
    pub pool_size: usize,
    /// Retry policy applied to every batch
    pub retry: RetryPolicy,
    /// How long `shutdown` waits for each task to finish
    pub join_timeout: Duration,
}

impl BatcherConfig {
    /// Config with the default five second join timeout.
    pub const fn new(batch_size: usize, pool_size: usize, retry: RetryPolicy) -> Self {
        Self { batch_size, pool_size, retry, join_timeout: Duration::from_secs(5) }
    }

    /// Build from the loaded batching section and retry policy.
    pub const fn from_parts(batching: BatchingConfig, retry: RetryPolicy) -> Self {
        Self::new(batching.batch_size, batching.pool_size, retry)
    }

    /// Both sizes must be at least one.
    pub fn validate(&self) -> BatchlineResult<()> {
        BatchingConfig { batch_size: self.batch_size, pool_size: self.pool_size }.validate()
    }
}

/// Observable lifecycle state of an [`AutoBatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatcherState {
    /// Nothing pending, nothing in flight.
    Idle,
    /// Items pending below `batch_size`, nothing in flight.
    Accumulating,
    /// At least one batch handed to the pool and not yet reported.
    Dispatching,
    /// A flush is waiting for in-flight batches.
    Draining,
}

impl_status_conversions!(BatcherState {
    Idle => "idle",
    Accumulating => "accumulating",
    Dispatching => "dispatching",
    Draining => "draining",
});

struct Pending<T> {
    items: Vec<T>,
    next_sequence: u64,
    /// `None` once the batcher has been shut down.
    sender: Option<mpsc::Sender<Batch<T>>>,
}

/// Counters shared between producers, the dispatcher and `flush`.
#[derive(Default)]
struct Tracker {
    pending: AtomicUsize,
    in_flight: AtomicUsize,
    /// Flushes currently waiting for the pool to go idle.
    draining: AtomicUsize,
    idle: Notify,
}

/// Marks one flush as draining until dropped, including when the flush
/// future is cancelled.
struct DrainGuard<'a>(&'a Tracker);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.draining.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Tracker {
    fn begin_drain(&self) -> DrainGuard<'_> {
        self.draining.fetch_add(1, Ordering::AcqRel);
        DrainGuard(self)
    }

    fn complete_one(&self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Queue plus worker pool that assembles and dispatches batches.
pub struct AutoBatcher<T: WriteItem> {
    config: BatcherConfig,
    pending: AsyncMutex<Pending<T>>,
    tracker: Arc<Tracker>,
    tasks: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl<T: WriteItem> AutoBatcher<T> {
    /// Validate `config` and spawn `pool_size` workers plus the dispatcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(
        config: BatcherConfig,
        transport: Arc<dyn BatchTransport<T>>,
        callback: F,
    ) -> BatchlineResult<Self>
    where
        F: Fn(AggregatedResult) + Send + Sync + 'static,
    {
        config.validate()?;
        let runtime = Handle::try_current()
            .map_err(|err| BatchlineError::Internal(format!("no Tokio runtime: {err}")))?;

        let (batch_tx, batch_rx) = mpsc::channel::<Batch<T>>(config.pool_size);
        let (result_tx, result_rx) = mpsc::unbounded_channel::<AggregatedResult>();
        let batch_rx = Arc::new(AsyncMutex::new(batch_rx));
        let tracker = Arc::new(Tracker::default());
        let executor = BatchExecutor::new(transport);

        let mut tasks = Vec::with_capacity(config.pool_size + 1);
        for worker in 0..config.pool_size {
            tasks.push(runtime.spawn(Self::worker_loop(
                worker,
                Arc::clone(&batch_rx),
                result_tx.clone(),
                executor.clone(),
                config.retry,
            )));
        }
        drop(result_tx);

        let callback: BatchCallback = Arc::new(callback);
        tasks.push(runtime.spawn(Self::dispatch_loop(result_rx, callback, Arc::clone(&tracker))));

        info!(
            batch_size = config.batch_size,
            pool_size = config.pool_size,
            "Auto-batcher started"
        );

        Ok(Self {
            config,
            pending: AsyncMutex::new(Pending {
                items: Vec::with_capacity(config.batch_size),
                next_sequence: 0,
                sender: Some(batch_tx),
            }),
            tracker,
            tasks: parking_lot::Mutex::new(tasks),
        })
    }

    /// Queue one item; dispatches a full batch once `batch_size` is reached.
    ///
    /// Waits when every worker is busy and the batch channel is full.
    pub async fn enqueue(&self, item: T) -> BatchlineResult<()> {
        self.enqueue_all(std::iter::once(item)).await
    }

    /// Queue several items, dispatching every full batch they complete.
    pub async fn enqueue_all<I>(&self, items: I) -> BatchlineResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        let mut pending = self.pending.lock().await;
        if pending.sender.is_none() {
            return Err(BatchlineError::Shutdown("enqueue after shutdown".into()));
        }

        let mut dispatched = Ok(());
        for item in items {
            pending.items.push(item);
            if pending.items.len() >= self.config.batch_size {
                let rest = pending.items.split_off(self.config.batch_size);
                let full = mem::replace(&mut pending.items, rest);
                dispatched = self.dispatch(&mut pending, full).await;
                if dispatched.is_err() {
                    break;
                }
            }
        }

        self.tracker.pending.store(pending.items.len(), Ordering::Release);
        dispatched
    }

    /// Dispatch the partial batch and wait for every dispatched batch.
    ///
    /// When this returns, every batch dispatched before the in-flight count
    /// reached zero has had its callback invoked. Items enqueued concurrently
    /// by other producers may start a new accumulation cycle.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> BatchlineResult<()> {
        let _draining = self.tracker.begin_drain();

        let dispatched = {
            let mut pending = self.pending.lock().await;
            if pending.items.is_empty() {
                Ok(())
            } else {
                let remainder = mem::take(&mut pending.items);
                let dispatched = self.dispatch(&mut pending, remainder).await;
                self.tracker.pending.store(pending.items.len(), Ordering::Release);
                dispatched
            }
        };

        self.tracker.wait_idle().await;
        debug!("Flush complete");
        dispatched
    }

    /// Flush, stop the workers and wait for every task to exit.
    ///
    /// Later calls to `enqueue` fail with [`BatchlineError::Shutdown`].
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> BatchlineResult<()> {
        self.flush().await?;

        // Dropping the sender closes the channel; idle workers then exit.
        self.pending.lock().await.sender = None;

        let tasks = mem::take(&mut *self.tasks.lock());
        let mut failures = Vec::new();
        for handle in tasks {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(error = %err, "Batcher task panicked");
                    failures.push(err.to_string());
                }
                Err(_) => {
                    warn!("Batcher task did not finish within join timeout");
                    failures.push("join timeout".to_string());
                }
            }
        }

        info!("Auto-batcher stopped");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(BatchlineError::Internal(failures.join("; ")))
        }
    }

    /// Current lifecycle state, derived from the pending, in-flight and
    /// draining counters.
    pub fn state(&self) -> BatcherState {
        if self.tracker.draining.load(Ordering::Acquire) > 0 {
            BatcherState::Draining
        } else if self.tracker.in_flight.load(Ordering::Acquire) > 0 {
            BatcherState::Dispatching
        } else if self.tracker.pending.load(Ordering::Acquire) > 0 {
            BatcherState::Accumulating
        } else {
            BatcherState::Idle
        }
    }

    /// Items waiting for a batch to fill.
    pub fn pending_len(&self) -> usize {
        self.tracker.pending.load(Ordering::Acquire)
    }

    /// Batches dispatched whose callback has not yet returned.
    pub fn in_flight(&self) -> usize {
        self.tracker.in_flight.load(Ordering::Acquire)
    }

    /// Configuration the batcher was started with.
    pub const fn config(&self) -> &BatcherConfig {
        &self.config
    }

    /// Hand a batch to the pool. Called with the pending lock held.
    async fn dispatch(&self, pending: &mut Pending<T>, items: Vec<T>) -> BatchlineResult<()> {
        let sender = pending
            .sender
            .as_ref()
            .ok_or_else(|| BatchlineError::Shutdown("dispatch after shutdown".into()))?;

        let batch = Batch::new(pending.next_sequence, items);
        pending.next_sequence += 1;
        debug!(batch = batch.sequence(), items = batch.len(), "Dispatching batch");

        self.tracker.in_flight.fetch_add(1, Ordering::AcqRel);
        if sender.send(batch).await.is_err() {
            self.tracker.complete_one();
            error!("Worker pool is gone; batch dropped");
            return Err(BatchlineError::Shutdown("worker pool stopped".into()));
        }
        Ok(())
    }

    async fn worker_loop(
        worker: usize,
        batches: Arc<AsyncMutex<mpsc::Receiver<Batch<T>>>>,
        results: mpsc::UnboundedSender<AggregatedResult>,
        executor: BatchExecutor<T>,
        retry: RetryPolicy,
    ) {
        loop {
            // The receiver lock is held only while waiting for the next batch.
            let next = batches.lock().await.recv().await;
            let Some(batch) = next else {
                debug!(worker, "Batch channel closed, worker exiting");
                break;
            };

            let result = executor.execute(batch, &retry).await;
            if results.send(result).is_err() {
                warn!(worker, "Result channel closed, worker exiting");
                break;
            }
        }
    }

    async fn dispatch_loop(
        mut results: mpsc::UnboundedReceiver<AggregatedResult>,
        callback: BatchCallback,
        tracker: Arc<Tracker>,
    ) {
        while let Some(result) = results.recv().await {
            let batch = result.batch;
            if catch_unwind(AssertUnwindSafe(|| callback(result))).is_err() {
                error!(batch, "Batch callback panicked");
            }
            tracker.complete_one();
        }
        debug!("Result channel closed, dispatcher exiting");
    }
}

impl<T: WriteItem> Drop for AutoBatcher<T> {
    fn drop(&mut self) {
        let in_flight = self.in_flight();
        let pending = self.pending.get_mut();
        if pending.sender.is_some() && (!pending.items.is_empty() || in_flight > 0) {
            warn!(
                pending = pending.items.len(),
                in_flight,
                "AutoBatcher dropped without flush; pending items are discarded"
            );
        }
    }
}
