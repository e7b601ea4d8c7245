//! Port interfaces for batch submission

use async_trait::async_trait;
use batchline_domain::{Batch, ItemResult, TransportFault, WriteItem};

/// Single "submit batch" operation against the remote write endpoint.
///
/// Implementations perform exactly one attempt: no retries, no sleeping. On
/// success they return one [`ItemResult`] per item, in submission order.
#[async_trait]
pub trait BatchTransport<T: WriteItem>: Send + Sync {
    /// Submit `batch` once and return its per-item results or the fault.
    async fn submit(&self, batch: &Batch<T>) -> Result<Vec<ItemResult>, TransportFault>;
}
