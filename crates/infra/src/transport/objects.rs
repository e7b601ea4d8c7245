use async_trait::async_trait;
use batchline_core::BatchTransport;
use batchline_domain::{Batch, ItemResult, ObjectRecord, TransportFault, WriteItem};
use reqwest::Method;
use tracing::instrument;

use super::wire::{ItemResponse, ObjectsRequest};
use super::HttpBatchTransport;

#[async_trait]
impl BatchTransport<ObjectRecord> for HttpBatchTransport {
    #[instrument(skip_all, fields(batch = batch.sequence(), kind = "objects"))]
    async fn submit(&self, batch: &Batch<ObjectRecord>) -> Result<Vec<ItemResult>, TransportFault> {
        let builder = self
            .request(Method::POST, &self.objects_url)
            .json(&ObjectsRequest::new(batch.items()));
        let responses: Vec<ItemResponse> = self.send_json(builder).await?;
        correlate(batch.items(), responses)
    }
}

/// Pair response entries with request items by position.
pub(super) fn correlate<T: WriteItem>(
    items: &[T],
    responses: Vec<ItemResponse>,
) -> Result<Vec<ItemResult>, TransportFault> {
    if responses.len() != items.len() {
        return Err(TransportFault::protocol(format!(
            "expected {} item results, received {}",
            items.len(),
            responses.len()
        )));
    }

    Ok(items
        .iter()
        .zip(responses)
        .map(|(item, response)| {
            let errors = response.errors();
            if errors.is_empty() && !response.status_failed() {
                ItemResult::success(item.id())
            } else {
                ItemResult::failed(item.id(), errors)
            }
        })
        .collect())
}
