//! Filtered deletes.
//!
//! The delete endpoint takes one filter per request, so a batch of filters is
//! sent as consecutive requests within one attempt. A fault on any request
//! fails the whole attempt; filters already applied are applied again on
//! retry.

use async_trait::async_trait;
use batchline_core::BatchTransport;
use batchline_domain::{Batch, DeleteFilter, ItemError, ItemResult, TransportFault};
use reqwest::Method;
use tracing::{debug, instrument};

use super::wire::{DeleteRequest, DeleteResponse, DeleteSummary};
use super::HttpBatchTransport;

#[async_trait]
impl BatchTransport<DeleteFilter> for HttpBatchTransport {
    #[instrument(skip_all, fields(batch = batch.sequence(), kind = "deletes"))]
    async fn submit(&self, batch: &Batch<DeleteFilter>) -> Result<Vec<ItemResult>, TransportFault> {
        let mut results = Vec::with_capacity(batch.len());
        for filter in batch.items() {
            let mut builder = self
                .request(Method::DELETE, &self.objects_url)
                .json(&DeleteRequest::from(filter));
            if let Some(tenant) = filter.tenant.as_deref() {
                builder = builder.query(&[("tenant", tenant)]);
            }

            let response: DeleteResponse = self.send_json(builder).await?;
            debug!(
                class = %filter.class,
                matches = response.results.matches,
                failed = response.results.failed,
                "Delete filter applied"
            );
            results.push(summarize(filter, response.results)?);
        }
        Ok(results)
    }
}

fn summarize(filter: &DeleteFilter, summary: DeleteSummary) -> Result<ItemResult, TransportFault> {
    let detail = serde_json::to_value(&summary)
        .map_err(|err| TransportFault::decode(format!("delete summary: {err}")))?;

    let result = if summary.failed == 0 {
        ItemResult::success(filter.id.as_str())
    } else {
        let message =
            format!("{} of {} matched objects failed to delete", summary.failed, summary.matches);
        ItemResult::failed(filter.id.as_str(), vec![ItemError::new(message)])
    };
    Ok(result.with_detail(detail))
}
