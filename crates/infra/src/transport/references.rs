use async_trait::async_trait;
use batchline_core::BatchTransport;
use batchline_domain::{Batch, ItemResult, ReferenceRecord, TransportFault};
use reqwest::Method;
use tracing::instrument;

use super::objects::correlate;
use super::wire::{ItemResponse, ReferenceRequest};
use super::HttpBatchTransport;

#[async_trait]
impl BatchTransport<ReferenceRecord> for HttpBatchTransport {
    #[instrument(skip_all, fields(batch = batch.sequence(), kind = "references"))]
    async fn submit(
        &self,
        batch: &Batch<ReferenceRecord>,
    ) -> Result<Vec<ItemResult>, TransportFault> {
        let body: Vec<ReferenceRequest<'_>> =
            batch.items().iter().map(ReferenceRequest::from).collect();
        let builder = self.request(Method::POST, &self.references_url).json(&body);
        let responses: Vec<ItemResponse> = self.send_json(builder).await?;
        correlate(batch.items(), responses)
    }
}
