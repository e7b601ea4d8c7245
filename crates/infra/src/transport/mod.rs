//! HTTP implementation of [`BatchTransport`] for the three write kinds.
//!
//! Each `submit` call makes a single attempt; classification and retries
//! happen in the batch executor. Per-item outcomes are returned in
//! submission order, correlated by position with the request.
//!
//! [`BatchTransport`]: batchline_core::BatchTransport

mod deletes;
mod objects;
mod references;
mod wire;

use std::time::Duration;

use batchline_domain::{
    BatchlineError, ConsistencyLevel, EndpointConfig, Result as BatchlineResult, TransportFault,
};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use crate::errors::InfraError;
use crate::http::HttpClient;

const OBJECTS_PATH: &str = "v1/batch/objects";
const REFERENCES_PATH: &str = "v1/batch/references";

/// Batch transport talking to the REST batch endpoints.
#[derive(Clone, Debug)]
pub struct HttpBatchTransport {
    client: HttpClient,
    objects_url: Url,
    references_url: Url,
    consistency_level: Option<ConsistencyLevel>,
}

impl HttpBatchTransport {
    /// Build a transport for `endpoint`.
    ///
    /// # Errors
    /// Returns [`BatchlineError::Config`] when the base URL does not parse
    /// or the API key cannot be sent as a header.
    pub fn new(endpoint: &EndpointConfig) -> BatchlineResult<Self> {
        let mut builder =
            HttpClient::builder().timeout(Duration::from_millis(endpoint.timeout_ms));
        if let Some(key) = endpoint.api_key.as_deref().filter(|key| !key.is_empty()) {
            builder = builder.bearer_token(key);
        }
        Self::with_client(builder.build()?, &endpoint.base_url, endpoint.consistency_level)
    }

    /// Build a transport around an existing client.
    pub fn with_client(
        client: HttpClient,
        base_url: &str,
        consistency_level: Option<ConsistencyLevel>,
    ) -> BatchlineResult<Self> {
        let base = base_url_with_slash(base_url)?;
        let objects_url = base.join(OBJECTS_PATH).map_err(InfraError::from)?;
        let references_url = base.join(REFERENCES_PATH).map_err(InfraError::from)?;
        Ok(Self { client, objects_url, references_url, consistency_level })
    }

    pub const fn consistency_level(&self) -> Option<ConsistencyLevel> {
        self.consistency_level
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let builder = self.client.request(method, url.clone());
        match self.consistency_level {
            Some(level) => builder.query(&[("consistency_level", level.as_query_value())]),
            None => builder,
        }
    }

    async fn send_json<R: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<R, TransportFault> {
        let body = self.client.send(builder).await?;
        serde_json::from_str(&body)
            .map_err(|err| TransportFault::decode(format!("unexpected response body: {err}")))
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn base_url_with_slash(base_url: &str) -> Result<Url, InfraError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(InfraError(BatchlineError::Config("endpoint base URL is empty".into())));
    }
    let mut url = Url::parse(trimmed)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> BatchlineResult<HttpBatchTransport> {
        HttpBatchTransport::with_client(HttpClient::new()?, base, None)
    }

    #[test]
    fn joins_paths_onto_base_with_prefix() {
        let transport = transport("http://db.local:8080/prefix").unwrap();
        assert_eq!(transport.objects_url.as_str(), "http://db.local:8080/prefix/v1/batch/objects");
        assert_eq!(
            transport.references_url.as_str(),
            "http://db.local:8080/prefix/v1/batch/references"
        );
    }

    #[test]
    fn rejects_unparsable_base_url() {
        assert!(matches!(transport("::nope"), Err(BatchlineError::Config(_))));
        assert!(matches!(transport("  "), Err(BatchlineError::Config(_))));
    }
}
