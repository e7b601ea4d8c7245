use std::time::Duration;

use batchline_domain::{BatchlineError, TransportFault};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::{fault_from_reqwest, InfraError};

/// Single-attempt HTTP client.
///
/// Retries are owned by the batch executor, so every call here makes exactly
/// one request and reports failures as a [`TransportFault`].
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, BatchlineError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send the request once and return the response body on a 2xx status.
    ///
    /// Non-2xx responses become [`TransportFault::Status`] carrying the body
    /// text. The body is read within the same deadline as the request.
    pub async fn send(&self, builder: RequestBuilder) -> Result<String, TransportFault> {
        let request = builder.build().map_err(|err| fault_from_reqwest(&err))?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        let response = self.client.execute(request).await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            fault_from_reqwest(&err)
        })?;

        let status = response.status();
        debug!(%method, %url, %status, "received HTTP response");
        let body = read_body(response).await?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportFault::status(status.as_u16(), body))
        }
    }
}

async fn read_body(response: Response) -> Result<String, TransportFault> {
    response.text().await.map_err(|err| fault_from_reqwest(&err))
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    bearer_token: Option<String>,
    default_headers: Option<HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            user_agent: Some(concat!("batchline/", env!("CARGO_PKG_VERSION")).to_string()),
            bearer_token: None,
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    /// Deadline for a whole request, including reading the body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, BatchlineError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let mut headers = self.default_headers.unwrap_or_default();
        if let Some(token) = self.bearer_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                BatchlineError::Config("API key contains invalid header characters".into())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        if !headers.is_empty() {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            BatchlineError::from(infra)
        })?;

        Ok(HttpClient { client })
    }
}
