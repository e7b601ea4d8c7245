//! Conversions from external infrastructure errors into domain errors.
//!
//! Two targets exist. Construction and configuration failures become
//! [`BatchlineError`] through the [`InfraError`] newtype. Failures of a single
//! submission become a [`TransportFault`] so the batch executor can classify
//! them for retry.

use batchline_domain::{BatchlineError, TransportFault};
use reqwest::Error as HttpError;
use thiserror::Error;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct InfraError(#[from] pub BatchlineError);

impl From<InfraError> for BatchlineError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → BatchlineError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        if value.is_builder() {
            return Self(BatchlineError::Config(format!("invalid HTTP client setup: {value}")));
        }
        if value.is_timeout() {
            return Self(BatchlineError::Network("HTTP request timed out".into()));
        }
        if value.is_connect() {
            return Self(BatchlineError::Network("HTTP connection failure".into()));
        }
        Self(BatchlineError::Network(value.to_string()))
    }
}

impl From<url::ParseError> for InfraError {
    fn from(value: url::ParseError) -> Self {
        Self(BatchlineError::Config(format!("invalid endpoint URL: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportFault */
/* -------------------------------------------------------------------------- */

/// Map a failed submission onto the fault taxonomy.
///
/// A connect timeout reports both `is_connect` and `is_timeout`; it is treated
/// as a connection fault because the request never reached the server.
pub fn fault_from_reqwest(err: &HttpError) -> TransportFault {
    if err.is_connect() {
        return TransportFault::connect(describe(err));
    }
    if err.is_timeout() {
        return TransportFault::timeout(describe(err));
    }
    if let Some(status) = err.status() {
        return TransportFault::status(status.as_u16(), describe(err));
    }
    if err.is_decode() {
        return TransportFault::decode(describe(err));
    }
    TransportFault::protocol(describe(err))
}

/// Render the error with its source chain, which carries the OS-level cause.
fn describe(err: &HttpError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
