//! Raw transport faults.
//!
//! A transport adapter reports what went wrong on the wire; deciding whether
//! that is worth retrying is the engine's job, not the adapter's.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_ERROR_DETAIL_LENGTH, TRUNCATE_SUFFIX};

/// Fault raised by a single submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportFault {
    /// The endpoint could not be reached (refused, unreachable, DNS).
    #[error("connection failed: {message}")]
    Connect { message: String },

    /// The request was sent but no response arrived before the read deadline.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// The endpoint answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The endpoint answered but the body could not be decoded.
    #[error("malformed response: {message}")]
    Decode { message: String },

    /// Any other transport or protocol failure.
    #[error("protocol error: {message}")]
    Protocol { message: String },
}

impl TransportFault {
    pub fn connect(message: impl AsRef<str>) -> Self {
        Self::Connect { message: truncate(message.as_ref()) }
    }

    pub fn timeout(message: impl AsRef<str>) -> Self {
        Self::Timeout { message: truncate(message.as_ref()) }
    }

    pub fn status(status: u16, body: impl AsRef<str>) -> Self {
        Self::Status { status, body: truncate(body.as_ref()) }
    }

    pub fn decode(message: impl AsRef<str>) -> Self {
        Self::Decode { message: truncate(message.as_ref()) }
    }

    pub fn protocol(message: impl AsRef<str>) -> Self {
        Self::Protocol { message: truncate(message.as_ref()) }
    }

    /// Stable label suitable for logs and metrics.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Timeout { .. } => "timeout",
            Self::Status { .. } => "status",
            Self::Decode { .. } => "decode",
            Self::Protocol { .. } => "protocol",
        }
    }
}

fn truncate(message: &str) -> String {
    if message.len() <= MAX_ERROR_DETAIL_LENGTH {
        return message.to_string();
    }

    let keep = MAX_ERROR_DETAIL_LENGTH.saturating_sub(TRUNCATE_SUFFIX.len());
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(TRUNCATE_SUFFIX);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_messages_are_truncated() {
        let fault = TransportFault::decode("x".repeat(MAX_ERROR_DETAIL_LENGTH * 2));
        match fault {
            TransportFault::Decode { message } => {
                assert_eq!(message.len(), MAX_ERROR_DETAIL_LENGTH);
                assert!(message.ends_with(TRUNCATE_SUFFIX));
            }
            other => panic!("unexpected fault {other:?}"),
        }
    }

    #[test]
    fn display_includes_status_and_body() {
        let fault = TransportFault::status(503, "unavailable");
        assert_eq!(fault.to_string(), "unexpected status 503: unavailable");
        assert_eq!(fault.label(), "status");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(TransportFault::connect("refused")).unwrap();
        assert_eq!(json["kind"], "connect");
        assert_eq!(json["message"], "refused");
    }
}
