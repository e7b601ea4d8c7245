//! Failure classification for submission attempts.
//!
//! Connection and timeout faults are retryable and budgeted independently.
//! Everything else is fatal and ends the retry loop at once.

use batchline_domain::{ItemResult, TransportFault};

/// Retry category of a transport fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultClass {
    /// The endpoint was never reached.
    Connection,
    /// The request went out but no response arrived before the deadline.
    Timeout,
    /// Not retryable.
    Fatal,
}

impl FaultClass {
    /// Whether the executor may resubmit after a fault of this class.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Connection | Self::Timeout)
    }

    /// Lowercase name used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::Fatal => "fatal",
        }
    }
}

/// Classify a transport fault.
pub const fn classify(fault: &TransportFault) -> FaultClass {
    match fault {
        TransportFault::Connect { .. } => FaultClass::Connection,
        TransportFault::Timeout { .. } => FaultClass::Timeout,
        TransportFault::Status { .. }
        | TransportFault::Decode { .. }
        | TransportFault::Protocol { .. } => FaultClass::Fatal,
    }
}

/// Result of one submission attempt, as seen by the retry loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Structured per-item response; may contain rejected items.
    Response(Vec<ItemResult>),
    /// Transport fault together with its retry class.
    Fault { class: FaultClass, fault: TransportFault },
}

impl AttemptOutcome {
    /// Build an outcome from a transport reply for a batch of `expected` items.
    ///
    /// A response that does not carry exactly one result per item cannot be
    /// reconciled with the batch and is reported as a fatal protocol fault.
    pub fn from_reply(expected: usize, reply: Result<Vec<ItemResult>, TransportFault>) -> Self {
        match reply {
            Ok(items) if items.len() == expected => Self::Response(items),
            Ok(items) => Self::fault(TransportFault::protocol(format!(
                "expected {expected} item results, received {}",
                items.len()
            ))),
            Err(fault) => Self::fault(fault),
        }
    }

    fn fault(fault: TransportFault) -> Self {
        Self::Fault { class: classify(&fault), fault }
    }
}
