//! Per-item outcomes and aggregated batch results.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::impl_status_conversions;
use crate::serde_util::duration_millis;
use crate::types::fault::TransportFault;

/// Outcome of one item as reported by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Success,
    Failed,
}

impl_status_conversions!(ItemStatus {
    Success => "success",
    Failed => "failed",
});

/// Error message attached to a rejected item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub message: String,
}

impl ItemError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Result for one submitted item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub id: String,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemError>,
    /// Raw per-item payload returned by the store, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ItemResult {
    pub fn success(id: impl Into<String>) -> Self {
        Self { id: id.into(), status: ItemStatus::Success, errors: Vec::new(), detail: None }
    }

    pub fn failed(id: impl Into<String>, errors: Vec<ItemError>) -> Self {
        Self { id: id.into(), status: ItemStatus::Failed, errors, detail: None }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == ItemStatus::Failed
    }
}

/// Bookkeeping for the attempts made on one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptStats {
    /// Submissions made, including the first.
    pub attempts: u32,
    pub connection_retries: u32,
    pub timeout_retries: u32,
    /// Total time spent in backoff sleeps.
    #[serde(rename = "waited_ms", with = "duration_millis")]
    pub waited: Duration,
}

/// Final output of the batch executor for one batch.
///
/// Callers must look at both halves: `error` reports transport exhaustion or
/// a fatal fault, `items` reports business-level rejections. [`has_errors`]
/// covers both.
///
/// [`has_errors`]: AggregatedResult::has_errors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Sequence number of the batch this result belongs to.
    pub batch: u64,
    pub items: Vec<ItemResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TransportFault>,
    #[serde(default)]
    pub stats: AttemptStats,
}

impl AggregatedResult {
    /// Result for a batch that needed no network call.
    pub fn empty(batch: u64) -> Self {
        Self { batch, ..Self::default() }
    }

    /// True if the batch hit a transport-level error or any item was rejected.
    pub fn has_errors(&self) -> bool {
        self.error.is_some() || self.items.iter().any(ItemResult::is_failed)
    }

    pub fn failed_items(&self) -> impl Iterator<Item = &ItemResult> {
        self.items.iter().filter(|item| item.is_failed())
    }

    pub fn succeeded_count(&self) -> usize {
        self.items.iter().filter(|item| !item.is_failed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed_items().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_errors_covers_both_transport_and_items() {
        let clean = AggregatedResult {
            items: vec![ItemResult::success("a"), ItemResult::success("b")],
            ..AggregatedResult::default()
        };
        assert!(!clean.has_errors());

        let partial = AggregatedResult {
            items: vec![
                ItemResult::success("a"),
                ItemResult::failed("b", vec![ItemError::new("invalid property")]),
            ],
            ..AggregatedResult::default()
        };
        assert!(partial.has_errors());
        assert!(partial.error.is_none());
        assert_eq!(partial.succeeded_count(), 1);
        assert_eq!(partial.failed_items().map(|item| item.id.as_str()).collect::<Vec<_>>(), ["b"]);

        let exhausted = AggregatedResult {
            error: Some(TransportFault::connect("refused")),
            ..AggregatedResult::default()
        };
        assert!(exhausted.has_errors());
        assert!(exhausted.items.is_empty());
    }

    #[test]
    fn empty_result_has_no_errors() {
        let result = AggregatedResult::empty(3);
        assert_eq!(result.batch, 3);
        assert!(result.items.is_empty());
        assert!(!result.has_errors());
        assert_eq!(result.stats, AttemptStats::default());
    }

    #[test]
    fn item_status_parses_remote_spelling() {
        assert_eq!("SUCCESS".parse::<ItemStatus>().unwrap(), ItemStatus::Success);
        assert_eq!("FAILED".parse::<ItemStatus>().unwrap(), ItemStatus::Failed);
    }
}
