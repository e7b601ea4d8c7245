//! Request and response bodies of the batch REST endpoints.

use batchline_domain::{DeleteFilter, ItemError, ObjectRecord, ReferenceRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(super) struct ObjectsRequest<'a> {
    pub fields: [&'static str; 1],
    pub objects: &'a [ObjectRecord],
}

impl<'a> ObjectsRequest<'a> {
    pub fn new(objects: &'a [ObjectRecord]) -> Self {
        Self { fields: ["ALL"], objects }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ReferenceRequest<'a> {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<&'a str>,
}

impl<'a> From<&'a ReferenceRecord> for ReferenceRequest<'a> {
    fn from(record: &'a ReferenceRecord) -> Self {
        Self {
            from: record.from_beacon(),
            to: record.to_beacon(),
            tenant: record.tenant.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DeleteRequest<'a> {
    #[serde(rename = "match")]
    pub matcher: DeleteMatch<'a>,
    pub output: String,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct DeleteMatch<'a> {
    pub class: &'a str,
    #[serde(rename = "where")]
    pub filter: &'a Value,
}

impl<'a> From<&'a DeleteFilter> for DeleteRequest<'a> {
    fn from(filter: &'a DeleteFilter) -> Self {
        Self {
            matcher: DeleteMatch { class: &filter.class, filter: &filter.filter },
            output: filter.output.to_string(),
            dry_run: filter.dry_run,
        }
    }
}

/// Per-item entry of an objects or references response.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ItemResponse {
    #[serde(default)]
    pub result: Option<ResultBlock>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ResultBlock {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub errors: Option<ErrorList>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorList {
    #[serde(default)]
    pub error: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEntry {
    #[serde(default)]
    pub message: String,
}

impl ItemResponse {
    /// Errors reported for this item, in server order.
    pub fn errors(&self) -> Vec<ItemError> {
        self.result
            .as_ref()
            .and_then(|result| result.errors.as_ref())
            .map(|list| list.error.iter().map(|entry| ItemError::new(&entry.message)).collect())
            .unwrap_or_default()
    }

    /// Whether the server marked the item as failed by status alone.
    pub fn status_failed(&self) -> bool {
        self.result
            .as_ref()
            .and_then(|result| result.status.as_deref())
            .is_some_and(|status| status.eq_ignore_ascii_case("FAILED"))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct DeleteResponse {
    pub results: DeleteSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct DeleteSummary {
    #[serde(default)]
    pub matches: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub successful: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<Vec<Value>>,
}
