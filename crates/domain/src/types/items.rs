//! Write items and batches.
//!
//! A write item is immutable once it has been handed to the engine. Every item
//! carries an identifier that is echoed back in its [`ItemResult`] so callers
//! can correlate outcomes, and that identifier is the only tool callers have
//! for idempotence: a retried batch is resent unmodified.
//!
//! [`ItemResult`]: crate::ItemResult

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::impl_status_conversions;

/// Prefix used when rendering cross references as beacons.
pub const BEACON_PREFIX: &str = "weaviate://localhost";

/// One unit of bulk-write work.
pub trait WriteItem: std::fmt::Debug + Send + Sync + 'static {
    /// Identifier reported back in the item's result.
    fn id(&self) -> &str;
}

/// Object insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: String,
    pub class: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

impl ObjectRecord {
    /// New object of `class` with a random UUID identifier.
    pub fn new(class: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), class)
    }

    /// New object of `class` with a caller-chosen identifier.
    pub fn with_id(id: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
            properties: Map::new(),
            tenant: None,
            vector: None,
        }
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }
}

impl WriteItem for ObjectRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// One end of a cross reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconRef {
    pub class: String,
    pub id: String,
}

impl BeaconRef {
    pub fn new(class: impl Into<String>, id: impl Into<String>) -> Self {
        Self { class: class.into(), id: id.into() }
    }

    /// Beacon pointing at the object itself.
    pub fn beacon(&self) -> String {
        format!("{BEACON_PREFIX}/{}/{}", self.class, self.id)
    }
}

/// Reference insert: links `from.property` to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    id: String,
    pub from: BeaconRef,
    pub property: String,
    pub to: BeaconRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

impl ReferenceRecord {
    pub fn new(from: BeaconRef, property: impl Into<String>, to: BeaconRef) -> Self {
        let property = property.into();
        let id = format!("{}/{}/{}->{}/{}", from.class, from.id, property, to.class, to.id);
        Self { id, from, property, to, tenant: None }
    }

    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Beacon of the referencing property, e.g. `.../Author/1/wrote`.
    pub fn from_beacon(&self) -> String {
        format!("{}/{}", self.from.beacon(), self.property)
    }

    pub fn to_beacon(&self) -> String {
        self.to.beacon()
    }
}

impl WriteItem for ReferenceRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// How much detail a filtered delete reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteOutput {
    #[default]
    Minimal,
    Verbose,
}

impl_status_conversions!(DeleteOutput {
    Minimal => "minimal",
    Verbose => "verbose",
});

/// Filtered delete: removes every object of `class` matching `filter`.
///
/// The filter is an opaque where-clause built by the query layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteFilter {
    pub id: String,
    pub class: String,
    pub filter: Value,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub output: DeleteOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

impl DeleteFilter {
    pub fn new(class: impl Into<String>, filter: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            class: class.into(),
            filter,
            dry_run: false,
            output: DeleteOutput::Minimal,
            tenant: None,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn output(mut self, output: DeleteOutput) -> Self {
        self.output = output;
        self
    }

    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }
}

impl WriteItem for DeleteFilter {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Replication consistency requested for a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyLevel {
    One,
    Quorum,
    All,
}

impl_status_conversions!(ConsistencyLevel {
    One => "one",
    Quorum => "quorum",
    All => "all",
});

impl ConsistencyLevel {
    /// Spelling expected by the remote query parameter.
    pub const fn as_query_value(self) -> &'static str {
        match self {
            Self::One => "ONE",
            Self::Quorum => "QUORUM",
            Self::All => "ALL",
        }
    }
}

/// An ordered, bounded group of write items submitted together.
///
/// `sequence` is assigned when the batch is formed and increases with
/// formation order, so items of batch N always precede those of batch N+1.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T> {
    sequence: u64,
    items: Vec<T>,
}

impl<T: WriteItem> Batch<T> {
    pub fn new(sequence: u64, items: Vec<T>) -> Self {
        Self { sequence, items }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item identifiers in submission order.
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(WriteItem::id).collect()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T: WriteItem> From<Vec<T>> for Batch<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(0, items)
    }
}
