use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::StreamId;

/// Unique identifier for a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Creates a new random entry ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entry ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-stream revision number used for optimistic concurrency.
///
/// Revisions start at 1 for the first entry on a stream and increase by
/// 1 for each subsequent entry. Revision 0 denotes a stream with no
/// entries yet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revision(i64);

impl Revision {
    /// Creates a revision from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial revision (0) of an empty stream.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the revision (1) of the first entry on a stream.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next revision.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw revision value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Revision {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Revision> for i64 {
    fn from(revision: Revision) -> Self {
        revision.0
    }
}

/// An immutable record in the tracking ledger.
///
/// Wraps a domain event payload with the metadata needed to replay it:
/// which stream it belongs to, its position on that stream, and when it
/// was recorded. Entries are write-once; the ledger never updates or
/// deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for this entry.
    pub entry_id: EntryId,

    /// The kind of event recorded (e.g. "ShipmentStatusUpdated").
    pub entry_type: String,

    /// The stream this entry belongs to.
    pub stream_id: StreamId,

    /// The kind of entity the stream tracks (e.g. "Shipment", "ReturnRequest").
    pub stream_type: String,

    /// The revision of the stream after this entry.
    pub revision: Revision,

    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,

    /// The event payload as JSON.
    pub payload: serde_json::Value,

    /// Additional metadata (correlation ids, request actors, ...).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LedgerEntry {
    /// Creates a new entry builder.
    pub fn builder() -> LedgerEntryBuilder {
        LedgerEntryBuilder::default()
    }
}

/// Builder for constructing ledger entries.
#[derive(Debug, Default)]
pub struct LedgerEntryBuilder {
    entry_id: Option<EntryId>,
    entry_type: Option<String>,
    stream_id: Option<StreamId>,
    stream_type: Option<String>,
    revision: Option<Revision>,
    recorded_at: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
    metadata: HashMap<String, serde_json::Value>,
}

impl LedgerEntryBuilder {
    /// Sets the entry ID. If not set, a new ID is generated.
    pub fn entry_id(mut self, id: EntryId) -> Self {
        self.entry_id = Some(id);
        self
    }

    /// Sets the entry type.
    pub fn entry_type(mut self, entry_type: impl Into<String>) -> Self {
        self.entry_type = Some(entry_type.into());
        self
    }

    /// Sets the stream ID.
    pub fn stream_id(mut self, id: StreamId) -> Self {
        self.stream_id = Some(id);
        self
    }

    /// Sets the stream type.
    pub fn stream_type(mut self, stream_type: impl Into<String>) -> Self {
        self.stream_type = Some(stream_type.into());
        self
    }

    /// Sets the revision.
    pub fn revision(mut self, revision: Revision) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Sets the recorded-at timestamp. Defaults to now.
    pub fn recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = Some(recorded_at);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Adds a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the ledger entry.
    ///
    /// # Panics
    ///
    /// Panics if a required field (entry_type, stream_id, stream_type,
    /// revision, payload) is not set.
    pub fn build(self) -> LedgerEntry {
        LedgerEntry {
            entry_id: self.entry_id.unwrap_or_default(),
            entry_type: self.entry_type.expect("entry_type is required"),
            stream_id: self.stream_id.expect("stream_id is required"),
            stream_type: self.stream_type.expect("stream_type is required"),
            revision: self.revision.expect("revision is required"),
            recorded_at: self.recorded_at.unwrap_or_else(Utc::now),
            payload: self.payload.expect("payload is required"),
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_id_new_creates_unique_ids() {
        assert_ne!(EntryId::new(), EntryId::new());
    }

    #[test]
    fn revision_ordering() {
        let r1 = Revision::new(1);
        let r2 = Revision::new(2);
        assert!(r1 < r2);
        assert_eq!(r1.next(), r2);
    }

    #[test]
    fn revision_initial_and_first() {
        assert_eq!(Revision::initial().as_i64(), 0);
        assert_eq!(Revision::first().as_i64(), 1);
        assert_eq!(Revision::initial().next(), Revision::first());
    }

    #[test]
    fn entry_builder() {
        let stream_id = StreamId::new();
        let payload = serde_json::json!({"status": "Delivered"});

        let entry = LedgerEntry::builder()
            .entry_type("ShipmentStatusUpdated")
            .stream_id(stream_id)
            .stream_type("Shipment")
            .revision(Revision::first())
            .payload_raw(payload.clone())
            .metadata("actor", serde_json::json!("courier"))
            .build();

        assert_eq!(entry.entry_type, "ShipmentStatusUpdated");
        assert_eq!(entry.stream_id, stream_id);
        assert_eq!(entry.stream_type, "Shipment");
        assert_eq!(entry.revision, Revision::first());
        assert_eq!(entry.payload, payload);
        assert_eq!(
            entry.metadata.get("actor"),
            Some(&serde_json::json!("courier"))
        );
    }
}
