use chrono::{DateTime, Utc};

use crate::{Revision, StreamId};

/// Builder for filtering ledger entries.
///
/// Supports filtering by stream, stream type, entry types, revision range
/// and time range, with optional paging.
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
    /// Filter by stream ID.
    pub stream_id: Option<StreamId>,

    /// Filter by stream type.
    pub stream_type: Option<String>,

    /// Filter by entry types (any of these).
    pub entry_types: Option<Vec<String>>,

    /// Minimum revision (inclusive).
    pub from_revision: Option<Revision>,

    /// Maximum revision (inclusive).
    pub to_revision: Option<Revision>,

    /// Entries recorded at or after this timestamp.
    pub from_recorded_at: Option<DateTime<Utc>>,

    /// Entries recorded at or before this timestamp.
    pub to_recorded_at: Option<DateTime<Utc>>,

    /// Maximum number of entries to return.
    pub limit: Option<usize>,

    /// Number of entries to skip.
    pub offset: Option<usize>,
}

impl EntryQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for a single stream.
    pub fn for_stream(stream_id: StreamId) -> Self {
        Self {
            stream_id: Some(stream_id),
            ..Default::default()
        }
    }

    /// Creates a query for entries of a single type.
    pub fn for_entry_type(entry_type: impl Into<String>) -> Self {
        Self {
            entry_types: Some(vec![entry_type.into()]),
            ..Default::default()
        }
    }

    /// Filters by stream ID.
    pub fn stream_id(mut self, id: StreamId) -> Self {
        self.stream_id = Some(id);
        self
    }

    /// Filters by stream type.
    pub fn stream_type(mut self, stream_type: impl Into<String>) -> Self {
        self.stream_type = Some(stream_type.into());
        self
    }

    /// Filters by a single entry type.
    pub fn entry_type(mut self, entry_type: impl Into<String>) -> Self {
        self.entry_types = Some(vec![entry_type.into()]);
        self
    }

    /// Filters by multiple entry types (any of these).
    pub fn entry_types(mut self, entry_types: Vec<String>) -> Self {
        self.entry_types = Some(entry_types);
        self
    }

    /// Filters to entries starting from this revision (inclusive).
    pub fn from_revision(mut self, revision: Revision) -> Self {
        self.from_revision = Some(revision);
        self
    }

    /// Filters to entries up to this revision (inclusive).
    pub fn to_revision(mut self, revision: Revision) -> Self {
        self.to_revision = Some(revision);
        self
    }

    /// Filters to entries recorded at or after this timestamp.
    pub fn from_recorded_at(mut self, ts: DateTime<Utc>) -> Self {
        self.from_recorded_at = Some(ts);
        self
    }

    /// Filters to entries recorded at or before this timestamp.
    pub fn to_recorded_at(mut self, ts: DateTime<Utc>) -> Self {
        self.to_recorded_at = Some(ts);
        self
    }

    /// Limits the number of entries returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many entries before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_for_stream() {
        let id = StreamId::new();
        let query = EntryQuery::for_stream(id);

        assert_eq!(query.stream_id, Some(id));
        assert!(query.entry_types.is_none());
    }

    #[test]
    fn query_for_entry_type() {
        let query = EntryQuery::for_entry_type("ShipmentCreated");

        assert!(query.stream_id.is_none());
        assert_eq!(query.entry_types, Some(vec!["ShipmentCreated".to_string()]));
    }

    #[test]
    fn query_builder_chain() {
        let id = StreamId::new();
        let query = EntryQuery::new()
            .stream_id(id)
            .stream_type("Shipment")
            .entry_type("ShipmentStatusUpdated")
            .from_revision(Revision::new(1))
            .to_revision(Revision::new(10))
            .limit(100)
            .offset(5);

        assert_eq!(query.stream_id, Some(id));
        assert_eq!(query.stream_type, Some("Shipment".to_string()));
        assert_eq!(
            query.entry_types,
            Some(vec!["ShipmentStatusUpdated".to_string()])
        );
        assert_eq!(query.from_revision, Some(Revision::new(1)));
        assert_eq!(query.to_revision, Some(Revision::new(10)));
        assert_eq!(query.limit, Some(100));
        assert_eq!(query.offset, Some(5));
    }
}
