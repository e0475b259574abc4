use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    EntryQuery, LedgerEntry, LedgerError, Result, Revision, Snapshot, StreamId,
    store::{AppendOptions, EntryStream, Ledger, validate_append_batch},
};

/// In-memory ledger implementation.
///
/// Used for tests and for running the engine without a database; provides
/// the same interface and concurrency semantics as the PostgreSQL
/// implementation.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
    snapshots: Arc<RwLock<HashMap<StreamId, Snapshot>>>,
}

impl InMemoryLedger {
    /// Creates a new empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of entries stored.
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Clears all entries and snapshots.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        self.snapshots.write().await.clear();
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn append(&self, entries: Vec<LedgerEntry>, options: AppendOptions) -> Result<Revision> {
        validate_append_batch(&entries)?;

        let stream_id = entries[0].stream_id;
        let first_revision = entries[0].revision;

        let mut store = self.entries.write().await;

        let current = store
            .iter()
            .filter(|e| e.stream_id == stream_id)
            .map(|e| e.revision)
            .max()
            .unwrap_or(Revision::initial());

        if let Some(expected) = options.expected_revision
            && current != expected
        {
            return Err(LedgerError::ConcurrencyConflict {
                stream_id,
                expected,
                actual: current,
            });
        }

        // Mirrors the unique (stream_id, revision) index of the SQL ledger.
        if first_revision <= current && current != Revision::initial() {
            return Err(LedgerError::ConcurrencyConflict {
                stream_id,
                expected: options.expected_revision.unwrap_or(current),
                actual: current,
            });
        }

        let last = entries
            .last()
            .map(|e| e.revision)
            .unwrap_or(Revision::initial());
        metrics::counter!("ledger_entries_appended").increment(entries.len() as u64);
        store.extend(entries);

        Ok(last)
    }

    async fn entries_for_stream(&self, stream_id: StreamId) -> Result<Vec<LedgerEntry>> {
        let store = self.entries.read().await;
        let mut entries: Vec<_> = store
            .iter()
            .filter(|e| e.stream_id == stream_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.revision);
        Ok(entries)
    }

    async fn entries_for_stream_from(
        &self,
        stream_id: StreamId,
        from_revision: Revision,
    ) -> Result<Vec<LedgerEntry>> {
        let store = self.entries.read().await;
        let mut entries: Vec<_> = store
            .iter()
            .filter(|e| e.stream_id == stream_id && e.revision >= from_revision)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.revision);
        Ok(entries)
    }

    async fn query_entries(&self, query: EntryQuery) -> Result<Vec<LedgerEntry>> {
        let store = self.entries.read().await;
        let mut entries: Vec<_> = store
            .iter()
            .filter(|e| {
                if let Some(id) = query.stream_id
                    && e.stream_id != id
                {
                    return false;
                }
                if let Some(ref stream_type) = query.stream_type
                    && &e.stream_type != stream_type
                {
                    return false;
                }
                if let Some(ref types) = query.entry_types
                    && !types.contains(&e.entry_type)
                {
                    return false;
                }
                if let Some(from) = query.from_revision
                    && e.revision < from
                {
                    return false;
                }
                if let Some(to) = query.to_revision
                    && e.revision > to
                {
                    return false;
                }
                if let Some(from) = query.from_recorded_at
                    && e.recorded_at < from
                {
                    return false;
                }
                if let Some(to) = query.to_recorded_at
                    && e.recorded_at > to
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        entries.sort_by(|a, b| {
            a.recorded_at
                .cmp(&b.recorded_at)
                .then(a.revision.cmp(&b.revision))
        });

        let offset = query.offset.unwrap_or(0);
        let entries: Vec<_> = entries.into_iter().skip(offset).collect();

        let entries = if let Some(limit) = query.limit {
            entries.into_iter().take(limit).collect()
        } else {
            entries
        };

        Ok(entries)
    }

    async fn entries_by_type(&self, entry_type: &str) -> Result<Vec<LedgerEntry>> {
        let store = self.entries.read().await;
        let mut entries: Vec<_> = store
            .iter()
            .filter(|e| e.entry_type == entry_type)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        Ok(entries)
    }

    async fn stream_all_entries(&self) -> Result<EntryStream> {
        use futures_util::stream;

        let store = self.entries.read().await;
        let mut entries = store.clone();
        entries.sort_by(|a, b| {
            a.recorded_at
                .cmp(&b.recorded_at)
                .then(a.entry_id.as_uuid().cmp(&b.entry_id.as_uuid()))
        });

        Ok(Box::pin(stream::iter(entries.into_iter().map(Ok))))
    }

    async fn stream_revision(&self, stream_id: StreamId) -> Result<Option<Revision>> {
        let store = self.entries.read().await;
        Ok(store
            .iter()
            .filter(|e| e.stream_id == stream_id)
            .map(|e| e.revision)
            .max())
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        self.snapshots
            .write()
            .await
            .insert(snapshot.stream_id, snapshot);
        Ok(())
    }

    async fn get_snapshot(&self, stream_id: StreamId) -> Result<Option<Snapshot>> {
        Ok(self.snapshots.read().await.get(&stream_id).cloned())
    }
}
