use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{EntryQuery, LedgerEntry, LedgerError, Result, Revision, Snapshot, StreamId};

/// Options for appending entries to the ledger.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected revision of the stream, for optimistic concurrency.
    /// If None, no revision check is performed (use with caution).
    pub expected_revision: Option<Revision>,
}

impl AppendOptions {
    /// Creates options with no revision check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stream to be at a specific revision.
    pub fn expect_revision(revision: Revision) -> Self {
        Self {
            expected_revision: Some(revision),
        }
    }

    /// Creates options expecting an empty stream (new entity).
    pub fn expect_new() -> Self {
        Self {
            expected_revision: Some(Revision::initial()),
        }
    }
}

/// A stream of ledger entries.
pub type EntryStream = Pin<Box<dyn Stream<Item = Result<LedgerEntry>> + Send>>;

/// Core trait for ledger implementations.
///
/// A ledger persists immutable entries and serves them back in order.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Appends a batch of entries to a single stream.
    ///
    /// The batch is atomic. When `options.expected_revision` is set the
    /// append fails with [`LedgerError::ConcurrencyConflict`] if the
    /// stream's current revision doesn't match, which is how two
    /// concurrent transitions on the same shipment or return are kept
    /// from interleaving.
    ///
    /// Returns the stream revision after the append.
    async fn append(&self, entries: Vec<LedgerEntry>, options: AppendOptions) -> Result<Revision>;

    /// Retrieves all entries for a stream, oldest first.
    async fn entries_for_stream(&self, stream_id: StreamId) -> Result<Vec<LedgerEntry>>;

    /// Retrieves entries for a stream starting from a revision (inclusive).
    ///
    /// Used when replaying from a snapshot.
    async fn entries_for_stream_from(
        &self,
        stream_id: StreamId,
        from_revision: Revision,
    ) -> Result<Vec<LedgerEntry>>;

    /// Retrieves entries matching a query.
    async fn query_entries(&self, query: EntryQuery) -> Result<Vec<LedgerEntry>>;

    /// Retrieves all entries of a given type, in recorded order.
    async fn entries_by_type(&self, entry_type: &str) -> Result<Vec<LedgerEntry>>;

    /// Streams every entry in the ledger in insertion order.
    async fn stream_all_entries(&self) -> Result<EntryStream>;

    /// Returns the current revision of a stream, or None for an empty stream.
    async fn stream_revision(&self, stream_id: StreamId) -> Result<Option<Revision>>;

    /// Saves a snapshot, replacing any previous snapshot for the stream.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Retrieves the latest snapshot for a stream, if any.
    async fn get_snapshot(&self, stream_id: StreamId) -> Result<Option<Snapshot>>;
}

/// Convenience methods layered over [`Ledger`].
#[async_trait]
pub trait LedgerExt: Ledger {
    /// Appends a single entry.
    async fn append_entry(&self, entry: LedgerEntry, options: AppendOptions) -> Result<Revision> {
        self.append(vec![entry], options).await
    }

    /// Returns true if the stream has at least one entry.
    async fn stream_exists(&self, stream_id: StreamId) -> Result<bool> {
        Ok(self.stream_revision(stream_id).await?.is_some())
    }

    /// Loads a stream for replay, optionally starting from a snapshot.
    ///
    /// Returns the snapshot (if any) and the entries recorded after it.
    async fn load_stream(
        &self,
        stream_id: StreamId,
    ) -> Result<(Option<Snapshot>, Vec<LedgerEntry>)> {
        if let Some(snapshot) = self.get_snapshot(stream_id).await? {
            let entries = self
                .entries_for_stream_from(stream_id, snapshot.revision.next())
                .await?;
            Ok((Some(snapshot), entries))
        } else {
            let entries = self.entries_for_stream(stream_id).await?;
            Ok((None, entries))
        }
    }
}

impl<T: Ledger + ?Sized> LedgerExt for T {}

/// Validates a batch of entries before appending.
///
/// All entries must target the same stream and carry strictly sequential
/// revisions.
pub fn validate_append_batch(entries: &[LedgerEntry]) -> Result<()> {
    if entries.is_empty() {
        return Err(LedgerError::InvalidBatch(
            "cannot append an empty batch".to_string(),
        ));
    }

    let first = &entries[0];
    let mut expected = first.revision;
    for entry in entries.iter().skip(1) {
        if entry.stream_id != first.stream_id {
            return Err(LedgerError::InvalidBatch(
                "all entries in a batch must target the same stream".to_string(),
            ));
        }
        if entry.stream_type != first.stream_type {
            return Err(LedgerError::InvalidBatch(
                "all entries in a batch must share a stream type".to_string(),
            ));
        }
        expected = expected.next();
        if entry.revision != expected {
            return Err(LedgerError::InvalidBatch(format!(
                "entry revisions must be sequential: expected {}, got {}",
                expected, entry.revision
            )));
        }
    }

    Ok(())
}
