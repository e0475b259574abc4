//! Command handling infrastructure.

use std::marker::PhantomData;

use common::StreamId;
use ledger::{AppendOptions, Ledger, LedgerEntry, LedgerExt, Revision, Snapshot};
use serde::Serialize;

use crate::aggregate::{DomainEvent, EventSourced, SnapshotCapable};
use crate::error::WorkflowError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: EventSourced> {
    /// The entity after applying the new events.
    pub entity: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The new revision of the stream after the command.
    pub new_revision: Revision,
}

/// Trait for commands that can be executed against an entity.
///
/// Commands represent an intention to perform an action. They may be rejected
/// if the entity's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// The type of entity this command targets.
    type Entity: EventSourced;

    /// Returns the ID of the stream this command targets.
    fn stream_id(&self) -> StreamId;
}

/// Handler for executing commands against event-sourced entities.
///
/// The handler is responsible for:
/// 1. Loading the entity from the ledger (with optional snapshot)
/// 2. Executing the command to produce events
/// 3. Persisting the events with an expected-revision check
/// 4. Optionally saving a snapshot
pub struct CommandHandler<L, A>
where
    L: Ledger,
    A: EventSourced,
{
    ledger: L,
    _phantom: PhantomData<A>,
}

impl<L, A> CommandHandler<L, A>
where
    L: Ledger,
    A: EventSourced,
{
    /// Creates a new command handler with the given ledger.
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Loads an entity from the ledger.
    ///
    /// If the stream doesn't exist, returns a default instance.
    pub async fn load(&self, stream_id: StreamId) -> Result<A, WorkflowError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let (snapshot, entries) = self.ledger.load_stream(stream_id).await?;

        let mut entity = if let Some(snapshot) = snapshot {
            self.restore_from_snapshot(snapshot)?
        } else {
            A::default()
        };

        // Apply entries after snapshot
        for entry in entries {
            let event: A::Event = serde_json::from_value(entry.payload)?;
            entity.apply(event);
            entity.set_revision(entry.revision);
        }

        Ok(entity)
    }

    /// Loads an entity, returning None if the stream doesn't exist.
    pub async fn load_existing(&self, stream_id: StreamId) -> Result<Option<A>, WorkflowError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let entity = self.load(stream_id).await?;
        if entity.id().is_some() {
            Ok(Some(entity))
        } else {
            Ok(None)
        }
    }

    /// Executes a command and persists the resulting events.
    ///
    /// The command function receives the current entity state and returns
    /// either a list of events to apply, or an error. Appending uses the
    /// loaded revision as the expected revision, so a concurrent writer on
    /// the same stream surfaces as a `ConcurrencyConflict`.
    pub async fn execute<F>(
        &self,
        stream_id: StreamId,
        command_fn: F,
    ) -> Result<CommandResult<A>, WorkflowError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de> + Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        WorkflowError: From<A::Error>,
    {
        let mut entity = self.load(stream_id).await?;
        let current_revision = entity.revision();

        // Execute command to get events
        let events = command_fn(&entity)?;

        if events.is_empty() {
            return Ok(CommandResult {
                entity,
                events: vec![],
                new_revision: current_revision,
            });
        }

        // Build ledger entries for persistence
        let entries = self.build_entries(stream_id, current_revision, &events)?;

        // Persist with optimistic concurrency
        let options = if current_revision == Revision::initial() {
            AppendOptions::expect_new()
        } else {
            AppendOptions::expect_revision(current_revision)
        };

        let new_revision = self.ledger.append(entries, options).await?;

        // Apply events to the entity
        for event in &events {
            entity.apply(event.clone());
        }
        entity.set_revision(new_revision);

        Ok(CommandResult {
            entity,
            events,
            new_revision,
        })
    }

    /// Builds ledger entries from domain events.
    fn build_entries(
        &self,
        stream_id: StreamId,
        current_revision: Revision,
        events: &[A::Event],
    ) -> Result<Vec<LedgerEntry>, WorkflowError>
    where
        A::Event: Serialize,
    {
        let mut entries = Vec::with_capacity(events.len());
        let mut revision = current_revision;

        for event in events {
            revision = revision.next();
            let entry = LedgerEntry::builder()
                .stream_id(stream_id)
                .stream_type(A::stream_type())
                .entry_type(event.event_type())
                .revision(revision)
                .payload(event)?
                .build();
            entries.push(entry);
        }

        Ok(entries)
    }

    fn restore_from_snapshot(&self, snapshot: Snapshot) -> Result<A, WorkflowError>
    where
        A: for<'de> serde::Deserialize<'de>,
    {
        let entity: A = serde_json::from_value(snapshot.state)?;
        Ok(entity)
    }
}

impl<L, A> CommandHandler<L, A>
where
    L: Ledger,
    A: SnapshotCapable,
{
    /// Executes a command and optionally saves a snapshot.
    pub async fn execute_with_snapshot<F>(
        &self,
        stream_id: StreamId,
        command_fn: F,
    ) -> Result<CommandResult<A>, WorkflowError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de> + Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        WorkflowError: From<A::Error>,
    {
        let result = self.execute(stream_id, command_fn).await?;

        if result.entity.should_snapshot() {
            let snapshot = Snapshot::from_state(
                stream_id,
                A::stream_type(),
                result.new_revision,
                &result.entity,
            )?;
            self.ledger.save_snapshot(snapshot).await?;
        }

        Ok(result)
    }
}
