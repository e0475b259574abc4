//! Core event-sourced entity and domain event traits.

use common::StreamId;
use ledger::Revision;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the workflow.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// This is used for serialization and ledger filtering.
    fn event_type(&self) -> &'static str;
}

/// Trait for event-sourced entities.
///
/// An entity's state is never stored directly; it is rebuilt by replaying
/// the entries of its ledger stream. Commands validate against the current
/// state and produce events; `apply` folds events back into state.
pub trait EventSourced: Default + Send + Sync + Sized {
    /// The type of events this entity produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this entity can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the stream type name.
    ///
    /// Used for ledger organization and routing.
    fn stream_type() -> &'static str;

    /// Returns the entity's stream identifier.
    ///
    /// Returns None for a new, uninitialized entity.
    fn id(&self) -> Option<StreamId>;

    /// Returns the current revision of the entity.
    ///
    /// Revision starts at 0 for a new entity and increments with each entry.
    fn revision(&self) -> Revision;

    /// Sets the entity revision.
    ///
    /// Called by the command handler after loading entries.
    fn set_revision(&mut self, revision: Revision);

    /// Applies an event to the entity, updating its state.
    ///
    /// This method must be pure and deterministic:
    /// - Given the same state and event, it must always produce the same new state
    /// - It must not have side effects
    /// - It must not fail (events represent facts that have happened)
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

/// Trait for entities that support snapshotting.
///
/// Snapshotting is an optimization to avoid replaying all entries when
/// loading an entity. The state is periodically serialized and stored.
pub trait SnapshotCapable: EventSourced + Serialize + DeserializeOwned {
    /// Returns the snapshot interval (number of entries between snapshots).
    fn snapshot_interval() -> usize {
        100
    }

    /// Returns whether a snapshot should be taken at the current revision.
    fn should_snapshot(&self) -> bool {
        self.revision().as_i64() > 0
            && (self.revision().as_i64() as usize).is_multiple_of(Self::snapshot_interval())
    }
}
