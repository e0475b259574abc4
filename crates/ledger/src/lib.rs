//! Append-only tracking ledger.
//!
//! Every status transition in the fulfillment engine is recorded as an
//! immutable [`LedgerEntry`] on a per-entity stream. Entries are never
//! edited or removed; current entity state is always derivable by
//! replaying a stream from the beginning. Optimistic concurrency is
//! enforced through per-stream [`Revision`] numbers.

pub mod entry;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod snapshot;
pub mod store;

pub use common::StreamId;
pub use entry::{EntryId, LedgerEntry, LedgerEntryBuilder, Revision};
pub use error::{LedgerError, Result};
pub use memory::InMemoryLedger;
pub use postgres::PostgresLedger;
pub use query::EntryQuery;
pub use snapshot::Snapshot;
pub use store::{AppendOptions, EntryStream, Ledger, LedgerExt};
