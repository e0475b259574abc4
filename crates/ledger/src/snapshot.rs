use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Revision, StreamId};

/// A snapshot of an entity's derived state at a specific revision.
///
/// Snapshots are a replay optimization only: derived state is always
/// reproducible from the entries alone, a snapshot just shortens the
/// replay for long-lived streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The stream this snapshot belongs to.
    pub stream_id: StreamId,

    /// The kind of entity the stream tracks.
    pub stream_type: String,

    /// The stream revision the snapshot was taken at.
    pub revision: Revision,

    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,

    /// The serialized entity state.
    pub state: serde_json::Value,
}

impl Snapshot {
    /// Creates a new snapshot from a raw JSON state.
    pub fn new(
        stream_id: StreamId,
        stream_type: impl Into<String>,
        revision: Revision,
        state: serde_json::Value,
    ) -> Self {
        Self {
            stream_id,
            stream_type: stream_type.into(),
            revision,
            taken_at: Utc::now(),
            state,
        }
    }

    /// Creates a snapshot from a serializable state.
    pub fn from_state<T: Serialize>(
        stream_id: StreamId,
        stream_type: impl Into<String>,
        revision: Revision,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            stream_id,
            stream_type,
            revision,
            serde_json::to_value(state)?,
        ))
    }
}
