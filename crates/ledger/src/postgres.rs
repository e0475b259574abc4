use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    EntryId, EntryQuery, LedgerEntry, LedgerError, Result, Revision, Snapshot, StreamId,
    store::{AppendOptions, EntryStream, Ledger, validate_append_batch},
};

/// PostgreSQL-backed ledger implementation.
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Creates a new PostgreSQL ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_entry(row: PgRow) -> Result<LedgerEntry> {
        let metadata_json: serde_json::Value = row.try_get("metadata")?;
        let metadata: HashMap<String, serde_json::Value> = serde_json::from_value(metadata_json)?;

        Ok(LedgerEntry {
            entry_id: EntryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            entry_type: row.try_get("entry_type")?,
            stream_id: StreamId::from_uuid(row.try_get::<Uuid, _>("stream_id")?),
            stream_type: row.try_get("stream_type")?,
            revision: Revision::new(row.try_get("revision")?),
            recorded_at: row.try_get("recorded_at")?,
            payload: row.try_get("payload")?,
            metadata,
        })
    }
}

#[async_trait]
impl Ledger for PostgresLedger {
    async fn append(&self, entries: Vec<LedgerEntry>, options: AppendOptions) -> Result<Revision> {
        validate_append_batch(&entries)?;

        let stream_id = entries[0].stream_id;

        let mut tx = self.pool.begin().await?;

        if let Some(expected) = options.expected_revision {
            let current: Option<i64> =
                sqlx::query_scalar("SELECT MAX(revision) FROM ledger_entries WHERE stream_id = $1")
                    .bind(stream_id.as_uuid())
                    .fetch_one(&mut *tx)
                    .await?;

            let actual = Revision::new(current.unwrap_or(0));

            if actual != expected {
                return Err(LedgerError::ConcurrencyConflict {
                    stream_id,
                    expected,
                    actual,
                });
            }
        }

        let mut last_revision = Revision::initial();
        for entry in &entries {
            let metadata_json = serde_json::to_value(&entry.metadata)?;

            sqlx::query(
                r#"
                INSERT INTO ledger_entries (id, entry_type, stream_id, stream_type, revision, recorded_at, payload, metadata)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(entry.entry_id.as_uuid())
            .bind(&entry.entry_type)
            .bind(entry.stream_id.as_uuid())
            .bind(&entry.stream_type)
            .bind(entry.revision.as_i64())
            .bind(entry.recorded_at)
            .bind(&entry.payload)
            .bind(metadata_json)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // A unique constraint hit on (stream_id, revision) means
                // another writer got there first.
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("uq_stream_revision")
                {
                    return LedgerError::ConcurrencyConflict {
                        stream_id,
                        expected: options.expected_revision.unwrap_or(Revision::initial()),
                        actual: entry.revision,
                    };
                }
                LedgerError::Database(e)
            })?;

            last_revision = entry.revision;
        }

        tx.commit().await?;
        metrics::counter!("ledger_entries_appended").increment(entries.len() as u64);
        Ok(last_revision)
    }

    async fn entries_for_stream(&self, stream_id: StreamId) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, entry_type, stream_id, stream_type, revision, recorded_at, payload, metadata
            FROM ledger_entries
            WHERE stream_id = $1
            ORDER BY revision ASC
            "#,
        )
        .bind(stream_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_entry).collect()
    }

    async fn entries_for_stream_from(
        &self,
        stream_id: StreamId,
        from_revision: Revision,
    ) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, entry_type, stream_id, stream_type, revision, recorded_at, payload, metadata
            FROM ledger_entries
            WHERE stream_id = $1 AND revision >= $2
            ORDER BY revision ASC
            "#,
        )
        .bind(stream_id.as_uuid())
        .bind(from_revision.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_entry).collect()
    }

    async fn query_entries(&self, query: EntryQuery) -> Result<Vec<LedgerEntry>> {
        let mut sql = String::from(
            "SELECT id, entry_type, stream_id, stream_type, revision, recorded_at, payload, metadata FROM ledger_entries WHERE 1=1",
        );
        let mut param_count = 0;

        if query.stream_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND stream_id = ${param_count}"));
        }
        if query.stream_type.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND stream_type = ${param_count}"));
        }
        if query.entry_types.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND entry_type = ANY(${param_count})"));
        }
        if query.from_revision.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND revision >= ${param_count}"));
        }
        if query.to_revision.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND revision <= ${param_count}"));
        }
        if query.from_recorded_at.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND recorded_at >= ${param_count}"));
        }
        if query.to_recorded_at.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND recorded_at <= ${param_count}"));
        }

        sql.push_str(" ORDER BY recorded_at ASC, revision ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(id) = query.stream_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(stream_type) = query.stream_type {
            sqlx_query = sqlx_query.bind(stream_type);
        }
        if let Some(entry_types) = query.entry_types {
            sqlx_query = sqlx_query.bind(entry_types);
        }
        if let Some(from_revision) = query.from_revision {
            sqlx_query = sqlx_query.bind(from_revision.as_i64());
        }
        if let Some(to_revision) = query.to_revision {
            sqlx_query = sqlx_query.bind(to_revision.as_i64());
        }
        if let Some(from_ts) = query.from_recorded_at {
            sqlx_query = sqlx_query.bind(from_ts);
        }
        if let Some(to_ts) = query.to_recorded_at {
            sqlx_query = sqlx_query.bind(to_ts);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_entry).collect()
    }

    async fn entries_by_type(&self, entry_type: &str) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, entry_type, stream_id, stream_type, revision, recorded_at, payload, metadata
            FROM ledger_entries
            WHERE entry_type = $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(entry_type)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_entry).collect()
    }

    async fn stream_all_entries(&self) -> Result<EntryStream> {
        use futures_util::StreamExt;

        let stream = sqlx::query(
            r#"
            SELECT id, entry_type, stream_id, stream_type, revision, recorded_at, payload, metadata
            FROM ledger_entries
            ORDER BY recorded_at ASC, id ASC
            "#,
        )
        .fetch(&self.pool)
        .map(|result| match result {
            Ok(row) => Self::row_to_entry(row),
            Err(e) => Err(LedgerError::Database(e)),
        });

        Ok(Box::pin(stream))
    }

    async fn stream_revision(&self, stream_id: StreamId) -> Result<Option<Revision>> {
        let revision: Option<i64> =
            sqlx::query_scalar("SELECT MAX(revision) FROM ledger_entries WHERE stream_id = $1")
                .bind(stream_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(revision.map(Revision::new))
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO snapshots (stream_id, stream_type, revision, taken_at, state)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (stream_id) DO UPDATE SET
                stream_type = EXCLUDED.stream_type,
                revision = EXCLUDED.revision,
                taken_at = EXCLUDED.taken_at,
                state = EXCLUDED.state
            "#,
        )
        .bind(snapshot.stream_id.as_uuid())
        .bind(&snapshot.stream_type)
        .bind(snapshot.revision.as_i64())
        .bind(snapshot.taken_at)
        .bind(&snapshot.state)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_snapshot(&self, stream_id: StreamId) -> Result<Option<Snapshot>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT stream_id, stream_type, revision, taken_at, state
            FROM snapshots
            WHERE stream_id = $1
            "#,
        )
        .bind(stream_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Snapshot {
                stream_id: StreamId::from_uuid(row.try_get::<Uuid, _>("stream_id")?),
                stream_type: row.try_get("stream_type")?,
                revision: Revision::new(row.try_get("revision")?),
                taken_at: row.try_get::<DateTime<Utc>, _>("taken_at")?,
                state: row.try_get("state")?,
            })),
            None => Ok(None),
        }
    }
}
