use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    EventEnvelope, EventId, EventQuery, EventStoreError, Result, Sequence, Snapshot,
    store::{AppendOptions, EventStore, EventStream, check_tail, validate_events_for_append},
};

const SELECT_EVENTS: &str =
    "SELECT sequence, id, event_type, timestamp, payload, metadata FROM events";

/// PostgreSQL-backed event store implementation.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a new PostgreSQL event store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and returns a store over the new pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_event(row: PgRow) -> Result<EventEnvelope> {
        let metadata_json: serde_json::Value = row.try_get("metadata")?;
        let metadata: HashMap<String, serde_json::Value> = serde_json::from_value(metadata_json)?;

        Ok(EventEnvelope {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_type: row.try_get("event_type")?,
            sequence: Sequence::new(row.try_get("sequence")?),
            timestamp: row.try_get("timestamp")?,
            payload: row.try_get("payload")?,
            metadata,
        })
    }

    fn rows_to_events(rows: Vec<PgRow>) -> Result<Vec<EventEnvelope>> {
        rows.into_iter().map(Self::row_to_event).collect()
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(
        &self,
        events: Vec<EventEnvelope>,
        options: AppendOptions,
    ) -> Result<Sequence> {
        validate_events_for_append(&events)?;

        let mut tx = self.pool.begin().await?;

        let current: Option<i64> = sqlx::query_scalar("SELECT MAX(sequence) FROM events")
            .fetch_one(&mut *tx)
            .await?;
        let current = Sequence::new(current.unwrap_or(0));
        check_tail(current, events[0].sequence, &options)?;

        let mut last = current;
        for event in &events {
            let metadata_json = serde_json::to_value(&event.metadata)?;

            sqlx::query(
                r#"
                INSERT INTO events (sequence, id, event_type, timestamp, payload, metadata)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(event.sequence.as_i64())
            .bind(event.event_id.as_uuid())
            .bind(&event.event_type)
            .bind(event.timestamp)
            .bind(&event.payload)
            .bind(metadata_json)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // A concurrent writer committed the same tail position first
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("events_pkey")
                {
                    return EventStoreError::conflict(
                        options.expected_sequence.unwrap_or(current),
                        event.sequence,
                    );
                }
                EventStoreError::Database(e)
            })?;

            last = event.sequence;
        }

        tx.commit().await?;
        tracing::debug!(%last, count = events.len(), "appended events");
        metrics::counter!("event_store_appends_total", "store" => "postgres").increment(1);
        Ok(last)
    }

    async fn get_events_from(&self, from: Sequence) -> Result<Vec<EventEnvelope>> {
        let rows = sqlx::query(&format!(
            "{SELECT_EVENTS} WHERE sequence >= $1 ORDER BY sequence ASC"
        ))
        .bind(from.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_events(rows)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_EVENTS);
        builder.push(" WHERE TRUE");

        if let Some(types) = query.event_types {
            builder.push(" AND event_type = ANY(");
            builder.push_bind(types);
            builder.push(")");
        }
        if let Some(from) = query.from_sequence {
            builder.push(" AND sequence >= ");
            builder.push_bind(from.as_i64());
        }
        if let Some(to) = query.to_sequence {
            builder.push(" AND sequence <= ");
            builder.push_bind(to.as_i64());
        }
        if let Some(from) = query.from_timestamp {
            builder.push(" AND timestamp >= ");
            builder.push_bind(from);
        }
        if let Some(to) = query.to_timestamp {
            builder.push(" AND timestamp <= ");
            builder.push_bind(to);
        }

        builder.push(" ORDER BY sequence ASC");

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            builder.push(" OFFSET ");
            builder.push_bind(offset as i64);
        }

        let rows = builder.build().fetch_all(&self.pool).await?;
        Self::rows_to_events(rows)
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let rows = sqlx::query(&format!(
            "{SELECT_EVENTS} WHERE event_type = $1 ORDER BY sequence ASC"
        ))
        .bind(event_type)
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_events(rows)
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        // The returned stream must not borrow the pool, so rows are read
        // eagerly and decoded lazily.
        let rows = sqlx::query(&format!("{SELECT_EVENTS} ORDER BY sequence ASC"))
            .fetch_all(&self.pool)
            .await?;

        Ok(Box::pin(stream::iter(
            rows.into_iter().map(Self::row_to_event),
        )))
    }

    async fn current_sequence(&self) -> Result<Sequence> {
        let sequence: Option<i64> = sqlx::query_scalar("SELECT MAX(sequence) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(Sequence::new(sequence.unwrap_or(0)))
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO snapshots (aggregate_type, sequence, timestamp, state)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (aggregate_type) DO UPDATE SET
                sequence = EXCLUDED.sequence,
                timestamp = EXCLUDED.timestamp,
                state = EXCLUDED.state
            WHERE snapshots.sequence < EXCLUDED.sequence
            "#,
        )
        .bind(&snapshot.aggregate_type)
        .bind(snapshot.sequence.as_i64())
        .bind(snapshot.timestamp)
        .bind(&snapshot.state)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_snapshot(&self, aggregate_type: &str) -> Result<Option<Snapshot>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT aggregate_type, sequence, timestamp, state
            FROM snapshots
            WHERE aggregate_type = $1
            "#,
        )
        .bind(aggregate_type)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Snapshot {
                aggregate_type: row.try_get("aggregate_type")?,
                sequence: Sequence::new(row.try_get("sequence")?),
                timestamp: row.try_get::<DateTime<Utc>, _>("timestamp")?,
                state: row.try_get("state")?,
            })),
            None => Ok(None),
        }
    }
}
