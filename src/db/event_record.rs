use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::EventStore;
use crate::models::EventRecord;

/// Postgres-backed event store.
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Idempotent, safe to run on every startup.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS form_event (
                id BIGSERIAL PRIMARY KEY,
                project_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                event_type TEXT NOT NULL,
                field_name TEXT,
                duration_ms BIGINT,
                timestamp TIMESTAMP WITH TIME ZONE NOT NULL,
                user_agent TEXT,
                ip_address TEXT,
                page_url TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn append(&self, records: Vec<EventRecord>) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        for record in &records {
            sqlx::query(
                r#"
                INSERT INTO form_event
                    (project_id, session_id, event_type, field_name, duration_ms,
                     timestamp, user_agent, ip_address, page_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(&record.project_id)
            .bind(&record.session_id)
            .bind(&record.event_type)
            .bind(&record.field_name)
            .bind(record.duration_ms)
            .bind(record.timestamp)
            .bind(&record.user_agent)
            .bind(&record.ip_address)
            .bind(&record.page_url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
