pub mod models;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use self::models::UtilizationRow;
use crate::{gym::Utilization, store::HistoryStore};

pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed history of utilization readings.
#[derive(Debug, Clone)]
pub struct UtilizationStore {
    pool: PgPool,
}

impl UtilizationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl HistoryStore for UtilizationStore {
    async fn add(&self, batch: &[Utilization]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        // One statement may not touch the same row twice, so collapse
        // repeated timestamps first. Later entries win.
        let mut rows: BTreeMap<DateTime<Utc>, UtilizationRow> = BTreeMap::new();
        for u in batch {
            let row = UtilizationRow::try_from(u)?;
            rows.insert(row.recorded_at, row);
        }

        let mut query = QueryBuilder::<Postgres>::new(
            "INSERT INTO utilization (recorded_at, people, capacity) ",
        );
        query.push_values(rows.values(), |mut b, row| {
            b.push_bind(row.recorded_at)
                .push_bind(row.people)
                .push_bind(row.capacity);
        });
        query.push(
            " ON CONFLICT (recorded_at) DO UPDATE \
             SET people = EXCLUDED.people, capacity = EXCLUDED.capacity",
        );

        query
            .build()
            .execute(&self.pool)
            .await
            .context("writing utilization rows")?;

        debug!(rows = rows.len(), "Utilization rows written");
        Ok(())
    }

    async fn since(&self, since: DateTime<Utc>) -> Result<Vec<Utilization>> {
        let rows = sqlx::query_as::<_, UtilizationRow>(
            r#"
            SELECT recorded_at, people, capacity
            FROM utilization
            WHERE recorded_at >= $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .context("querying utilization rows")?;

        rows.into_iter()
            .map(|r| Utilization::try_from(r).context("invalid utilization row"))
            .collect()
    }
}
