use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::SnapshotStore;
use crate::models::hostname::{HostnameRecord, TARGET_MIN_TLS_VERSION};

const SCHEMA_SQL: &str = include_str!("../../migrations/20240101000000_custom_hostnames.sql");

// created_at stays out of the update list so a replace keeps the
// first-seen timestamp.
const UPSERT_SQL: &str = r#"
    INSERT INTO custom_hostnames (
        id, hostname, ssl_status, ssl_method, ssl_type,
        min_tls_version, needs_update, last_updated, created_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    ON CONFLICT (id) DO UPDATE SET
        hostname = excluded.hostname,
        ssl_status = excluded.ssl_status,
        ssl_method = excluded.ssl_method,
        ssl_type = excluded.ssl_type,
        min_tls_version = excluded.min_tls_version,
        needs_update = excluded.needs_update,
        last_updated = excluded.last_updated
"#;

#[derive(Debug, Clone)]
pub struct HostnameRepository {
    pool: PgPool,
}

impl HostnameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for HostnameRepository {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .context("Failed to create custom_hostnames schema")?;

        debug!("custom_hostnames schema ensured");
        Ok(())
    }

    async fn upsert(&self, record: &HostnameRecord) -> Result<()> {
        sqlx::query(UPSERT_SQL)
            .bind(&record.id)
            .bind(&record.hostname)
            .bind(&record.ssl_status)
            .bind(&record.ssl_method)
            .bind(&record.ssl_type)
            .bind(&record.min_tls_version)
            .bind(record.needs_update)
            .bind(record.last_updated)
            .bind(record.created_at)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to upsert custom hostname {}", record.id))?;

        Ok(())
    }

    async fn mark_compliant(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE custom_hostnames SET min_tls_version = $1, needs_update = FALSE, last_updated = $2 WHERE id = $3",
        )
        .bind(TARGET_MIN_TLS_VERSION)
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to mark custom hostname {} compliant", id))?;

        if result.rows_affected() == 0 {
            debug!("mark_compliant matched no row for custom hostname {}", id);
            return Ok(false);
        }
        Ok(true)
    }

    async fn list_non_compliant(&self, limit: i64) -> Result<Vec<HostnameRecord>> {
        sqlx::query_as::<_, HostnameRecord>(
            "SELECT * FROM custom_hostnames WHERE needs_update = TRUE ORDER BY id ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch non-compliant custom hostnames")
    }

    async fn get(&self, id: &str) -> Result<Option<HostnameRecord>> {
        sqlx::query_as::<_, HostnameRecord>("SELECT * FROM custom_hostnames WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch custom hostname by ID")
    }

    async fn count_records(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM custom_hostnames")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count custom hostnames")
    }

    async fn count_non_compliant(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM custom_hostnames WHERE needs_update = TRUE")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count non-compliant custom hostnames")
    }
}
