use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::SnapshotStore;
use crate::models::hostname::{HostnameRecord, TARGET_MIN_TLS_VERSION};

/// Process-local snapshot store keyed by record id.
///
/// Follows the same replace and ordering rules as the PostgreSQL table, so
/// harnesses can seed it directly and run remediation without a sync.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<String, HostnameRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed<I>(&self, records: I)
    where
        I: IntoIterator<Item = HostnameRecord>,
    {
        let mut rows = self.rows.lock().await;
        for record in records {
            rows.insert(record.id.clone(), record);
        }
    }

    pub async fn snapshot(&self) -> Vec<HostnameRecord> {
        self.rows.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, record: &HostnameRecord) -> Result<()> {
        let mut rows = self.rows.lock().await;
        let mut row = record.clone();
        if let Some(existing) = rows.get(&record.id) {
            row.created_at = existing.created_at;
        }
        rows.insert(row.id.clone(), row);
        Ok(())
    }

    async fn mark_compliant(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let mut rows = self.rows.lock().await;
        let Some(row) = rows.get_mut(id) else {
            return Ok(false);
        };
        row.min_tls_version = TARGET_MIN_TLS_VERSION.to_string();
        row.needs_update = false;
        row.last_updated = at;
        Ok(true)
    }

    async fn list_non_compliant(&self, limit: i64) -> Result<Vec<HostnameRecord>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let rows = self.rows.lock().await;
        Ok(rows
            .values()
            .filter(|r| r.needs_update)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<HostnameRecord>> {
        Ok(self.rows.lock().await.get(id).cloned())
    }

    async fn count_records(&self) -> Result<i64> {
        Ok(self.rows.lock().await.len() as i64)
    }

    async fn count_non_compliant(&self) -> Result<i64> {
        let rows = self.rows.lock().await;
        Ok(rows.values().filter(|r| r.needs_update).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(id: &str, min_tls: Option<&str>, at: DateTime<Utc>) -> HostnameRecord {
        HostnameRecord::observed(
            id.to_string(),
            format!("{}.example.com", id),
            "active".to_string(),
            "txt".to_string(),
            "dv".to_string(),
            min_tls.map(str::to_string),
            at,
        )
    }

    #[tokio::test]
    async fn upsert_replaces_mutable_fields_and_keeps_created_at() {
        let store = MemoryStore::new();
        let first = Utc::now();
        let later = first + Duration::minutes(5);

        store.upsert(&record("a", Some("1.0"), first)).await.unwrap();
        let mut replacement = record("a", Some("1.2"), later);
        replacement.ssl_status = "pending_validation".to_string();
        store.upsert(&replacement).await.unwrap();

        let row = store.get("a").await.unwrap().unwrap();
        assert_eq!(row.created_at, first);
        assert_eq!(row.last_updated, later);
        assert_eq!(row.ssl_status, "pending_validation");
        assert!(!row.needs_update);
        assert_eq!(store.count_records().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mark_compliant_clears_flag() {
        let store = MemoryStore::new();
        let at = Utc::now();
        store.upsert(&record("a", None, at)).await.unwrap();

        let later = at + Duration::seconds(30);
        assert!(store.mark_compliant("a", later).await.unwrap());

        let row = store.get("a").await.unwrap().unwrap();
        assert_eq!(row.min_tls_version, TARGET_MIN_TLS_VERSION);
        assert!(!row.needs_update);
        assert_eq!(row.last_updated, later);
    }

    #[tokio::test]
    async fn mark_compliant_missing_id_is_not_found() {
        let store = MemoryStore::new();
        assert!(!store.mark_compliant("ghost", Utc::now()).await.unwrap());
        assert_eq!(store.count_records().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_non_compliant_is_capped_and_ordered_by_id() {
        let store = MemoryStore::new();
        let at = Utc::now();
        store
            .seed([
                record("c", Some("1.0"), at),
                record("a", Some("1.1"), at),
                record("b", Some("1.2"), at),
                record("d", None, at),
            ])
            .await;

        let ids: Vec<String> = store
            .list_non_compliant(2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(store.count_non_compliant().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn list_non_compliant_empty_store_returns_empty() {
        let store = MemoryStore::new();
        assert!(store.list_non_compliant(100).await.unwrap().is_empty());
    }
}
