use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::hostname::HostnameRecord;

pub mod hostname_repo;
pub mod memory;

/// Keyed snapshot of remote hostname records plus the derived compliance flag.
///
/// The flag is the only coupling between snapshot sync and remediation:
/// remediation trusts whatever the last writer stored here.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Creates the table and its indexes. Safe on an initialized store.
    async fn ensure_schema(&self) -> Result<()>;

    /// Inserts or fully replaces the row for `record.id`, keeping the
    /// original `created_at` on replace.
    async fn upsert(&self, record: &HostnameRecord) -> Result<()>;

    /// Forces the row to the target TLS version and clears its flag.
    /// Returns `false` when no row has this id.
    async fn mark_compliant(&self, id: &str, at: DateTime<Utc>) -> Result<bool>;

    /// Up to `limit` flagged rows in ascending id order.
    async fn list_non_compliant(&self, limit: i64) -> Result<Vec<HostnameRecord>>;

    async fn get(&self, id: &str) -> Result<Option<HostnameRecord>>;

    async fn count_records(&self) -> Result<i64>;

    async fn count_non_compliant(&self) -> Result<i64>;
}
