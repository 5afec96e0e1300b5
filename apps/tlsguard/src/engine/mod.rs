//! Two-phase reconcile of custom hostname TLS settings.
//!
//! Snapshot sync copies every remote hostname into the snapshot store and
//! derives `needs_update`. The remediation pass only reads that flag, patches
//! flagged hostnames remotely and clears the flag on success. The passes never
//! lock against each other; the last writer wins.

use std::sync::Arc;

use serde::Serialize;
use tlsguard_db::repositories::SnapshotStore;
use tracing::info;

use crate::error::ReconcileError;
use crate::source::RecordSource;

mod remediation;
mod sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    /// Records requested per listing page.
    pub page_size: u32,
    /// Upper bound on records remediated per pass.
    pub batch_size: i64,
    /// Remote mutations in flight at once during remediation.
    pub remediation_concurrency: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            page_size: 50,
            batch_size: 100,
            remediation_concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub total_processed: u64,
    pub total_inserted: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemediationReport {
    pub updated: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStatus {
    pub total_records: i64,
    pub non_compliant: i64,
}

#[derive(Clone)]
pub struct ReconcileEngine {
    store: Arc<dyn SnapshotStore>,
    source: Arc<dyn RecordSource>,
    limits: EngineLimits,
}

impl ReconcileEngine {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        source: Arc<dyn RecordSource>,
        limits: EngineLimits,
    ) -> Self {
        Self {
            store,
            source,
            limits,
        }
    }

    pub async fn init_schema(&self) -> Result<(), ReconcileError> {
        self.store.ensure_schema().await?;
        info!("Snapshot schema is ready");
        Ok(())
    }

    pub async fn status(&self) -> Result<SnapshotStatus, ReconcileError> {
        Ok(SnapshotStatus {
            total_records: self.store.count_records().await?,
            non_compliant: self.store.count_non_compliant().await?,
        })
    }
}
