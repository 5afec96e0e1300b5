use chrono::Utc;
use futures::{StreamExt, stream};
use tlsguard_db::models::hostname::{HostnameRecord, TARGET_MIN_TLS_VERSION};
use tracing::{info, warn};

use super::{ReconcileEngine, RemediationReport};
use crate::error::ReconcileError;

impl ReconcileEngine {
    /// Patches one bounded batch of flagged hostnames up to the TLS target.
    ///
    /// Per-record failures land in `errors` and never abort the pass; only a
    /// failure to read the batch from the store does.
    pub async fn run_remediation_pass(&self) -> Result<RemediationReport, ReconcileError> {
        let batch = self.store.list_non_compliant(self.limits.batch_size).await?;

        if batch.is_empty() {
            info!("No non-compliant hostnames to remediate");
            return Ok(RemediationReport::default());
        }

        info!(
            "Remediating {} non-compliant hostnames (concurrency={})",
            batch.len(),
            self.limits.remediation_concurrency
        );

        let outcomes: Vec<Result<(), String>> = stream::iter(batch)
            .map(|record| self.remediate_one(record))
            .buffered(self.limits.remediation_concurrency.max(1))
            .collect()
            .await;

        let mut report = RemediationReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(()) => report.updated += 1,
                Err(message) => report.errors.push(message),
            }
        }

        info!(
            "Remediation pass finished: {} updated, {} failed",
            report.updated,
            report.errors.len()
        );

        Ok(report)
    }

    async fn remediate_one(&self, record: HostnameRecord) -> Result<(), String> {
        if let Err(e) = self
            .source
            .set_min_tls_version(&record.id, TARGET_MIN_TLS_VERSION)
            .await
        {
            warn!("Failed to update TLS for {} ({}): {}", record.hostname, record.id, e);
            return Err(format!("{}: {}", record.hostname, e));
        }

        match self.store.mark_compliant(&record.id, Utc::now()).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(
                    "Custom hostname {} ({}) is no longer in the snapshot; flag not cleared",
                    record.hostname, record.id
                );
                Ok(())
            }
            Err(e) => {
                warn!("Failed to clear flag for {} ({}): {:#}", record.hostname, record.id, e);
                Err(format!(
                    "{}: updated remotely but local flag not cleared: {:#}",
                    record.hostname, e
                ))
            }
        }
    }
}
