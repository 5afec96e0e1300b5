use chrono::{DateTime, Utc};
use tlsguard_db::models::hostname::HostnameRecord;
use tracing::{debug, error, info};

use super::{ReconcileEngine, SyncReport};
use crate::error::ReconcileError;
use crate::source::RemoteHostname;

impl ReconcileEngine {
    /// Pages through the whole remote listing and upserts every hostname.
    ///
    /// A failed page fetch or store write aborts the run; rows already
    /// written stay.
    pub async fn run_snapshot_sync(&self) -> Result<SyncReport, ReconcileError> {
        let per_page = self.limits.page_size;
        let mut report = SyncReport::default();
        let mut page = 1;

        info!("Starting snapshot sync (per_page={})", per_page);

        loop {
            let listing = self
                .source
                .fetch_page(page, per_page)
                .await
                .map_err(|source| {
                    error!("Snapshot sync failed on page {}: {}", page, source);
                    ReconcileError::Source { page, source }
                })?;

            debug!(
                "Page {}/{} returned {} hostnames",
                listing.page,
                listing.total_pages,
                listing.records.len()
            );

            let observed_at = Utc::now();
            for remote in &listing.records {
                report.total_processed += 1;

                let record = observed_record(remote, observed_at);
                if let Err(e) = self.store.upsert(&record).await {
                    error!(
                        "Snapshot sync failed storing {} ({}) from page {}: {:#}",
                        record.hostname, record.id, page, e
                    );
                    return Err(ReconcileError::Store(e.context(format!(
                        "page {}, hostname {} ({})",
                        page, record.hostname, record.id
                    ))));
                }
                report.total_inserted += 1;
            }

            if listing.is_last() {
                break;
            }
            page += 1;
        }

        info!(
            "Snapshot sync finished: {} processed, {} stored",
            report.total_processed, report.total_inserted
        );

        Ok(report)
    }
}

fn observed_record(remote: &RemoteHostname, observed_at: DateTime<Utc>) -> HostnameRecord {
    let ssl = remote.ssl.clone().unwrap_or_default();

    HostnameRecord::observed(
        remote.id.clone(),
        remote.hostname.clone(),
        ssl.status.unwrap_or_default(),
        ssl.method.unwrap_or_default(),
        ssl.ssl_type.unwrap_or_default(),
        remote.min_tls_version(),
        observed_at,
    )
}
