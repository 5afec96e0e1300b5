use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use super::{HostnamePage, RecordSource, RemoteHostname, RemoteSsl, SourceError, SslSettings};

pub fn remote(id: &str, min_tls: Option<&str>) -> RemoteHostname {
    RemoteHostname {
        id: id.to_string(),
        hostname: format!("{}.example.com", id),
        ssl: min_tls.map(|version| RemoteSsl {
            status: Some("active".to_string()),
            method: Some("http".to_string()),
            ssl_type: Some("dv".to_string()),
            settings: Some(SslSettings {
                min_tls_version: Some(version.to_string()),
            }),
        }),
    }
}

/// In-process record source serving fixed pages.
#[derive(Default)]
pub struct ScriptedSource {
    records: Vec<RemoteHostname>,
    fail_on_page: Option<u32>,
    failing_ids: HashSet<String>,
    page_requests: AtomicU32,
    updates: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new(records: Vec<RemoteHostname>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn fail_on_page(mut self, page: u32) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    pub fn fail_updates_for(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    pub fn page_requests(&self) -> u32 {
        self.page_requests.load(Ordering::SeqCst)
    }

    pub fn updated_ids(&self) -> Vec<String> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordSource for ScriptedSource {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<HostnamePage, SourceError> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);

        if self.fail_on_page == Some(page) {
            return Err(SourceError::Status {
                status: 500,
                detail: format!("page {} unavailable", page),
            });
        }

        let per_page = per_page as usize;
        let total_pages = self.records.len().div_ceil(per_page).max(1) as u32;
        let records = self
            .records
            .iter()
            .skip((page as usize - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect();

        Ok(HostnamePage {
            records,
            page,
            total_pages,
        })
    }

    async fn set_min_tls_version(&self, id: &str, _version: &str) -> Result<(), SourceError> {
        if self.failing_ids.contains(id) {
            return Err(SourceError::Status {
                status: 400,
                detail: "custom hostname is locked".to_string(),
            });
        }
        self.updates.lock().unwrap().push(id.to_string());
        Ok(())
    }
}
