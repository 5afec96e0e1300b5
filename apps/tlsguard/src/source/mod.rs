use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod cloudflare;
#[cfg(test)]
pub mod mock;

/// Failure talking to the remote record source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Non-2xx response.
    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// 2xx response whose payload reports `success: false`.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SslSettings {
    #[serde(default)]
    pub min_tls_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteSsl {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, rename = "type")]
    pub ssl_type: Option<String>,
    #[serde(default)]
    pub settings: Option<SslSettings>,
}

/// A hostname as reported by the remote listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteHostname {
    pub id: String,
    pub hostname: String,
    #[serde(default)]
    pub ssl: Option<RemoteSsl>,
}

impl RemoteHostname {
    pub fn min_tls_version(&self) -> Option<String> {
        self.ssl
            .as_ref()
            .and_then(|ssl| ssl.settings.as_ref())
            .and_then(|settings| settings.min_tls_version.clone())
    }
}

/// One page of the listing plus where it sits in the full result set.
#[derive(Debug, Clone)]
pub struct HostnamePage {
    pub records: Vec<RemoteHostname>,
    pub page: u32,
    pub total_pages: u32,
}

impl HostnamePage {
    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }
}

/// Paginated listing plus per-id mutation of remote hostname records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch one page; pages are numbered from 1.
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<HostnamePage, SourceError>;

    /// Set the minimum TLS version of the hostname with this id.
    async fn set_min_tls_version(&self, id: &str, version: &str) -> Result<(), SourceError>;
}
