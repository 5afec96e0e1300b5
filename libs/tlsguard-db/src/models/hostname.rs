use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// TLS floor every hostname is reconciled towards.
pub const TARGET_MIN_TLS_VERSION: &str = "1.2";

/// Stored when the remote source reports no minimum TLS setting.
pub const UNKNOWN_TLS_VERSION: &str = "unknown";

/// One externally-managed hostname and its last-known TLS posture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HostnameRecord {
    pub id: String,
    pub hostname: String,
    pub ssl_status: String,
    pub ssl_method: String,
    pub ssl_type: String,
    pub min_tls_version: String,
    pub needs_update: bool,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl HostnameRecord {
    /// Builds a record as observed by a snapshot sync at `observed_at`.
    ///
    /// `needs_update` is derived here and only here; reads never recompute it.
    pub fn observed(
        id: String,
        hostname: String,
        ssl_status: String,
        ssl_method: String,
        ssl_type: String,
        min_tls_version: Option<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        let min_tls_version = min_tls_version.unwrap_or_else(|| UNKNOWN_TLS_VERSION.to_string());
        let needs_update = needs_update(&min_tls_version);

        Self {
            id,
            hostname,
            ssl_status,
            ssl_method,
            ssl_type,
            min_tls_version,
            needs_update,
            last_updated: observed_at,
            created_at: observed_at,
        }
    }
}

pub fn needs_update(min_tls_version: &str) -> bool {
    min_tls_version != TARGET_MIN_TLS_VERSION
}
