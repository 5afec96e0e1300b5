use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{HostnamePage, RecordSource, RemoteHostname, SourceError};

// The PATCH contract requires a validation method/type pair next to the
// TLS setting, even though only the TLS floor changes.
const VALIDATION_METHOD: &str = "txt";
const CERTIFICATE_TYPE: &str = "dv";

const MAX_DETAIL_LEN: usize = 512;

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct ResultInfo {
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

/// Client for the Cloudflare custom hostnames API of a single zone.
#[derive(Clone)]
pub struct CloudflareClient {
    client: Client,
    base_url: String,
    zone_id: String,
    api_token: String,
}

impl CloudflareClient {
    pub fn new(base_url: String, zone_id: String, api_token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            zone_id,
            api_token,
        })
    }

    fn hostnames_url(&self) -> String {
        format!("{}/zones/{}/custom_hostnames", self.base_url, self.zone_id)
    }

    async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>, SourceError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                detail: describe_failure(&body),
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))?;

        if !envelope.success {
            return Err(SourceError::Rejected(join_messages(&envelope.errors)));
        }

        Ok(envelope)
    }
}

#[async_trait]
impl RecordSource for CloudflareClient {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<HostnamePage, SourceError> {
        debug!("Fetching custom hostnames page {} (per_page={})", page, per_page);

        let url = format!("{}?page={}&per_page={}", self.hostnames_url(), page, per_page);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        let envelope: Envelope<Vec<RemoteHostname>> = Self::read_envelope(response).await?;
        let records = envelope
            .result
            .ok_or_else(|| SourceError::Decode("listing response has no result".to_string()))?;

        // Without pagination metadata the page is treated as the last one.
        let total_pages = envelope.result_info.map(|info| info.total_pages).unwrap_or(page);

        Ok(HostnamePage {
            records,
            page,
            total_pages,
        })
    }

    async fn set_min_tls_version(&self, id: &str, version: &str) -> Result<(), SourceError> {
        let url = format!("{}/{}", self.hostnames_url(), id);
        let body = json!({
            "ssl": {
                "method": VALIDATION_METHOD,
                "type": CERTIFICATE_TYPE,
                "settings": {
                    "min_tls_version": version
                }
            }
        });

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        Self::read_envelope::<serde_json::Value>(response).await?;
        Ok(())
    }
}

fn join_messages(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details provided".to_string();
    }
    errors
        .iter()
        .map(|e| format!("[{}] {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_failure(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(body) {
        if !envelope.errors.is_empty() {
            return join_messages(&envelope.errors);
        }
    }
    let trimmed = body.trim();
    if trimmed.len() <= MAX_DETAIL_LEN {
        return trimmed.to_string();
    }
    let mut end = MAX_DETAIL_LEN;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}
