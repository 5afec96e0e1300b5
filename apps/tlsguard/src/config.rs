use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;

use crate::engine::EngineLimits;

pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub zone_id: String,
    pub api_token: String,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    // Checked by the HTTP/CLI boundary before a pass is dispatched.
    #[serde(default = "default_true")]
    pub sync_enabled: bool,
    #[serde(default = "default_true")]
    pub remediation_enabled: bool,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    #[serde(default = "default_concurrency")]
    pub remediation_concurrency: usize,
}

fn default_max_connections() -> u32 {
    5
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_listen_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> u32 {
    EngineLimits::default().page_size
}

fn default_batch_size() -> i64 {
    EngineLimits::default().batch_size
}

fn default_concurrency() -> usize {
    EngineLimits::default().remediation_concurrency
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let config_paths = vec!["/etc/tlsguard/tlsguard.toml", "./tlsguard.toml"];

        for path in config_paths {
            if let Ok(contents) = fs::read_to_string(path) {
                tracing::info!("Loading config from {}", path);
                return Self::from_toml_str(&contents)
                    .with_context(|| format!("Invalid config file {}", path));
            }
        }

        tracing::info!("Loading config from environment");
        Self::from_env()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn from_env() -> Result<Self> {
        let config = Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", default_max_connections())?,
            api_base: std::env::var("CLOUDFLARE_API_BASE").unwrap_or_else(|_| default_api_base()),
            zone_id: std::env::var("CLOUDFLARE_ZONE_ID")
                .context("CLOUDFLARE_ZONE_ID must be set")?,
            api_token: std::env::var("CLOUDFLARE_API_TOKEN")
                .context("CLOUDFLARE_API_TOKEN must be set")?,
            http_timeout_secs: env_or("HTTP_TIMEOUT_SECS", default_http_timeout())?,
            listen_port: env_or("LISTEN_PORT", default_listen_port())?,
            sync_enabled: env_flag("SYNC_ENABLED", true)?,
            remediation_enabled: env_flag("REMEDIATION_ENABLED", true)?,
            page_size: env_or("PAGE_SIZE", default_page_size())?,
            batch_size: env_or("BATCH_SIZE", default_batch_size())?,
            remediation_concurrency: env_or("REMEDIATION_CONCURRENCY", default_concurrency())?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            anyhow::bail!("page_size must be greater than zero");
        }
        if self.batch_size <= 0 {
            anyhow::bail!("batch_size must be greater than zero");
        }
        if self.remediation_concurrency == 0 {
            anyhow::bail!("remediation_concurrency must be greater than zero");
        }
        Ok(())
    }

    pub fn limits(&self) -> EngineLimits {
        EngineLimits {
            page_size: self.page_size,
            batch_size: self.batch_size,
            remediation_concurrency: self.remediation_concurrency,
        }
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn env_flag(name: &str, default: bool) -> Result<bool> {
    match std::env::var(name) {
        Ok(raw) => parse_flag(&raw).with_context(|| {
            format!(
                "{} has an invalid value: {} (expected true/false, 1/0, yes/no or on/off)",
                name, raw
            )
        }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
