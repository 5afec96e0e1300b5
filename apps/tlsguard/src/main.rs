use axum::{
    Router,
    routing::{get, post},
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod engine;
mod error;
mod handlers;
mod source;

use config::AppConfig;
use engine::ReconcileEngine;
use error::ReconcileError;
use source::cloudflare::CloudflareClient;
use tlsguard_db::repositories::hostname_repo::HostnameRepository;

#[derive(Parser, Debug)]
#[command(author, version, about = "Reconciles custom hostname TLS settings", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Create the snapshot table and indexes
    InitSchema,
    /// Run one snapshot sync and print the report
    Sync,
    /// Run one remediation pass and print the report
    Remediate,
}

/// Which passes the boundary is allowed to dispatch.
#[derive(Debug, Clone, Copy)]
pub struct PassToggles {
    pub sync_enabled: bool,
    pub remediation_enabled: bool,
}

impl Default for PassToggles {
    fn default() -> Self {
        Self {
            sync_enabled: true,
            remediation_enabled: true,
        }
    }
}

impl From<&AppConfig> for PassToggles {
    fn from(config: &AppConfig) -> Self {
        Self {
            sync_enabled: config.sync_enabled,
            remediation_enabled: config.remediation_enabled,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub engine: ReconcileEngine,
    pub toggles: PassToggles,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/status", get(handlers::reconcile::snapshot_status))
        .route("/api/schema", post(handlers::reconcile::init_schema))
        .route("/api/sync", post(handlers::reconcile::run_sync))
        .route("/api/remediate", post(handlers::reconcile::run_remediation))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tlsguard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = AppConfig::load()?;
    tracing::info!("tlsguard starting...");
    tracing::info!("Zone: {}", config.zone_id);
    tracing::info!("API base: {}", config.api_base);
    tracing::info!(
        "Sync enabled: {}, remediation enabled: {}",
        config.sync_enabled,
        config.remediation_enabled
    );

    let pool = tlsguard_db::db::init_db(&config.database_url, config.db_max_connections).await?;
    let store = Arc::new(HostnameRepository::new(pool));
    let source = Arc::new(CloudflareClient::new(
        config.api_base.clone(),
        config.zone_id.clone(),
        config.api_token.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )?);

    let state = AppState {
        engine: ReconcileEngine::new(store, source, config.limits()),
        toggles: PassToggles::from(&config),
    };

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state, config.listen_port).await,
        Command::InitSchema => {
            state.engine.init_schema().await?;
            Ok(())
        }
        Command::Sync => {
            if !state.toggles.sync_enabled {
                return Err(ReconcileError::Disabled("snapshot sync").into());
            }
            print_report(&state.engine.run_snapshot_sync().await?)
        }
        Command::Remediate => {
            if !state.toggles.remediation_enabled {
                return Err(ReconcileError::Disabled("remediation pass").into());
            }
            print_report(&state.engine.run_remediation_pass().await?)
        }
    }
}

async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_report<T: Serialize>(report: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
