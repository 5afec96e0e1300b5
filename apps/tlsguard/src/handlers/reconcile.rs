use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::info;

use crate::AppState;
use crate::engine::{RemediationReport, SnapshotStatus, SyncReport};
use crate::error::ReconcileError;

pub async fn init_schema(State(state): State<AppState>) -> Result<Json<Value>, ReconcileError> {
    state.engine.init_schema().await?;
    Ok(Json(json!({ "status": "ok" })))
}

pub async fn snapshot_status(
    State(state): State<AppState>,
) -> Result<Json<SnapshotStatus>, ReconcileError> {
    Ok(Json(state.engine.status().await?))
}

pub async fn run_sync(State(state): State<AppState>) -> Result<Json<SyncReport>, ReconcileError> {
    if !state.toggles.sync_enabled {
        return Err(ReconcileError::Disabled("snapshot sync"));
    }
    info!("Snapshot sync requested over HTTP");
    Ok(Json(state.engine.run_snapshot_sync().await?))
}

pub async fn run_remediation(
    State(state): State<AppState>,
) -> Result<Json<RemediationReport>, ReconcileError> {
    if !state.toggles.remediation_enabled {
        return Err(ReconcileError::Disabled("remediation pass"));
    }
    info!("Remediation pass requested over HTTP");
    Ok(Json(state.engine.run_remediation_pass().await?))
}
