use crate::AppState;
use axum::{Json, extract::State};
use serde_json::{Value, json};

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "sync_enabled": state.toggles.sync_enabled,
        "remediation_enabled": state.toggles.remediation_enabled,
        "version": env!("CARGO_PKG_VERSION")
    }))
}
