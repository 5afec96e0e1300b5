use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::source::SourceError;

/// Cause of an aborted reconcile operation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("snapshot sync aborted on page {page}: {source}")]
    Source {
        page: u32,
        #[source]
        source: SourceError,
    },

    #[error("snapshot store failure: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error("{0} is disabled by configuration")]
    Disabled(&'static str),
}

impl IntoResponse for ReconcileError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReconcileError::Source { .. } => StatusCode::BAD_GATEWAY,
            ReconcileError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ReconcileError::Disabled(_) => StatusCode::FORBIDDEN,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
