use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// GET /utils/health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, database, code) = match state.db.ping().await {
        Ok(()) => ("ok", "ok", StatusCode::OK),
        Err(e) => {
            tracing::error!("Health check database ping failed: {}", e);
            ("degraded", "unreachable", StatusCode::SERVICE_UNAVAILABLE)
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now(),
        }),
    )
}
