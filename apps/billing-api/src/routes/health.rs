//! Liveness and database health.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    /// `"applied/embedded"`, absent when the database is unreachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<String>,
    pub version: &'static str,
    pub server_time: String,
}

/// `GET /health`
///
/// 503 when `SELECT 1` fails or migrations are behind.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let migrations = if database {
        state.db.migration_status().await.ok()
    } else {
        None
    };
    let current = matches!(migrations, Some((embedded, applied)) if applied >= embedded);

    let status = if database && current {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if status == StatusCode::OK { "ok" } else { "degraded" },
            database,
            migrations: migrations.map(|(embedded, applied)| format!("{applied}/{embedded}")),
            version: env!("CARGO_PKG_VERSION"),
            server_time: chrono::Utc::now().to_rfc3339(),
        }),
    )
}
