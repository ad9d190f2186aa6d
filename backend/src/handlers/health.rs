use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppError, models::ApiResponse, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Liveness plus a database round trip. Answers 503 when the store is down.
pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthStatus>>, AppError> {
    let timestamp = Utc::now();
    match state.repos.robots.ping().await {
        Ok(()) => Ok(Json(ApiResponse::success(
            "Service is running",
            HealthStatus {
                status: "ok",
                database: "ok",
                timestamp,
            },
        ))),
        Err(err) => {
            tracing::error!(error = %err, "Database health check failed");
            Err(AppError::ServiceUnavailable(
                "Database unavailable".into(),
                Some(serde_json::json!({
                    "status": "error",
                    "database": "error",
                    "error": err.to_string(),
                    "timestamp": timestamp,
                })),
            ))
        }
    }
}
