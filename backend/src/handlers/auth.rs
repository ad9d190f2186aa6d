use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::{load_robot, parse_path_id},
    models::{session::SessionStatus, ApiResponse},
    state::AppState,
    types::RobotId,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ExtendAuthRequest {
    #[validate(range(min = 1, max = 3650))]
    pub days: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExtendAuthResponse {
    /// New expiry as reported by the robot, `YYYY-MM-DD`.
    pub expiry_date: String,
    /// Sessions whose extension time was moved.
    pub sessions_updated: u64,
}

/// Extends the authorization key of the robot's first normal session.
pub async fn extend(
    State(state): State<AppState>,
    Path(robot_id): Path<String>,
    Json(req): Json<ExtendAuthRequest>,
) -> Result<Json<ApiResponse<ExtendAuthResponse>>, AppError> {
    req.validate()?;
    let robot_id: RobotId = parse_path_id(&robot_id, "robot id")?;
    let robot = load_robot(&state, robot_id).await?;

    let sessions = state.repos.sessions.list_by_robot(robot_id).await?;
    if sessions.is_empty() {
        return Err(AppError::NotFound("No session bound to this robot".into()));
    }
    let token = sessions
        .into_iter()
        .find(|s| s.status == SessionStatus::Normal && !s.token.is_empty())
        .map(|s| s.token)
        .ok_or_else(|| AppError::NotFound("No usable session token for this robot".into()))?;

    let expiry_date = state
        .robot_api
        .delay_auth_key(&robot.address, &robot.admin_key, &token, req.days)
        .await
        .map_err(|e| AppError::upstream("Authorization extension failed", e))?;

    let sessions_updated = match parse_expiry_date(&expiry_date) {
        Some(expires_at) => {
            state
                .repos
                .sessions
                .update_extension(robot_id, &token, expires_at)
                .await?
        }
        None => {
            tracing::warn!(robot_id = %robot_id, expiry_date = %expiry_date, "Unparseable expiry date, session left unchanged");
            0
        }
    };

    Ok(Json(ApiResponse::success(
        "Authorization extended",
        ExtendAuthResponse {
            expiry_date,
            sessions_updated,
        },
    )))
}

/// Midnight UTC of a `YYYY-MM-DD` date.
fn parse_expiry_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
