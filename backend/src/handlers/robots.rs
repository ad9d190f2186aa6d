use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::time::Instant;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::{load_robot, parse_path_id},
    models::{
        robot::{RobotPayload, RobotResponse},
        session::SessionResponse,
        ApiResponse,
    },
    state::AppState,
    types::RobotId,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct RobotHealth {
    pub status: &'static str,
    pub address: String,
    /// Probe latency in milliseconds.
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lists every robot together with its sessions.
pub async fn list_robots(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RobotResponse>>>, AppError> {
    let robots = state.repos.robots.list().await?;
    let mut out = Vec::with_capacity(robots.len());
    for robot in robots {
        let sessions = state.repos.sessions.list_by_robot(robot.id).await?;
        out.push(
            RobotResponse::from(robot)
                .with_sessions(sessions.into_iter().map(SessionResponse::from).collect()),
        );
    }
    Ok(Json(ApiResponse::success("OK", out)))
}

pub async fn create_robot(
    State(state): State<AppState>,
    Json(payload): Json<RobotPayload>,
) -> Result<Json<ApiResponse<RobotResponse>>, AppError> {
    payload.validate()?;
    let robot = state.repos.robots.create(&payload).await?;
    tracing::info!(robot_id = %robot.id, address = %robot.address, "Robot created");
    Ok(Json(ApiResponse::success("Created", robot.into())))
}

pub async fn get_robot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RobotResponse>>, AppError> {
    let id: RobotId = parse_path_id(&id, "robot id")?;
    let robot = load_robot(&state, id).await?;
    Ok(Json(ApiResponse::success("OK", robot.into())))
}

pub async fn update_robot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RobotPayload>,
) -> Result<Json<ApiResponse<RobotResponse>>, AppError> {
    let id: RobotId = parse_path_id(&id, "robot id")?;
    payload.validate()?;
    let robot = state
        .repos
        .robots
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound("Robot not found".into()))?;
    Ok(Json(ApiResponse::success("Updated", robot.into())))
}

/// Probes the robot endpoint. Anything but a 200 answers 503 with the
/// measured latency in `data`.
pub async fn robot_health(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RobotHealth>>, AppError> {
    let id: RobotId = parse_path_id(&id, "robot id")?;
    let robot = load_robot(&state, id).await?;

    let started = Instant::now();
    let result = state.robot_api.check_health(&robot.address).await;
    let response_time_ms = started.elapsed().as_millis() as u64;

    let (message, error) = match result {
        Ok(true) => {
            return Ok(Json(ApiResponse::success(
                "Robot is healthy",
                RobotHealth {
                    status: "healthy",
                    address: robot.address,
                    response_time_ms,
                    error: None,
                },
            )))
        }
        Ok(false) => ("Robot is unhealthy".to_string(), None),
        Err(err) => {
            tracing::warn!(robot_id = %id, address = %robot.address, error = %err, "Robot probe failed");
            (format!("Robot is unhealthy: {}", err), Some(err.to_string()))
        }
    };

    let body = RobotHealth {
        status: "unhealthy",
        address: robot.address,
        response_time_ms,
        error,
    };
    Err(AppError::ServiceUnavailable(
        message,
        serde_json::to_value(body).ok(),
    ))
}
