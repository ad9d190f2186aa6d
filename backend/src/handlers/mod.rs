pub mod auth;
pub mod bills;
pub mod groups;
pub mod health;
pub mod messages;
pub mod robots;
pub mod users;

use std::str::FromStr;

use crate::{error::AppError, models::robot::RobotConfig, state::AppState, types::RobotId};

/// Parses a numeric path segment, answering 400 with `label` on failure.
pub(crate) fn parse_path_id<T: FromStr>(raw: &str, label: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {}", label)))
}

pub(crate) async fn load_robot(state: &AppState, id: RobotId) -> Result<RobotConfig, AppError> {
    state
        .repos
        .robots
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Robot not found".into()))
}
