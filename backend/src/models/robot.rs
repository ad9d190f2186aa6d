//! Robot endpoint configuration: the address of an automation API instance and
//! the admin key used to mint authorization keys on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::session::SessionResponse;
use crate::types::RobotId;
use crate::validation::rules::validate_robot_address;

#[derive(Debug, Clone, FromRow)]
/// Database representation of a robot endpoint.
pub struct RobotConfig {
    pub id: RobotId,
    /// Base URL of the automation API, e.g. `http://10.0.0.5:8080`.
    pub address: String,
    /// Credential for the `/admin/*` endpoints.
    pub admin_key: String,
    /// Tenant that owns the robot.
    pub owner_id: i64,
    pub description: String,
    /// Comma-joined list of operator wxids allowed to manage the robot.
    pub admin_users: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl RobotConfig {
    pub fn admin_user_list(&self) -> Vec<String> {
        split_admin_users(&self.admin_users)
    }
}

pub fn join_admin_users(users: &[String]) -> String {
    users
        .iter()
        .map(|user| user.trim())
        .filter(|user| !user.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn split_admin_users(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Create/update payload; both operations take the full record.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RobotPayload {
    #[validate(custom(function = "validate_robot_address"))]
    pub address: String,
    #[validate(length(min = 1, max = 255))]
    pub admin_key: String,
    #[validate(range(min = 1))]
    pub owner_id: i64,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,
    #[serde(default)]
    pub admin_users: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RobotResponse {
    pub id: RobotId,
    pub address: String,
    pub admin_key: String,
    pub owner_id: i64,
    pub description: String,
    pub admin_users: Vec<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_logins: Option<Vec<SessionResponse>>,
}

impl From<RobotConfig> for RobotResponse {
    fn from(robot: RobotConfig) -> Self {
        let admin_users = robot.admin_user_list();
        Self {
            id: robot.id,
            address: robot.address,
            admin_key: robot.admin_key,
            owner_id: robot.owner_id,
            description: robot.description,
            admin_users,
            create_time: robot.create_time,
            update_time: robot.update_time,
            user_logins: None,
        }
    }
}

impl RobotResponse {
    pub fn with_sessions(mut self, sessions: Vec<SessionResponse>) -> Self {
        self.user_logins = Some(sessions);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_users_round_trip_through_comma_list() {
        let joined = join_admin_users(&[" alice ".into(), "".into(), "bob".into()]);
        assert_eq!(joined, "alice,bob");
        assert_eq!(split_admin_users(&joined), vec!["alice", "bob"]);
        assert!(split_admin_users("").is_empty());
    }

    #[test]
    fn payload_rejects_missing_scheme_and_owner() {
        let payload = RobotPayload {
            address: "not a url".into(),
            admin_key: "k".into(),
            owner_id: 0,
            description: String::new(),
            admin_users: vec![],
        };
        let errors = payload.validate().expect_err("invalid payload");
        let fields = errors.field_errors();
        assert!(fields.contains_key("address"));
        assert!(fields.contains_key("owner_id"));
    }
}
