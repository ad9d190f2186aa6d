//! Logged-in WeChat sessions bound to a robot endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{RobotId, SessionId};

/// Lifecycle state of a session, stored and serialized as a small integer.
/// Schemas document it through `#[schema(value_type = i16)]` on the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Default)]
#[repr(i16)]
pub enum SessionStatus {
    /// Logged in and usable.
    #[default]
    Normal = 1,
    /// Flagged by risk control upstream. Never written by the reconcilers.
    Risk = 2,
    /// Upstream session is gone; only a fresh QR login brings it back.
    NeedsRelogin = 3,
}

impl SessionStatus {
    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(SessionStatus::Normal),
            2 => Some(SessionStatus::Risk),
            3 => Some(SessionStatus::NeedsRelogin),
            _ => None,
        }
    }
}

impl Serialize for SessionStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i16(self.code())
    }
}

impl<'de> Deserialize<'de> for SessionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = i16::deserialize(deserializer)?;
        SessionStatus::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown session status {code}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
/// Database representation of a session (`wx_user_logins`).
pub struct UserSession {
    pub id: SessionId,
    pub robot_id: RobotId,
    /// Authorization key the session was logged in with.
    pub token: String,
    pub wx_id: String,
    pub nick_name: String,
    pub extension_time: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
    pub has_security_risk: bool,
    pub status: SessionStatus,
    pub is_initialized: bool,
    pub is_message_bot: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl UserSession {
    /// Sessions that may be picked to send outbound group messages.
    pub fn is_message_bot_eligible(&self) -> bool {
        self.status == SessionStatus::Normal && self.is_message_bot && !self.has_security_risk
    }
}

/// Everything the save flow writes; `id` and `create_time` are owned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    pub robot_id: RobotId,
    pub token: String,
    pub wx_id: String,
    pub nick_name: String,
    pub extension_time: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
    pub has_security_risk: bool,
    pub status: SessionStatus,
    pub is_initialized: bool,
    pub is_message_bot: bool,
}

/// Row produced by the message-bot candidate join (sessions x groups x robots).
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct BotCandidate {
    pub session_id: SessionId,
    pub robot_id: RobotId,
    pub token: String,
    pub wx_id: String,
    pub nick_name: String,
    pub robot_address: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: SessionId,
    pub robot_id: RobotId,
    pub token: String,
    pub wx_id: String,
    pub nick_name: String,
    pub extension_time: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
    pub has_security_risk: bool,
    #[schema(value_type = i16)]
    pub status: SessionStatus,
    pub is_initialized: bool,
    pub is_message_bot: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl From<UserSession> for SessionResponse {
    fn from(session: UserSession) -> Self {
        Self {
            id: session.id,
            robot_id: session.robot_id,
            token: session.token,
            wx_id: session.wx_id,
            nick_name: session.nick_name,
            extension_time: session.extension_time,
            expiration_time: session.expiration_time,
            has_security_risk: session.has_security_risk,
            status: session.status,
            is_initialized: session.is_initialized,
            is_message_bot: session.is_message_bot,
            create_time: session.create_time,
            update_time: session.update_time,
        }
    }
}

/// Payload of `POST /users/save`, sent once a QR scan reports success.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SaveSessionPayload {
    pub robot_id: RobotId,
    #[validate(length(min = 1, max = 500))]
    pub token: String,
    #[validate(length(min = 1, max = 100))]
    pub wx_id: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub nick_name: String,
    /// Skips the risk probe when the caller already knows the account is flagged.
    #[serde(default)]
    #[validate(range(max = 1))]
    pub has_security_risk: u8,
    #[serde(default)]
    #[validate(range(max = 1))]
    pub is_message_bot: u8,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MessageBotFlagPayload {
    #[validate(range(max = 1))]
    pub is_message_bot: u8,
}
