use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::{load_robot, parse_path_id},
    models::{
        session::{
            MessageBotFlagPayload, SaveSessionPayload, SessionDraft, SessionResponse,
            SessionStatus,
        },
        ApiResponse,
    },
    services::robot_api::{ApiError, LoginScan, LoginStatus},
    state::AppState,
    types::{RobotId, SessionId},
};

const AUTH_KEY_DAYS: u32 = 365;
const QR_CODE_TTL_MINUTES: i64 = 5;
const SESSION_VALIDITY_DAYS: i64 = 365;

/// Scan state reported to the console while polling a QR login.
pub const SCAN_EXPIRED: i32 = 0;
pub const SCAN_CONFIRMED: i32 = 2;
pub const SCAN_FAILED: i32 = 3;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthorizeRequest {
    pub robot_id: RobotId,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorizeResponse {
    pub token: String,
    pub robot_id: RobotId,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct QrCodeRequest {
    #[validate(length(min = 1, max = 500))]
    pub token: String,
    pub robot_id: RobotId,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QrCodeResponse {
    pub qr_code: String,
    pub qr_code_base64: String,
    pub token: String,
    /// Unix seconds after which the console should request a new code.
    pub expire_time: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanStatus {
    /// 2 logged in, 0 expired or unknown, 3 check failed.
    pub status: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub wx_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub nick_name: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageBotFlag {
    pub id: SessionId,
    pub is_message_bot: u8,
}

pub async fn list_by_robot(
    State(state): State<AppState>,
    Path(robot_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<SessionResponse>>>, AppError> {
    let robot_id: RobotId = parse_path_id(&robot_id, "robot id")?;
    let sessions = state.repos.sessions.list_by_robot(robot_id).await?;
    Ok(Json(ApiResponse::success(
        "OK",
        sessions.into_iter().map(SessionResponse::from).collect(),
    )))
}

/// Mints one authorization key valid for a year on the robot.
pub async fn authorize(
    State(state): State<AppState>,
    Json(req): Json<AuthorizeRequest>,
) -> Result<Json<ApiResponse<AuthorizeResponse>>, AppError> {
    let robot = load_robot(&state, req.robot_id).await?;
    let keys = state
        .robot_api
        .gen_auth_key(&robot.address, &robot.admin_key, 1, AUTH_KEY_DAYS)
        .await
        .map_err(|e| AppError::upstream("Authorization failed", e))?;

    let token = keys
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Upstream("Authorization failed: robot returned no key".into()))?;

    Ok(Json(ApiResponse::success(
        "Authorization key issued",
        AuthorizeResponse {
            token,
            robot_id: req.robot_id,
        },
    )))
}

pub async fn qr_code(
    State(state): State<AppState>,
    Json(req): Json<QrCodeRequest>,
) -> Result<Json<ApiResponse<QrCodeResponse>>, AppError> {
    req.validate()?;
    let robot = load_robot(&state, req.robot_id).await?;
    let qr = state
        .robot_api
        .get_login_qr_code(&robot.address, &req.token, false, "")
        .await
        .map_err(|e| AppError::upstream("QR code request failed", e))?;

    Ok(Json(ApiResponse::success(
        "QR code issued",
        QrCodeResponse {
            qr_code: qr.qr_code_url,
            qr_code_base64: qr.qr_code_base64,
            token: req.token,
            expire_time: (Utc::now() + Duration::minutes(QR_CODE_TTL_MINUTES)).timestamp(),
        },
    )))
}

/// Polls scan progress without persisting anything.
pub async fn scan_status(
    State(state): State<AppState>,
    Path((robot_id, token)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ScanStatus>>, AppError> {
    let robot_id: RobotId = parse_path_id(&robot_id, "robot id")?;
    if token.trim().is_empty() {
        return Err(AppError::BadRequest("token must not be empty".into()));
    }
    let robot = load_robot(&state, robot_id).await?;

    let status = match state.robot_api.check_login_status(&robot.address, &token).await {
        Ok(LoginScan::Found(data)) if data.state == 2 => ScanStatus {
            status: SCAN_CONFIRMED,
            wx_id: data.wx_id,
            nick_name: data.nick_name,
            message: "Logged in".into(),
        },
        Ok(_) => ScanStatus {
            status: SCAN_EXPIRED,
            wx_id: String::new(),
            nick_name: String::new(),
            message: "QR code expired or not found".into(),
        },
        Err(ApiError::Application { code, text, .. }) => {
            tracing::warn!(robot_id = %robot_id, code, text = %text, "Login status check rejected");
            ScanStatus {
                status: SCAN_FAILED,
                wx_id: String::new(),
                nick_name: String::new(),
                message: "Login status check failed".into(),
            }
        }
        Err(err) => return Err(AppError::upstream("Login status check failed", err)),
    };

    Ok(Json(ApiResponse::success("OK", status)))
}

/// Persists a freshly logged-in session. Unless the caller already flagged
/// the account, the risk probe decides `has_security_risk`; a failed probe
/// counts as no risk.
pub async fn save(
    State(state): State<AppState>,
    Json(payload): Json<SaveSessionPayload>,
) -> Result<Json<ApiResponse<SessionResponse>>, AppError> {
    payload.validate()?;
    let robot = state
        .repos
        .robots
        .find(payload.robot_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Robot of this session not found".into()))?;

    let mut has_security_risk = payload.has_security_risk == 1;
    if !has_security_risk {
        match state
            .robot_api
            .check_can_set_alias(&robot.address, &payload.token)
            .await
        {
            Ok(check) => has_security_risk = check.has_security_risk(),
            Err(err) => {
                tracing::warn!(wx_id = %payload.wx_id, error = %err, "Risk probe failed, saving without flag")
            }
        }
    }

    let valid_until = Utc::now() + Duration::days(SESSION_VALIDITY_DAYS);
    let draft = SessionDraft {
        robot_id: payload.robot_id,
        token: payload.token,
        wx_id: payload.wx_id,
        nick_name: payload.nick_name,
        extension_time: valid_until,
        expiration_time: valid_until,
        has_security_risk,
        status: SessionStatus::Normal,
        is_initialized: false,
        is_message_bot: payload.is_message_bot == 1,
    };
    let session = state.repos.sessions.save(&draft).await?;
    tracing::info!(
        session_id = %session.id,
        robot_id = %session.robot_id,
        wx_id = %session.wx_id,
        has_security_risk,
        "Session saved"
    );
    Ok(Json(ApiResponse::success("Saved", session.into())))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id: SessionId = parse_path_id(&id, "session id")?;
    if !state.repos.sessions.delete(id).await? {
        return Err(AppError::NotFound("Session not found".into()));
    }
    Ok(Json(ApiResponse::ok("Deleted")))
}

/// Online detail for a stored session, passed through from the robot.
pub async fn login_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<LoginStatus>>, AppError> {
    let id: SessionId = parse_path_id(&id, "session id")?;
    let session = state
        .repos
        .sessions
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".into()))?;
    let robot = state
        .repos
        .robots
        .find(session.robot_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Robot of this session not found".into()))?;

    let status = state
        .robot_api
        .get_login_status(&robot.address, &session.token)
        .await
        .map_err(|e| AppError::upstream("Login status request failed", e))?;
    Ok(Json(ApiResponse::success("OK", status)))
}

pub async fn set_message_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<MessageBotFlagPayload>,
) -> Result<Json<ApiResponse<MessageBotFlag>>, AppError> {
    let id: SessionId = parse_path_id(&id, "session id")?;
    payload.validate()?;
    let updated = state
        .repos
        .sessions
        .update_message_bot(id, payload.is_message_bot == 1)
        .await?;
    if !updated {
        return Err(AppError::NotFound("Session not found".into()));
    }
    Ok(Json(ApiResponse::success(
        "Updated",
        MessageBotFlag {
            id,
            is_message_bot: payload.is_message_bot,
        },
    )))
}
