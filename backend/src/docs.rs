#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    handlers::{
        auth::{ExtendAuthRequest, ExtendAuthResponse},
        health::HealthStatus,
        messages::{
            SendImageRequest, SendTextImageRequest, SendTextRequest, SetStrategyRequest,
            StrategyResponse,
        },
        robots::RobotHealth,
        users::{
            AuthorizeRequest, AuthorizeResponse, MessageBotFlag, QrCodeRequest, QrCodeResponse,
            ScanStatus,
        },
    },
    models::{
        bill::{Bill, BillListQuery, BillStat, BillStatsQuery},
        group::{Group, GroupSearchQuery},
        robot::{RobotPayload, RobotResponse},
        session::{MessageBotFlagPayload, SaveSessionPayload, SessionResponse},
        PageInfo,
    },
    services::{
        message_strategy::StrategyKind,
        robot_api::{LoginStatus, SentImage, SentText, TextImageReport},
    },
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_doc,
        list_robots_doc,
        create_robot_doc,
        get_robot_doc,
        update_robot_doc,
        robot_health_doc,
        sessions_by_robot_doc,
        authorize_doc,
        qr_code_doc,
        scan_status_doc,
        save_session_doc,
        delete_session_doc,
        login_status_doc,
        message_bot_status_doc,
        extend_auth_doc,
        send_text_doc,
        send_image_doc,
        send_text_image_doc,
        set_strategy_doc,
        groups_by_wx_id_doc,
        search_groups_doc,
        bill_stats_doc,
        bill_list_doc
    ),
    components(
        schemas(
            HealthStatus,
            // robots
            RobotPayload,
            RobotResponse,
            RobotHealth,
            // sessions
            SessionResponse,
            SaveSessionPayload,
            MessageBotFlagPayload,
            MessageBotFlag,
            AuthorizeRequest,
            AuthorizeResponse,
            QrCodeRequest,
            QrCodeResponse,
            ScanStatus,
            LoginStatus,
            ExtendAuthRequest,
            ExtendAuthResponse,
            // messaging
            SendTextRequest,
            SendImageRequest,
            SendTextImageRequest,
            SetStrategyRequest,
            StrategyResponse,
            StrategyKind,
            SentText,
            SentImage,
            TextImageReport,
            // groups & bills
            Group,
            GroupSearchQuery,
            Bill,
            BillStat,
            BillStatsQuery,
            BillListQuery,
            PageInfo
        )
    ),
    tags(
        (name = "System", description = "Service health"),
        (name = "Robots", description = "Robot endpoint configuration"),
        (name = "Users", description = "Login flow and session management"),
        (name = "Auth", description = "Authorization key lifetime"),
        (name = "Messages", description = "Outbound group messages"),
        (name = "Groups", description = "Synchronized group membership"),
        (name = "Bills", description = "Bill queries")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database reachable", body = HealthStatus),
        (status = 503, description = "Database unreachable")
    ),
    tag = "System"
)]
fn health_doc() {}

#[utoipa::path(
    get,
    path = "/api/wx/v1/robots",
    responses((status = 200, body = [RobotResponse])),
    tag = "Robots"
)]
fn list_robots_doc() {}

#[utoipa::path(
    post,
    path = "/api/wx/v1/robots",
    request_body = RobotPayload,
    responses(
        (status = 200, body = RobotResponse),
        (status = 400, description = "Validation failed")
    ),
    tag = "Robots"
)]
fn create_robot_doc() {}

#[utoipa::path(
    get,
    path = "/api/wx/v1/robots/{id}",
    params(("id" = i64, Path, description = "Robot id")),
    responses(
        (status = 200, body = RobotResponse),
        (status = 404, description = "Robot not found")
    ),
    tag = "Robots"
)]
fn get_robot_doc() {}

#[utoipa::path(
    put,
    path = "/api/wx/v1/robots/{id}",
    params(("id" = i64, Path, description = "Robot id")),
    request_body = RobotPayload,
    responses(
        (status = 200, body = RobotResponse),
        (status = 404, description = "Robot not found")
    ),
    tag = "Robots"
)]
fn update_robot_doc() {}

#[utoipa::path(
    get,
    path = "/api/wx/v1/robots/{id}/health",
    params(("id" = i64, Path, description = "Robot id")),
    responses(
        (status = 200, body = RobotHealth),
        (status = 503, description = "Robot endpoint unhealthy", body = RobotHealth)
    ),
    tag = "Robots"
)]
fn robot_health_doc() {}

#[utoipa::path(
    get,
    path = "/api/wx/v1/users/robot/{robot_id}",
    params(("robot_id" = i64, Path, description = "Robot id")),
    responses((status = 200, body = [SessionResponse])),
    tag = "Users"
)]
fn sessions_by_robot_doc() {}

#[utoipa::path(
    post,
    path = "/api/wx/v1/users/authorize",
    request_body = AuthorizeRequest,
    responses(
        (status = 200, body = AuthorizeResponse),
        (status = 404, description = "Robot not found"),
        (status = 500, description = "Robot refused to issue a key")
    ),
    tag = "Users"
)]
fn authorize_doc() {}

#[utoipa::path(
    post,
    path = "/api/wx/v1/users/qrcode",
    request_body = QrCodeRequest,
    responses((status = 200, body = QrCodeResponse)),
    tag = "Users"
)]
fn qr_code_doc() {}

#[utoipa::path(
    get,
    path = "/api/wx/v1/users/status/{robot_id}/{token}",
    params(
        ("robot_id" = i64, Path, description = "Robot id"),
        ("token" = String, Path, description = "Authorization key used for the QR code")
    ),
    responses((status = 200, body = ScanStatus)),
    tag = "Users"
)]
fn scan_status_doc() {}

#[utoipa::path(
    post,
    path = "/api/wx/v1/users/save",
    request_body = SaveSessionPayload,
    responses(
        (status = 200, body = SessionResponse),
        (status = 404, description = "Robot not found")
    ),
    tag = "Users"
)]
fn save_session_doc() {}

#[utoipa::path(
    delete,
    path = "/api/wx/v1/users/{id}",
    params(("id" = i64, Path, description = "Session id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Session not found")
    ),
    tag = "Users"
)]
fn delete_session_doc() {}

#[utoipa::path(
    get,
    path = "/api/wx/v1/users/login-status/{id}",
    params(("id" = i64, Path, description = "Session id")),
    responses((status = 200, body = LoginStatus)),
    tag = "Users"
)]
fn login_status_doc() {}

#[utoipa::path(
    post,
    path = "/api/wx/v1/users/message-bot-status/{id}",
    params(("id" = i64, Path, description = "Session id")),
    request_body = MessageBotFlagPayload,
    responses((status = 200, body = MessageBotFlag)),
    tag = "Users"
)]
fn message_bot_status_doc() {}

#[utoipa::path(
    post,
    path = "/api/wx/v1/auth/extend/{robot_id}",
    params(("robot_id" = i64, Path, description = "Robot id")),
    request_body = ExtendAuthRequest,
    responses(
        (status = 200, body = ExtendAuthResponse),
        (status = 404, description = "No usable session for this robot")
    ),
    tag = "Auth"
)]
fn extend_auth_doc() {}

#[utoipa::path(
    post,
    path = "/api/wx/v1/messages/group/send-text",
    request_body = SendTextRequest,
    responses(
        (status = 200, body = SentText),
        (status = 404, description = "No eligible message bot")
    ),
    tag = "Messages"
)]
fn send_text_doc() {}

#[utoipa::path(
    post,
    path = "/api/wx/v1/messages/group/send-image",
    request_body = SendImageRequest,
    responses(
        (status = 200, body = SentImage),
        (status = 404, description = "No eligible message bot")
    ),
    tag = "Messages"
)]
fn send_image_doc() {}

#[utoipa::path(
    post,
    path = "/api/wx/v1/messages/group/send-text-image",
    request_body = SendTextImageRequest,
    responses((status = 200, body = TextImageReport)),
    tag = "Messages"
)]
fn send_text_image_doc() {}

#[utoipa::path(
    post,
    path = "/api/wx/v1/messages/group/set-strategy",
    request_body = SetStrategyRequest,
    responses((status = 200, body = StrategyResponse)),
    tag = "Messages"
)]
fn set_strategy_doc() {}

#[utoipa::path(
    get,
    path = "/api/wx/v1/groups/user/{wx_id}",
    params(("wx_id" = String, Path, description = "Session wxid")),
    responses((status = 200, body = [Group])),
    tag = "Groups"
)]
fn groups_by_wx_id_doc() {}

#[utoipa::path(
    get,
    path = "/api/wx/v1/groups/search",
    params(GroupSearchQuery),
    responses((status = 200, body = [Group])),
    tag = "Groups"
)]
fn search_groups_doc() {}

#[utoipa::path(
    get,
    path = "/api/wx/v1/bills/stats",
    params(BillStatsQuery),
    responses((status = 200, body = [BillStat])),
    tag = "Bills"
)]
fn bill_stats_doc() {}

#[utoipa::path(
    get,
    path = "/api/wx/v1/bills/list",
    params(BillListQuery),
    responses((status = 200, body = [Bill])),
    tag = "Bills"
)]
fn bill_list_doc() {}
