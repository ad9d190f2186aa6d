use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    models::ApiResponse,
    services::{
        message_strategy::StrategyKind,
        robot_api::{SentImage, SentText, TextImageReport},
    },
    state::AppState,
    validation::rules::{strip_data_url_prefix, validate_image_base64},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendTextRequest {
    #[validate(length(min = 1))]
    pub text_content: String,
    /// Target group, e.g. `123456@chatroom`.
    #[validate(length(min = 1, max = 100))]
    pub to_user_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendImageRequest {
    /// Base64 image, optionally prefixed with `data:image/...;base64,`.
    #[validate(custom(function = "validate_image_base64"))]
    pub image_content: String,
    #[validate(length(min = 1, max = 100))]
    pub to_user_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendTextImageRequest {
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub image_content: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub to_user_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStrategyRequest {
    /// `round_robin` or `random`.
    pub strategy: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StrategyResponse {
    pub strategy: StrategyKind,
}

pub async fn send_text(
    State(state): State<AppState>,
    Json(req): Json<SendTextRequest>,
) -> Result<Json<ApiResponse<SentText>>, AppError> {
    req.validate()?;
    let sent = state
        .dispatcher
        .send_text(&req.to_user_name, &req.text_content)
        .await?;
    Ok(Json(ApiResponse::success("Text message sent", sent)))
}

pub async fn send_image(
    State(state): State<AppState>,
    Json(req): Json<SendImageRequest>,
) -> Result<Json<ApiResponse<SentImage>>, AppError> {
    req.validate()?;
    let sent = state
        .dispatcher
        .send_image(&req.to_user_name, strip_data_url_prefix(&req.image_content))
        .await?;
    Ok(Json(ApiResponse::success("Image message sent", sent)))
}

/// Sends both parts through one sender. A partial failure still answers 200;
/// the report in `data` says which part failed.
pub async fn send_text_and_image(
    State(state): State<AppState>,
    Json(req): Json<SendTextImageRequest>,
) -> Result<Json<ApiResponse<TextImageReport>>, AppError> {
    req.validate()?;
    let text = req.text_content.as_deref().filter(|t| !t.trim().is_empty());
    let image = req
        .image_content
        .as_deref()
        .map(strip_data_url_prefix)
        .filter(|i| !i.is_empty());
    if text.is_none() && image.is_none() {
        return Err(AppError::BadRequest(
            "text_content and image_content must not both be empty".into(),
        ));
    }
    if let Some(image) = image {
        validate_image_base64(image)
            .map_err(|_| AppError::BadRequest("image_content is not valid base64".into()))?;
    }

    let report = state
        .dispatcher
        .send_text_and_image(&req.to_user_name, text, image)
        .await?;
    let message = if report.success {
        "Message sent"
    } else {
        "Message partially sent"
    };
    Ok(Json(ApiResponse::success(message, report)))
}

pub async fn set_strategy(
    State(state): State<AppState>,
    Json(req): Json<SetStrategyRequest>,
) -> Result<Json<ApiResponse<StrategyResponse>>, AppError> {
    let strategy =
        StrategyKind::from_str(&req.strategy).map_err(|e| AppError::BadRequest(e.to_string()))?;
    state.dispatcher.set_strategy(strategy);
    Ok(Json(ApiResponse::success(
        "Strategy updated",
        StrategyResponse { strategy },
    )))
}
