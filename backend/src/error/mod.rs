use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::models::ApiResponse;
use crate::services::messaging::DispatchError;
use crate::services::robot_api::ApiError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Validation(Vec<String>),
    /// A robot call failed; the message carries the upstream reason.
    Upstream(String),
    /// Used by probes that report their own diagnostic payload.
    ServiceUnavailable(String, Option<Value>),
    InternalServerError(anyhow::Error),
}

impl AppError {
    /// Wraps a robot API failure with the operation that was attempted.
    pub fn upstream(context: &str, err: ApiError) -> Self {
        AppError::Upstream(format!("{}: {}", context, err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, data) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Robot API call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, None)
            }
            AppError::ServiceUnavailable(msg, data) => (StatusCode::SERVICE_UNAVAILABLE, msg, data),
            AppError::InternalServerError(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        (status, Json(ApiResponse::<Value>::failure(message, data))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::InternalServerError(err.into()),
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NoEligibleBot { group_id } => {
                AppError::NotFound(format!("No message bot available for group {}", group_id))
            }
            DispatchError::Store(e) => AppError::InternalServerError(e.into()),
            DispatchError::Api(e) => AppError::upstream("Message send failed", e),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages)
    }
}
