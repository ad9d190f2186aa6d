use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppError,
    models::{
        group::{Group, GroupSearchQuery},
        ApiResponse,
    },
    state::AppState,
};

pub async fn list_by_wx_id(
    State(state): State<AppState>,
    Path(wx_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Group>>>, AppError> {
    if wx_id.trim().is_empty() {
        return Err(AppError::BadRequest("wxId must not be empty".into()));
    }
    let groups = state.repos.groups.list_by_wx_id(&wx_id).await?;
    Ok(Json(ApiResponse::success("OK", groups)))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<GroupSearchQuery>,
) -> Result<Json<ApiResponse<Vec<Group>>>, AppError> {
    if query.group_nick_name.trim().is_empty() {
        return Err(AppError::BadRequest("groupNickName must not be empty".into()));
    }
    let groups = state
        .repos
        .groups
        .search_by_nick_name(&query.group_nick_name)
        .await?;
    Ok(Json(ApiResponse::success("OK", groups)))
}
