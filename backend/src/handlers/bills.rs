use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        bill::{Bill, BillListQuery, BillStat, BillStatsQuery},
        ApiResponse, Page,
    },
    state::AppState,
};

/// Per-group totals for one owner. Page numbers below 1 and oversized pages
/// are clamped rather than rejected.
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<BillStatsQuery>,
) -> Result<Json<ApiResponse<Page<BillStat>>>, AppError> {
    query.validate()?;
    let (rows, total) = state.repos.bills.stats(&query).await?;
    Ok(Json(ApiResponse::success(
        "OK",
        Page::new(rows, query.page(), total),
    )))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<BillListQuery>,
) -> Result<Json<ApiResponse<Page<Bill>>>, AppError> {
    query.validate()?;
    let (rows, total) = state.repos.bills.list(&query).await?;
    Ok(Json(ApiResponse::success(
        "OK",
        Page::new(rows, query.page(), total),
    )))
}
