//! Analytics API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::analytics::AnalyticsReport;
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/analytics/data/{restaurant_id} - 经营日报
///
/// 未知餐厅返回全零报表而不是 404，看板轮询端不用特判
pub async fn data(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
) -> AppResult<Json<AnalyticsReport>> {
    let report = state.analytics.restaurant_report(&restaurant_id)?;
    Ok(Json(report))
}
