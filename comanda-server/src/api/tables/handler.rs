//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::AppResult;

/// 餐桌视图：占用状态由下单/结账驱动
#[derive(Debug, Serialize)]
pub struct TableView {
    pub id: String,
    pub name: String,
    pub is_occupied: bool,
}

/// GET /api/tables/{restaurant_id} - 本店餐桌列表
///
/// 未知餐厅返回空列表，前台轮询不需要区分这两种情况
pub async fn list(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
) -> AppResult<Json<Vec<TableView>>> {
    let tables = state.store.tables_for_restaurant(&restaurant_id)?;

    let views = tables
        .into_iter()
        .map(|t| TableView {
            id: t.id,
            name: t.name,
            is_occupied: t.is_occupied,
        })
        .collect();
    Ok(Json(views))
}
