//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use super::view::{self, CategoryView};
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// GET /api/menu/{restaurant_id} - 整棵菜单树
pub async fn restaurant_menu(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
) -> AppResult<Json<Vec<CategoryView>>> {
    state
        .store
        .get_restaurant(&restaurant_id)?
        .ok_or_else(|| AppError::not_found("Restaurant not found"))?;

    let menu = view::restaurant_menu(&state.store, &restaurant_id)?;
    Ok(Json(menu))
}
