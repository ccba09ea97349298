//! Waiter API Handlers
//!
//! PIN 登录只认 本店 + 四位数字 + 在职 三个条件，
//! 不签发任何凭证，返回的 waiter_id 由点餐端随单携带。

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::utils::validation::validate_pin;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub pin: String,
    pub restaurant_id: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub waiter_id: String,
    pub waiter_name: String,
}

/// POST /api/waiter/login - 服务员 PIN 登录
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    validate_pin(&payload.pin)?;

    let waiter = state
        .store
        .find_active_waiter_by_pin(&payload.restaurant_id, &payload.pin)?
        .ok_or_else(|| AppError::validation("Invalid PIN"))?;

    tracing::info!(waiter = %waiter.name, "waiter logged in");
    Ok(Json(LoginResponse {
        status: "success",
        waiter_id: waiter.id,
        waiter_name: waiter.name,
    }))
}
