//! Reservation API Handlers

use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::ServerState;
use crate::reservations::ReserveTable;
use crate::utils::AppResult;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_required_text, validate_text_len,
};

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub status: &'static str,
    /// 分配到的餐桌名
    pub table: String,
    /// 归一化后的预订时间，回显给调用方
    pub time: String,
}

/// POST /api/reservations - 预订餐桌
///
/// 不带 table_id 时按创建顺序自动分配第一张无冲突的桌子
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ReserveTable>,
) -> AppResult<Json<ReservationResponse>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_text_len(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;

    let booked = state.scheduler.reserve(payload)?;
    Ok(Json(ReservationResponse {
        status: "confirmed",
        table: booked.table_name,
        time: booked.time,
    }))
}
