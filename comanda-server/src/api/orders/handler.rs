//! Order API Handlers
//!
//! 下单和结账直接驱动订单引擎；handler 只做文本和数量上限校验，
//! 目录一致性、库存扣减和状态机都在引擎的事务里。

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::core::ServerState;
use crate::db::models::Order;
use crate::orders::{KitchenLine, PlaceOrder, TableBill};
use crate::utils::AppResult;
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_quantity, validate_text_len};

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub message: &'static str,
    pub order_id: u64,
}

/// POST /api/orders - 下单
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<PlaceOrder>,
) -> AppResult<(StatusCode, Json<CreateOrderResponse>)> {
    validate_text_len(&payload.customer_name, "customer_name", MAX_SHORT_TEXT_LEN)?;
    validate_text_len(&payload.customer_phone, "customer_phone", MAX_SHORT_TEXT_LEN)?;
    for line in &payload.items {
        validate_quantity(line.qty)?;
    }

    let order_id = state.engine.place_order(payload)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            message: "success",
            order_id,
        }),
    ))
}

/// GET /api/orders/active/{restaurant_id} - 前台活跃订单，最新在前
pub async fn active(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.engine.active_orders(&restaurant_id)?;
    Ok(Json(orders))
}

/// 厨房队列里的一张订单，时间转成人读格式
#[derive(Debug, Serialize)]
pub struct KitchenOrderView {
    pub id: u64,
    pub table_name: String,
    pub waiter_name: String,
    pub created_at: String,
    pub items: Vec<KitchenLine>,
}

fn format_created_at(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// GET /api/kitchen/orders - 全店待出餐队列，最早在前
pub async fn kitchen_queue(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<KitchenOrderView>>> {
    let queue = state.engine.kitchen_orders()?;

    let views = queue
        .into_iter()
        .map(|o| KitchenOrderView {
            id: o.id,
            table_name: o.table_name,
            waiter_name: o.waiter_name,
            created_at: format_created_at(o.created_at),
            items: o.items,
        })
        .collect();
    Ok(Json(views))
}

#[derive(Debug, Serialize)]
pub struct CompleteOrderResponse {
    pub status: &'static str,
    pub prep_time: Option<f64>,
}

/// POST /api/orders/{order_id}/complete - 厨房出餐
pub async fn complete(
    State(state): State<ServerState>,
    Path(order_id): Path<u64>,
) -> AppResult<Json<CompleteOrderResponse>> {
    let prep_time = state.engine.mark_ready(order_id)?;
    Ok(Json(CompleteOrderResponse {
        status: "success",
        prep_time,
    }))
}

/// GET /api/bill/{table_id} - 桌账
pub async fn bill(
    State(state): State<ServerState>,
    Path(table_id): Path<String>,
) -> AppResult<Json<TableBill>> {
    let bill = state.engine.table_bill(&table_id)?;
    Ok(Json(bill))
}

#[derive(Debug, Serialize)]
pub struct SettleResponse {
    pub status: &'static str,
}

/// POST /api/settle/{table_id} - 整桌结账
pub async fn settle(
    State(state): State<ServerState>,
    Path(table_id): Path<String>,
) -> AppResult<Json<SettleResponse>> {
    state.engine.settle_table(&table_id)?;
    Ok(Json(SettleResponse {
        status: "Table Settled",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_at_renders_rfc3339() {
        let rendered = format_created_at(1_700_000_000_000);
        assert!(rendered.starts_with("2023-11-14T"));
        assert!(rendered.ends_with('Z'));
    }

    #[test]
    fn test_created_at_out_of_range() {
        assert_eq!(format_created_at(i64::MAX), "");
    }
}
