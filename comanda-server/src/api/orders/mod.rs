//! Order API 模块
//!
//! 下单、前台活跃列表、厨房队列、出餐、账单与结账：
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/orders | POST | 下单 |
//! | /api/orders/active/{restaurant_id} | GET | 活跃订单，最新在前 |
//! | /api/orders/{order_id}/complete | POST | 出餐 (Pending → Ready) |
//! | /api/kitchen/orders | GET | 厨房队列，最早在前 |
//! | /api/bill/{table_id} | GET | 桌账 (含 5% 税) |
//! | /api/settle/{table_id} | POST | 整桌结账并释放餐桌 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/orders", order_routes())
        .route("/api/kitchen/orders", get(handler::kitchen_queue))
        .route("/api/bill/{table_id}", get(handler::bill))
        .route("/api/settle/{table_id}", post(handler::settle))
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/active/{restaurant_id}", get(handler::active))
        .route("/{order_id}/complete", post(handler::complete))
}
