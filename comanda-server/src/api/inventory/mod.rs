//! Inventory API 模块
//!
//! 后台库存管理：
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/inventory/data/{restaurant_id} | GET | 食材列表 + 菜单树 |
//! | /api/inventory/save | POST | 配方边 upsert，数量归零即删除 |
//! | /api/inventory/ingredient/add | POST | 登记新食材 |
//! | /api/inventory/update-cost | POST | 改成本 / 补库存 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/data/{restaurant_id}", get(handler::data))
        .route("/save", post(handler::save_recipe))
        .route("/ingredient/add", post(handler::add_ingredient))
        .route("/update-cost", post(handler::update_ingredient))
}
