//! Menu API 模块

mod handler;
pub mod view;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/menu", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/{restaurant_id}", get(handler::restaurant_menu))
}
