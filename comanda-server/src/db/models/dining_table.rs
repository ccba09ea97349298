//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Dining table entity (餐桌)
///
/// `is_occupied` 只由下单（置 true）和结账（置 false）驱动，
/// 预订不改占用状态。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    #[serde(default)]
    pub seq: u64,
    pub restaurant_id: String,
    pub name: String,
    #[serde(default)]
    pub is_occupied: bool,
}
