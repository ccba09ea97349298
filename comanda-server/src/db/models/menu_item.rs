//! Menu Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Menu item entity (菜品)
///
/// 价格为两位小数定点数。`is_available` 是展示给终端的目录数据，
/// 下单流程不依据它拦截（与库存校验不同）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    #[serde(default)]
    pub seq: u64,
    pub restaurant_id: String,
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// 基础价格（不含规格加价）
    pub price: Decimal,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}
