//! Waiter Model

use serde::{Deserialize, Serialize};

/// Waiter entity (服务员)
///
/// 登录凭证是餐厅 + 四位数字 PIN，只有 `is_active` 的记录可登录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waiter {
    pub id: String,
    #[serde(default)]
    pub seq: u64,
    pub restaurant_id: String,
    pub name: String,
    pub pin_code: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}
