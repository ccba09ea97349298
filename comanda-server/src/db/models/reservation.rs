//! Reservation Model

use serde::{Deserialize, Serialize};

/// Reservation entity (预订)
///
/// 预订是未来时段的意向，存在即有效（未建模取消），
/// 不触碰餐桌的实时占用标志。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    #[serde(default)]
    pub seq: u64,
    pub restaurant_id: String,
    /// 确认后占用的餐桌（指定或自动分配），历史数据可能无桌
    pub table_id: Option<String>,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    /// 预订开始时间，墙钟时间的 Unix 毫秒表示
    pub reservation_time: i64,
    pub guests: u32,
    pub created_at: i64,
}
