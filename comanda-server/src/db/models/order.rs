//! Order Model
//!
//! 订单行内嵌在订单里（下单时一次写入，之后不再改行），
//! 行价格和选项都是下单时刻的快照，目录改价不影响历史订单。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 订单状态机: PENDING -> READY -> COMPLETED
///
/// PAID 是历史遗留的已结清状态，本引擎结账只写 COMPLETED，
/// 读路径（账单、统计）把 PAID 和 COMPLETED 同等视为已结清。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Ready,
    Paid,
    Completed,
}

impl OrderStatus {
    /// 仍在本桌账上（未结清）的状态
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Ready)
    }

    /// 已结清状态
    pub fn is_settled(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Completed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Ready => write!(f, "READY"),
            OrderStatus::Paid => write!(f, "PAID"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// 下单时选中的规格选项快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedOption {
    pub option_id: String,
    pub name: String,
    pub price_adjustment: Decimal,
}

/// Order line item (订单行)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub menu_item_id: String,
    /// 菜名快照，目录改名不影响已出订单
    pub menu_item_name: String,
    pub quantity: u32,
    /// 行单价快照 = 基础价 + 所有选中选项加价
    pub price_at_time_of_order: Decimal,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

/// Order entity (订单)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// 订单号，来自持久化序号，跨重启单调递增
    pub id: u64,
    pub restaurant_id: String,
    pub table_id: String,
    #[serde(default)]
    pub waiter_id: Option<String>,
    #[serde(default = "default_customer_name")]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    pub status: OrderStatus,
    /// 下单时刻定格的总额 = Σ(行单价 × 数量)
    pub total_amount: Decimal,
    /// Unix 毫秒时间戳，各自只写一次且单调递增
    pub created_at: i64,
    #[serde(default)]
    pub ready_at: Option<i64>,
    #[serde(default)]
    pub completed_at: Option<i64>,
    pub items: Vec<OrderItem>,
}

fn default_customer_name() -> String {
    "Guest".to_string()
}

impl Order {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
