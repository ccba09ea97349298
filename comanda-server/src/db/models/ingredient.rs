//! Ingredient Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ingredient entity (食材)
///
/// `current_stock` 为三位小数定点数，只允许经由台账操作
/// （check-and-debit / credit / update）变更，保持非负。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    #[serde(default)]
    pub seq: u64,
    pub restaurant_id: String,
    pub name: String,
    pub current_stock: Decimal,
    /// 计量单位: "kg" / "l" / "uds"
    pub unit: String,
    pub cost_per_unit: Decimal,
}
