//! Variant Group / Option Models
//!
//! 规格组挂在菜品上（如 "Tamaño": Mediana/Familiar），
//! 选项挂在规格组上，可带正负加价和自己的配方消耗。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Variant group entity (规格组)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantGroup {
    pub id: String,
    #[serde(default)]
    pub seq: u64,
    pub menu_item_id: String,
    pub name: String,
    /// 必须至少选择一项
    #[serde(default)]
    pub is_required: bool,
    /// 允许同组多选
    #[serde(default)]
    pub allow_multiple: bool,
}

/// Variant option entity (规格选项)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantOption {
    pub id: String,
    #[serde(default)]
    pub seq: u64,
    pub group_id: String,
    pub name: String,
    /// 加价，可为负（减价）
    #[serde(default)]
    pub price_adjustment: Decimal,
}
