//! Recipe Model
//!
//! 配方是从可售卖单元（菜品或规格选项）指向食材的消耗边。
//! 消耗方用带标签的联合类型表达，"恰好挂在其中一种父级上"
//! 由类型结构保证，而不是靠两个可空外键的约定。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 配方消耗方：菜品本体或某个规格选项
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum RecipeTarget {
    MenuItem(String),
    VariantOption(String),
}

impl RecipeTarget {
    pub fn menu_item(id: impl Into<String>) -> Self {
        Self::MenuItem(id.into())
    }

    pub fn variant_option(id: impl Into<String>) -> Self {
        Self::VariantOption(id.into())
    }

    pub fn id(&self) -> &str {
        match self {
            Self::MenuItem(id) | Self::VariantOption(id) => id,
        }
    }
}

impl fmt::Display for RecipeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MenuItem(id) => write!(f, "menu_item:{id}"),
            Self::VariantOption(id) => write!(f, "variant_option:{id}"),
        }
    }
}

/// Recipe edge entity (配方消耗边)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    #[serde(default)]
    pub seq: u64,
    pub target: RecipeTarget,
    pub ingredient_id: String,
    /// 每售出一份消耗的数量（三位小数，恒为正，
    /// 提交 0 或负数走删除路径，不会落库）
    pub quantity_required: Decimal,
}
