//! Restaurant Model

use serde::{Deserialize, Serialize};

/// Restaurant entity (租户根)
///
/// 分类、餐桌、食材、服务员、订单、预订都挂在餐厅之下。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    /// 创建序号，扫描时按它恢复插入顺序
    #[serde(default)]
    pub seq: u64,
    pub name: String,
    #[serde(default)]
    pub address: String,
}
