//! Category Model

use serde::{Deserialize, Serialize};

/// Menu category entity (菜单分类)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub seq: u64,
    pub restaurant_id: String,
    pub name: String,
}
