//! 数据库层
//!
//! 嵌入式 redb 存储：目录数据（餐厅/菜单/规格/配方/食材）、
//! 运行数据（订单/预订/餐桌占用）都在同一个库里，
//! 写事务互斥，跨实体的业务操作天然串行化。

pub mod models;
pub mod store;

pub use store::{RestaurantStore, StorageError, StorageResult};
