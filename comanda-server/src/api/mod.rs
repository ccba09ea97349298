//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`menu`] - 菜单目录接口
//! - [`tables`] - 餐桌接口
//! - [`waiters`] - 服务员 PIN 登录接口
//! - [`orders`] - 下单、厨房队列、账单与结账接口
//! - [`reservations`] - 预订接口
//! - [`inventory`] - 库存与配方管理接口
//! - [`analytics`] - 统计报表接口

pub mod health;

// Catalog APIs
pub mod menu;
pub mod tables;
pub mod waiters;

// Workflow APIs
pub mod orders;
pub mod reservations;

// Back office APIs
pub mod analytics;
pub mod inventory;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
