//! 统一错误处理
//!
//! 提供应用级错误类型和 HTTP 响应映射：
//! - [`AppError`] - 应用错误枚举
//! - [`ErrorBody`] - 错误响应结构
//!
//! # 错误分类
//!
//! | 变体 | HTTP 状态 | 说明 |
//! |------|-----------|------|
//! | NotFound | 404 | 餐厅/餐桌/菜品/食材/订单不存在 |
//! | Validation | 400 | 必选规格缺失、单选多选、参数非法 |
//! | InsufficientStock | 400 | 食材库存不足 |
//! | Conflict | 400 | 指定餐桌的预订时段重叠 |
//! | NoAvailability | 400 | 自动分配找不到空闲餐桌 |
//! | Database / Internal | 500 | 系统错误，仅记录日志不外泄细节 |
//!
//! # 使用示例
//!
//! ```ignore
//! Err(AppError::not_found("Restaurant not found"))
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// 错误响应结构
///
/// ```json
/// {
///   "error": "insufficient_stock",
///   "message": "Out of Stock: Tomate. Need 1.500, have 0.800"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// 错误分类标识
    pub error: String,
    /// 面向用户的错误消息
    pub message: String,
}

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 业务逻辑错误 (4xx) ==========
    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    #[error("Validation failed: {0}")]
    /// 验证失败 (400)
    Validation(String),

    #[error("{0}")]
    /// 库存不足 (400)
    InsufficientStock(String),

    #[error("Reservation conflict: {0}")]
    /// 预订时段冲突 (400)
    Conflict(String),

    #[error("No availability: {0}")]
    /// 无空闲餐桌 (400)
    NoAvailability(String),

    // ========== 系统错误 (5xx) ==========
    #[error("Database error: {0}")]
    /// 数据库错误 (500)
    Database(String),

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.as_str()),

            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg.as_str()),

            AppError::InsufficientStock(msg) => {
                (StatusCode::BAD_REQUEST, "insufficient_stock", msg.as_str())
            }

            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, "conflict", msg.as_str()),

            AppError::NoAvailability(msg) => {
                (StatusCode::BAD_REQUEST, "no_availability", msg.as_str())
            }

            // 5xx 记录完整上下文，对外只给通用消息
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "database", "Database error")
            }

            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error",
                )
            }
        };

        let body = Json(ErrorBody {
            error: kind.to_string(),
            message: message.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<crate::db::StorageError> for AppError {
    fn from(err: crate::db::StorageError) -> Self {
        AppError::Database(err.to_string())
    }
}

// ========== Helper Constructors ==========

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn no_availability(msg: impl Into<String>) -> Self {
        Self::NoAvailability(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
