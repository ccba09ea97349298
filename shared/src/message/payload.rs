//! 消息载荷定义

use serde::{Deserialize, Serialize};

/// 厨房显示终端订阅的广播组名
pub const GROUP_KITCHEN: &str = "kitchen";

// ==================== Handshake ====================

/// 握手载荷（客户端 -> 服务端）
///
/// 客户端建立连接后的第一帧，声明自己的名字和要加入的广播组。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakePayload {
    /// 协议版本，双方不一致时服务端拒绝连接
    pub version: u16,
    /// 终端名称，仅用于日志排查
    pub client_name: String,
    /// 要加入的广播组
    pub groups: Vec<String>,
}

/// 握手确认载荷（服务端 -> 客户端）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakeAckPayload {
    pub version: u16,
    /// 服务端分配的客户端 ID
    pub client_id: String,
    /// 实际加入的广播组
    pub groups: Vec<String>,
}

// ==================== Kitchen ====================

/// 厨房出票载荷
///
/// 下单事务提交后推送给 `kitchen` 组的订单摘要，
/// 字段即显示终端的展示内容，金额以两位小数字符串传输。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenTicket {
    /// 订单号
    pub id: u64,
    /// 餐桌名
    pub table: String,
    /// 本单条目，形如 "2 x Paella"
    pub items: Vec<String>,
    /// 订单总额
    pub total: String,
}

// ==================== Error ====================

/// 错误载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}
