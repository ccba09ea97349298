//! 消息总线消息类型定义
//!
//! 这些类型在 comanda-server 和显示终端之间共享，用于
//! 进程内（内存）和网络（TCP）通信。
//!
//! 帧格式（小端）：
//!
//! ```text
//! +------+------------------+----------------+------------------+
//! | type | request_id (16B) | payload_len 4B | payload (JSON)   |
//! +------+------------------+----------------+------------------+
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// 协议版本号
pub const PROTOCOL_VERSION: u16 = 1;

/// 帧头长度: type(1) + request_id(16) + payload_len(4)
pub const FRAME_HEADER_SIZE: usize = 21;

/// 单帧载荷上限 (1 MiB)，超限视为协议错误并断开连接
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// 协议错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown event type byte: {0}")]
    UnknownEventType(u8),

    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 消息总线事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// 握手（客户端 -> 服务端）
    Handshake = 1,
    /// 握手确认（服务端 -> 客户端）
    HandshakeAck = 2,
    /// 新订单进入厨房队列
    KitchenOrderCreated = 10,
    /// 心跳探测
    Ping = 20,
    /// 心跳应答
    Pong = 21,
    /// 协议或业务错误
    Error = 255,
}

impl TryFrom<u8> for EventType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, ProtocolError> {
        match value {
            1 => Ok(EventType::Handshake),
            2 => Ok(EventType::HandshakeAck),
            10 => Ok(EventType::KitchenOrderCreated),
            20 => Ok(EventType::Ping),
            21 => Ok(EventType::Pong),
            255 => Ok(EventType::Error),
            other => Err(ProtocolError::UnknownEventType(other)),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Handshake => write!(f, "handshake"),
            EventType::HandshakeAck => write!(f, "handshake_ack"),
            EventType::KitchenOrderCreated => write!(f, "kitchen_order_created"),
            EventType::Ping => write!(f, "ping"),
            EventType::Pong => write!(f, "pong"),
            EventType::Error => write!(f, "error"),
        }
    }
}

/// 已解析的帧头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub event_type: EventType,
    pub request_id: Uuid,
    pub payload_len: usize,
}

impl FrameHeader {
    /// 从定长帧头字节解析，载荷超限或类型未知时返回错误
    pub fn parse(bytes: &[u8; FRAME_HEADER_SIZE]) -> Result<Self, ProtocolError> {
        let event_type = EventType::try_from(bytes[0])?;

        let mut id = [0u8; 16];
        id.copy_from_slice(&bytes[1..17]);
        let request_id = Uuid::from_bytes(id);

        let mut len = [0u8; 4];
        len.copy_from_slice(&bytes[17..21]);
        let payload_len = u32::from_le_bytes(len) as usize;

        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge(payload_len));
        }

        Ok(Self {
            event_type,
            request_id,
            payload_len,
        })
    }
}

/// 消息总线消息体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type,
            payload,
        }
    }

    /// 创建握手消息
    pub fn handshake(payload: &HandshakePayload) -> Self {
        Self::new(
            EventType::Handshake,
            serde_json::to_vec(payload).expect("Failed to serialize handshake payload"),
        )
    }

    /// 创建握手确认消息
    pub fn handshake_ack(payload: &HandshakeAckPayload) -> Self {
        Self::new(
            EventType::HandshakeAck,
            serde_json::to_vec(payload).expect("Failed to serialize handshake ack"),
        )
    }

    /// 创建厨房新订单消息
    pub fn kitchen_ticket(payload: &KitchenTicket) -> Self {
        Self::new(
            EventType::KitchenOrderCreated,
            serde_json::to_vec(payload).expect("Failed to serialize kitchen ticket"),
        )
    }

    /// 创建错误消息
    pub fn error(payload: &ErrorPayload) -> Self {
        Self::new(
            EventType::Error,
            serde_json::to_vec(payload).expect("Failed to serialize error payload"),
        )
    }

    /// 创建心跳消息
    pub fn ping() -> Self {
        Self::new(EventType::Ping, Vec::new())
    }

    /// 创建心跳应答消息
    pub fn pong() -> Self {
        Self::new(EventType::Pong, Vec::new())
    }

    /// 解析载荷为指定类型
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// 编码为完整帧（帧头 + 载荷）
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge(self.payload.len()));
        }

        let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + self.payload.len());
        frame.push(self.event_type as u8);
        frame.extend_from_slice(self.request_id.as_bytes());
        frame.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&self.payload);
        Ok(frame)
    }

    /// 由帧头和载荷还原消息，载荷长度必须与帧头一致
    pub fn from_parts(header: FrameHeader, payload: Vec<u8>) -> Self {
        debug_assert_eq!(header.payload_len, payload.len());
        Self {
            request_id: header.request_id,
            event_type: header.event_type,
            payload,
        }
    }
}
