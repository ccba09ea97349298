//! Comanda 共享协议库
//!
//! 定义服务端与显示终端（厨房屏、收银屏）之间的线上协议：
//! 事件类型、帧编解码和业务载荷。服务端和客户端共用同一份
//! 定义，避免两端各自维护一套格式。

pub mod message;

// Re-export 公共类型
pub use message::payload::{
    ErrorPayload, GROUP_KITCHEN, HandshakeAckPayload, HandshakePayload, KitchenTicket,
};
pub use message::{
    BusMessage, EventType, FRAME_HEADER_SIZE, FrameHeader, MAX_PAYLOAD_SIZE, PROTOCOL_VERSION,
    ProtocolError,
};
