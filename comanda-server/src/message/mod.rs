//! Notification bus 通知总线
//!
//! 下单事务提交后把厨房票推给订阅的显示终端。帧格式和载荷
//! 类型在 `shared` crate 定义，这里是服务端的路由和传输实现。
//!
//! ```text
//! ┌──────────────┐   KitchenTicket    ┌──────────────┐
//! │ OrderEngine  │ ─────────────────▶ │  MessageBus  │
//! └──────────────┘  (broadcast 流)    └──────┬───────┘
//!                                            │ publish("kitchen")
//!                              ┌─────────────┼─────────────┐
//!                              ▼             ▼             ▼
//!                          显示终端 A    显示终端 B     (memory 测试端)
//! ```

pub mod bus;
pub mod tcp_server;
pub mod transport;

pub use bus::{BusError, ConnectedClient, MessageBus, TransportConfig};
pub use transport::{MemoryTransport, TcpTransport, Transport};

pub use shared::message::{
    BusMessage, ErrorPayload, EventType, GROUP_KITCHEN, HandshakeAckPayload, HandshakePayload,
    KitchenTicket, PROTOCOL_VERSION,
};
