//! 消息总线核心实现
//!
//! # 架构
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     MessageBus                          │
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │  group -> broadcast::Sender<BusMessage>           │  │
//! │  └───────────────────────────────────────────────────┘  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//!               ┌──────────┴──────────┐
//!               │    Transport Trait  │  ◄── 可插拔实现
//!               └──────────┬──────────┘
//!                          │
//!              ┌───────────┴───────────┐
//!              ▼                       ▼
//!         TcpTransport          MemoryTransport
//!         (TCP 明文)            (同进程通信)
//! ```
//!
//! # 消息流
//!
//! ```text
//! OrderEngine ──▶ KitchenTicket ──▶ ticket forwarder ──▶ publish("kitchen")
//!                                                             │
//!                                                             ▼
//!                                                   每个订阅端的转发任务
//! ```
//!
//! 发布是提交后的事后通知，订阅端掉线就错过，不做补发。

use std::sync::Arc;

use dashmap::DashMap;
use shared::message::{BusMessage, GROUP_KITCHEN, KitchenTicket, ProtocolError};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// 总线错误
#[derive(Debug, Error)]
pub enum BusError {
    #[error("client disconnected")]
    Disconnected,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("handshake rejected: {0}")]
    Handshake(String),
}

/// Configuration for transport layer
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tcp_listen_addr: String,
    /// Capacity of each group broadcast channel (default: 1024)
    pub channel_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tcp_listen_addr: "0.0.0.0:8101".to_string(),
            channel_capacity: 1024,
        }
    }
}

/// 已连接的订阅端
#[derive(Debug, Clone)]
pub struct ConnectedClient {
    /// 服务端分配的客户端 ID
    pub id: String,
    /// 握手时自报的终端名称，仅用于日志排查
    pub name: String,
    /// 已加入的广播组
    pub groups: Vec<String>,
    pub addr: Option<String>,
}

/// 消息总线 - 负责按组路由和转发
///
/// # 职责
///
/// - 按组发布 (publish) 与订阅 (subscribe)
/// - 客户端管理 (握手注册、断开清理、get_connected_clients)
/// - 传输层抽象 (TCP/Memory)
#[derive(Debug, Clone)]
pub struct MessageBus {
    /// 广播组注册表 (组名 -> 广播发送端)，懒创建后常驻
    groups: Arc<DashMap<String, broadcast::Sender<BusMessage>>>,
    /// 传输层配置
    pub(crate) config: TransportConfig,
    /// 关闭信号令牌
    shutdown_token: CancellationToken,
    /// 已连接的客户端 (Client ID -> 信息)
    pub(crate) clients: Arc<DashMap<String, ConnectedClient>>,
}

impl MessageBus {
    /// 创建默认配置的消息总线
    pub fn new() -> Self {
        Self::from_config(TransportConfig::default())
    }

    /// 从配置创建消息总线
    pub fn from_config(config: TransportConfig) -> Self {
        Self {
            groups: Arc::new(DashMap::new()),
            config,
            shutdown_token: CancellationToken::new(),
            clients: Arc::new(DashMap::new()),
        }
    }

    /// 创建指定通道容量的消息总线
    pub fn with_capacity(capacity: usize) -> Self {
        let config = TransportConfig {
            channel_capacity: capacity,
            ..Default::default()
        };
        Self::from_config(config)
    }

    /// 取组的广播发送端，不存在则创建
    fn group_sender(&self, group: &str) -> broadcast::Sender<BusMessage> {
        self.groups
            .entry(group.to_string())
            .or_insert_with(|| broadcast::channel(self.config.channel_capacity).0)
            .clone()
    }

    /// 发布消息到指定组，返回收到消息的订阅端数量
    ///
    /// 组里没有订阅端时静默丢弃，发布方不感知
    pub fn publish(&self, group: &str, msg: BusMessage) -> usize {
        match self.group_sender(group).send(msg) {
            Ok(receivers) => receivers,
            Err(_) => 0,
        }
    }

    /// 订阅指定组的广播
    pub fn subscribe(&self, group: &str) -> broadcast::Receiver<BusMessage> {
        self.group_sender(group).subscribe()
    }

    /// 获取关闭令牌 (用于监控关闭信号)
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// 获取已连接客户端列表
    pub fn get_connected_clients(&self) -> Vec<ConnectedClient> {
        self.clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// 优雅关闭消息总线
    ///
    /// 取消所有运行中的任务，包括 TCP 服务器和转发任务
    pub fn shutdown(&self) {
        tracing::info!("Shutting down message bus");
        self.shutdown_token.cancel();
    }

    /// 启动出票转发任务：订单引擎的厨房票流接入 `kitchen` 组
    pub fn spawn_ticket_forwarder(
        &self,
        mut tickets: broadcast::Receiver<KitchenTicket>,
    ) -> tokio::task::JoinHandle<()> {
        let bus = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = bus.shutdown_token.cancelled() => {
                        tracing::debug!("Ticket forwarder shutting down");
                        break;
                    }

                    result = tickets.recv() => {
                        match result {
                            Ok(ticket) => {
                                let order_id = ticket.id;
                                let delivered =
                                    bus.publish(GROUP_KITCHEN, BusMessage::kitchen_ticket(&ticket));
                                tracing::debug!(
                                    order_id,
                                    subscribers = delivered,
                                    "Kitchen ticket forwarded"
                                );
                            }
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                tracing::warn!(
                                    dropped = n,
                                    "Ticket forwarder lagged behind order engine"
                                );
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        })
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
