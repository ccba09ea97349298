//! Memory 传输层实现 (同进程通信)

use async_trait::async_trait;
use shared::message::BusMessage;
use tokio::sync::Mutex;
use tokio::sync::mpsc;

use super::Transport;
use crate::message::BusError;

/// In-process duplex transport for same-process communication
///
/// 成对创建，一端写入另一端可读，走完整的握手和转发路径，
/// 测试总线时不需要真实 TCP 端口。
#[derive(Debug)]
pub struct MemoryTransport {
    tx: mpsc::UnboundedSender<BusMessage>,
    rx: Mutex<mpsc::UnboundedReceiver<BusMessage>>,
}

impl MemoryTransport {
    /// 创建一对互联的传输端点 (客户端侧, 服务端侧)
    pub fn pair() -> (Self, Self) {
        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: client_tx,
                rx: Mutex::new(client_rx),
            },
            Self {
                tx: server_tx,
                rx: Mutex::new(server_rx),
            },
        )
    }

    pub async fn read_message(&self) -> Result<BusMessage, BusError> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(BusError::Disconnected)
    }

    pub async fn write_message(&self, msg: &BusMessage) -> Result<(), BusError> {
        self.tx.send(msg.clone()).map_err(|_| BusError::Disconnected)
    }

    /// 对端在本端所有引用释放后观察到断开
    pub async fn close(&self) -> Result<(), BusError> {
        Ok(())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_message(&self) -> Result<BusMessage, BusError> {
        self.read_message().await
    }

    async fn write_message(&self, msg: &BusMessage) -> Result<(), BusError> {
        self.write_message(msg).await
    }

    async fn close(&self) -> Result<(), BusError> {
        self.close().await
    }
}
