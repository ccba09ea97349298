//! Transport 传输层抽象
//!
//! 提供可插拔的传输层架构：
//! ```text
//!         ┌────────────────────┐
//!         │   Transport Trait  │  ◄── 可插拔接口
//!         └────────┬───────────┘
//!                  │
//!         ┌────────┴────────┐
//!         ▼                 ▼
//!    TcpTransport     MemoryTransport
//!    (TCP 协议)       (同进程双工，测试用)
//! ```

mod memory;
mod tcp;

pub use memory::MemoryTransport;
pub use tcp::TcpTransport;

use async_trait::async_trait;
use shared::message::{BusMessage, FRAME_HEADER_SIZE, FrameHeader};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::BusError;

/// Transport 传输层特征
///
/// 所有传输实现必须实现此特征，支持消息的读写和连接管理。
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// 从传输层读取一条消息
    async fn read_message(&self) -> Result<BusMessage, BusError>;

    /// 向传输层写入一条消息
    async fn write_message(&self, msg: &BusMessage) -> Result<(), BusError>;

    /// 关闭传输连接
    async fn close(&self) -> Result<(), BusError>;

    /// 获取对端地址
    fn peer_addr(&self) -> Option<String> {
        None
    }
}

// ========== 辅助函数 ==========

/// 从异步流中读取一帧
///
/// 对端正常断开（EOF）映射为 [`BusError::Disconnected`]，
/// 帧头声明超限载荷按协议错误处理并断开。
pub(crate) async fn read_from_stream<R: AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<BusMessage, BusError> {
    let mut header_buf = [0u8; FRAME_HEADER_SIZE];
    match reader.read_exact(&mut header_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(BusError::Disconnected);
        }
        Err(e) => return Err(BusError::Io(e)),
    }

    let header = FrameHeader::parse(&header_buf)?;

    let mut payload = vec![0u8; header.payload_len];
    match reader.read_exact(&mut payload).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(BusError::Disconnected);
        }
        Err(e) => return Err(BusError::Io(e)),
    }

    Ok(BusMessage::from_parts(header, payload))
}

/// 向异步流写入一帧
pub(crate) async fn write_to_stream<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    msg: &BusMessage,
) -> Result<(), BusError> {
    let frame = msg.encode()?;
    writer.write_all(&frame).await?;
    Ok(())
}
