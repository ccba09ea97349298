//! TCP 服务器实现
//!
//! 负责处理厨房显示终端的连接，包括：
//! - 监听连接
//! - 协议握手验证（版本号、入组申请）
//! - 按组转发服务端广播
//! - 心跳应答

use std::sync::Arc;

use shared::message::{
    BusMessage, ErrorPayload, EventType, HandshakeAckPayload, HandshakePayload, PROTOCOL_VERSION,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::bus::{BusError, ConnectedClient, MessageBus};
use super::transport::{TcpTransport, Transport};

/// 发送握手错误后等待客户端收包的时间
const HANDSHAKE_ERROR_DELAY_MS: u64 = 100;

impl MessageBus {
    /// Start TCP server (for kitchen display clients)
    ///
    /// This is a TCP server that:
    /// 1. Accepts connections
    /// 2. Performs the protocol handshake and joins the client to its groups
    /// 3. Forwards group broadcasts to connected clients
    /// 4. Gracefully shuts down on cancellation signal
    pub async fn start_tcp_server(&self) -> Result<(), BusError> {
        let listener = TcpListener::bind(&self.config.tcp_listen_addr).await?;
        tracing::info!(
            "Message bus TCP server listening on {}",
            self.config.tcp_listen_addr
        );
        self.serve_listener(listener).await
    }

    /// 在已绑定的监听器上运行接入循环（测试用临时端口时直接传入）
    pub async fn serve_listener(&self, listener: TcpListener) -> Result<(), BusError> {
        loop {
            tokio::select! {
                _ = self.shutdown_token().cancelled() => {
                    tracing::info!("Message bus TCP server shutting down");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            tracing::debug!("Client connected: {}", addr);
                            let bus = self.clone();
                            let transport: Arc<dyn Transport> =
                                Arc::new(TcpTransport::from_stream(stream));
                            tokio::spawn(async move {
                                if let Err(e) = bus.serve_connection(transport).await {
                                    tracing::debug!("Client {} session ended: {}", addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// 处理单个订阅端的完整生命周期：握手、入组、转发、清理
    pub async fn serve_connection(&self, transport: Arc<dyn Transport>) -> Result<(), BusError> {
        let client = self.perform_handshake(&transport).await?;
        let client_id = client.id.clone();

        self.clients.insert(client_id.clone(), client.clone());

        // 先订阅再回确认帧，客户端收到 ack 后不会错过事件
        let disconnect_token = CancellationToken::new();
        for group in &client.groups {
            self.spawn_group_forwarder(
                transport.clone(),
                group,
                &client_id,
                disconnect_token.clone(),
            );
        }

        let ack = HandshakeAckPayload {
            version: PROTOCOL_VERSION,
            client_id: client_id.clone(),
            groups: client.groups.clone(),
        };
        transport.write_message(&BusMessage::handshake_ack(&ack)).await?;

        tracing::info!(
            client_id = %client_id,
            client_name = %client.name,
            groups = ?client.groups,
            "Bus client joined"
        );

        self.read_client_messages(&transport, &client_id, &disconnect_token)
            .await;

        // Cleanup
        let _ = transport.close().await;
        self.clients.remove(&client_id);
        tracing::debug!(client_id = %client_id, "Client removed from registry");

        Ok(())
    }

    /// 读取并校验握手帧
    async fn perform_handshake(
        &self,
        transport: &Arc<dyn Transport>,
    ) -> Result<ConnectedClient, BusError> {
        let msg = transport.read_message().await?;

        if msg.event_type != EventType::Handshake {
            send_handshake_error(transport, "Expected Handshake message").await;
            return Err(BusError::Handshake(format!(
                "expected Handshake frame, got {}",
                msg.event_type
            )));
        }

        let payload: HandshakePayload = match msg.parse_payload() {
            Ok(payload) => payload,
            Err(e) => {
                send_handshake_error(transport, "Invalid handshake payload").await;
                return Err(BusError::Handshake(format!("invalid payload: {e}")));
            }
        };

        if payload.version != PROTOCOL_VERSION {
            send_handshake_error(
                transport,
                &format!(
                    "Protocol version mismatch: server={}, client={}",
                    PROTOCOL_VERSION, payload.version
                ),
            )
            .await;
            return Err(BusError::Handshake(format!(
                "protocol version mismatch: server={}, client={}",
                PROTOCOL_VERSION, payload.version
            )));
        }

        Ok(ConnectedClient {
            id: Uuid::new_v4().to_string(),
            name: payload.client_name,
            groups: payload.groups,
            addr: transport.peer_addr(),
        })
    }

    /// 为 (订阅端, 组) 启动一个转发任务
    ///
    /// 订阅端掉线或总线关闭时任务结束；慢客户端跟不上广播时
    /// 跳过错过的事件继续，不补发。
    fn spawn_group_forwarder(
        &self,
        transport: Arc<dyn Transport>,
        group: &str,
        client_id: &str,
        disconnect_token: CancellationToken,
    ) {
        let mut rx = self.subscribe(group);
        let shutdown_token = self.shutdown_token().clone();
        let group = group.to_string();
        let client_id = client_id.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_token.cancelled() => break,
                    _ = disconnect_token.cancelled() => break,

                    msg_result = rx.recv() => {
                        match msg_result {
                            Ok(msg) => {
                                if let Err(e) = transport.write_message(&msg).await {
                                    tracing::debug!(client_id = %client_id, "Client write failed: {}", e);
                                    break;
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                tracing::warn!(
                                    client_id = %client_id,
                                    group = %group,
                                    dropped_messages = n,
                                    "Subscriber lagged, skipping missed events"
                                );
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }

            tracing::debug!(client_id = %client_id, group = %group, "Group forwarder stopped");
        });
    }

    /// 读客户端来帧直到断开
    ///
    /// 订阅端只收事件不发事件，心跳之外的帧一律丢弃。
    async fn read_client_messages(
        &self,
        transport: &Arc<dyn Transport>,
        client_id: &str,
        disconnect_token: &CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = self.shutdown_token().cancelled() => {
                    break;
                }

                read_result = transport.read_message() => {
                    match read_result {
                        Ok(msg) if msg.event_type == EventType::Ping => {
                            if let Err(e) = transport.write_message(&BusMessage::pong()).await {
                                tracing::debug!(client_id = %client_id, "Pong write failed: {}", e);
                                disconnect_token.cancel();
                                break;
                            }
                        }
                        Ok(msg) => {
                            tracing::warn!(
                                client_id = %client_id,
                                event = %msg.event_type,
                                "Unexpected client frame dropped"
                            );
                        }
                        Err(BusError::Disconnected) => {
                            tracing::debug!(client_id = %client_id, "Client disconnected");
                            disconnect_token.cancel();
                            break;
                        }
                        Err(e) => {
                            tracing::debug!(client_id = %client_id, "Client read error: {}", e);
                            disconnect_token.cancel();
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// 回发握手错误帧，稍等片刻让客户端收到再断开
async fn send_handshake_error(transport: &Arc<dyn Transport>, message: &str) {
    let payload = ErrorPayload::new("handshake_rejected", message);
    if let Err(e) = transport.write_message(&BusMessage::error(&payload)).await {
        tracing::debug!("Failed to send handshake error: {}", e);
    }

    tokio::time::sleep(tokio::time::Duration::from_millis(HANDSHAKE_ERROR_DELAY_MS)).await;
}
