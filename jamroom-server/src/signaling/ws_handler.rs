use crate::SignalingService;
use crate::transport::{Heartbeat, HeartbeatAction};
use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use jamroom_core::ConnectionId;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    let source = source_address(&headers, addr);
    let max_payload = service.config().max_payload_bytes;

    ws.max_message_size(max_payload)
        .on_upgrade(move |socket| handle_socket(socket, ConnectionId::new(), source, service))
}

/// First `x-forwarded-for` hop when present, otherwise the socket peer.
pub fn source_address(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| addr.ip().to_string())
}

async fn handle_socket(socket: WebSocket, connection: ConnectionId, source: String, service: SignalingService) {
    info!("New WebSocket connection {} from {}", connection, source);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_peer(connection, tx.clone());

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sender.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let period = service.config().heartbeat_interval;

        async move {
            let mut heartbeat = Heartbeat::new();
            let mut ticker = interval_at(Instant::now() + period, period);

            loop {
                tokio::select! {
                    frame = receiver.next() => {
                        let Some(Ok(msg)) = frame else { break };
                        match msg {
                            Message::Text(text) => {
                                if !service.handle_text(connection, &source, text.as_str()).await {
                                    break;
                                }
                            }
                            Message::Pong(_) => heartbeat.acknowledge(),
                            Message::Close(_) => break,
                            _ => {}
                        }
                    }

                    _ = ticker.tick() => match heartbeat.on_tick() {
                        HeartbeatAction::SendPing => {
                            let _ = tx.send(Message::Ping(Bytes::new()));
                        }
                        HeartbeatAction::Terminate => {
                            warn!("Transport {} missed a heartbeat; terminating", connection);
                            break;
                        }
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.disconnect(connection).await;
    info!("WebSocket disconnected: {}", connection);
}
