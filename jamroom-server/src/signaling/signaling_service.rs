use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::room::RoomCommand;
use crate::signaling::SignalingOutput;
use crate::transport::RateLimiter;
use axum::extract::ws::Message;
use dashmap::DashMap;
use jamroom_core::{
    ClientMessage, ConnectionId, ErrorCode, LIVENESS_ACK, LIVENESS_TOKEN, RoomDetail, RoomId,
    RoomSummary, ServerMessage,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

struct SignalingInner {
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    rate_limiter: RateLimiter,
    config: ServerConfig,
}

impl SignalingInner {
    fn send_frame(&self, connection: ConnectionId, frame: Message) {
        let Some(peer) = self.peers.get(&connection) else {
            debug!("Dropping frame for disconnected transport {}", connection);
            return;
        };
        if peer.send(frame).is_err() {
            debug!("Dropping frame for closed transport {}", connection);
        }
    }
}

/// Live transports plus the path from them into the coordinator.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) room_cmd_tx: mpsc::Sender<RoomCommand>,
}

impl SignalingService {
    pub fn new(room_cmd_tx: mpsc::Sender<RoomCommand>, config: ServerConfig) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
                rate_limiter: RateLimiter::new(&config.rate_limit),
                config,
            }),
            room_cmd_tx,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn add_peer(&self, connection: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(connection, tx);
    }

    pub fn remove_peer(&self, connection: &ConnectionId) {
        self.inner.peers.remove(connection);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.peers.len()
    }

    /// Outbound half handed to the registry. It does not hold the command
    /// sender, so the coordinator stops once every service clone is gone.
    pub fn output(&self) -> Arc<dyn SignalingOutput> {
        self.inner.clone()
    }

    fn send_frame(&self, connection: ConnectionId, frame: Message) {
        self.inner.send_frame(connection, frame);
    }

    /// Rate limit, liveness token, decode, forward. Returns false if the coordinator is gone.
    pub async fn handle_text(&self, connection: ConnectionId, source: &str, text: &str) -> bool {
        if !self.inner.rate_limiter.check(source) {
            debug!("Rate limited {} ({})", source, connection);
            self.send(
                connection,
                ServerMessage::Error {
                    error: ErrorCode::RateLimited,
                },
            );
            return true;
        }

        if text == LIVENESS_TOKEN {
            self.send_frame(connection, Message::Text(LIVENESS_ACK.into()));
            return true;
        }

        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Discarding malformed message from {}: {}", connection, e);
                return true;
            }
        };

        let cmd = RoomCommand::Inbound {
            connection,
            source: source.to_owned(),
            message,
        };
        if let Err(e) = self.room_cmd_tx.send(cmd).await {
            error!("Coordinator died: {}", e);
            return false;
        }
        true
    }

    pub async fn disconnect(&self, connection: ConnectionId) {
        self.remove_peer(&connection);
        let _ = self
            .room_cmd_tx
            .send(RoomCommand::Disconnect { connection })
            .await;
    }

    pub async fn list_rooms(&self) -> Result<Vec<RoomSummary>, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.room_cmd_tx
            .send(RoomCommand::ListRooms { reply })
            .await
            .map_err(|_| ServerError::CoordinatorGone)?;
        rx.await.map_err(|_| ServerError::CoordinatorGone)
    }

    pub async fn get_room(&self, room_id: RoomId) -> Result<Option<RoomDetail>, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.room_cmd_tx
            .send(RoomCommand::GetRoom { room_id, reply })
            .await
            .map_err(|_| ServerError::CoordinatorGone)?;
        rx.await.map_err(|_| ServerError::CoordinatorGone)
    }

    /// Periodically forgets idle rate-limit counters.
    pub fn spawn_rate_limit_sweeper(&self) -> JoinHandle<()> {
        let inner = self.inner.clone();
        let period = inner.config.rate_limit.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = inner.rate_limiter.sweep();
                if removed > 0 {
                    debug!("Swept {} idle rate-limit entries", removed);
                }
            }
        })
    }
}

impl SignalingOutput for SignalingInner {
    fn send(&self, connection: ConnectionId, msg: ServerMessage) {
        match serde_json::to_string(&msg) {
            Ok(json) => self.send_frame(connection, Message::Text(json.into())),
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }

    fn close(&self, connection: ConnectionId) {
        // Removing the sender lets the writer drain what is queued, then stop.
        if let Some((_, tx)) = self.peers.remove(&connection) {
            let _ = tx.send(Message::Close(None));
        }
    }
}

impl SignalingOutput for SignalingService {
    fn send(&self, connection: ConnectionId, msg: ServerMessage) {
        self.inner.send(connection, msg);
    }

    fn close(&self, connection: ConnectionId) {
        self.inner.close(connection);
    }
}
