use jamroom_core::{ConnectionId, ServerMessage};
use jamroom_server::SignalingOutput;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Message(ConnectionId, ServerMessage),
    Close(ConnectionId),
}

/// SignalingOutput that captures every outgoing frame and close.
#[derive(Clone)]
pub struct MockSignalingOutput {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl MockSignalingOutput {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SignalingOutput for MockSignalingOutput {
    fn send(&self, connection: ConnectionId, msg: ServerMessage) {
        tracing::debug!("[MockSignaling] {} <- {:?}", connection, msg);
        let _ = self.tx.send(Outbound::Message(connection, msg));
    }

    fn close(&self, connection: ConnectionId) {
        tracing::debug!("[MockSignaling] close {}", connection);
        let _ = self.tx.send(Outbound::Close(connection));
    }
}
