use anyhow::Result;
use async_trait::async_trait;
use jamroom_core::PeerId;
use jamroom_peer::{PairTransport, PeerConnectionFactory, PeerEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::mock_connection::MockPeerConnection;
use super::mock_sender::MockMediaSender;

#[derive(Clone)]
pub struct CreatedPair {
    pub connection: Arc<MockPeerConnection>,
    pub sender: Arc<MockMediaSender>,
    pub events: mpsc::UnboundedSender<PeerEvent>,
}

/// Hands out mock connections and remembers them per remote.
#[derive(Default)]
pub struct MockFactory {
    created: Mutex<HashMap<PeerId, CreatedPair>>,
}

impl MockFactory {
    pub fn pair(&self, remote: &str) -> Option<CreatedPair> {
        self.created.lock().get(&PeerId::from(remote)).cloned()
    }
}

#[async_trait]
impl PeerConnectionFactory for MockFactory {
    async fn create(&self, remote: &PeerId, events: mpsc::UnboundedSender<PeerEvent>) -> Result<PairTransport> {
        let connection = Arc::new(MockPeerConnection::default());
        let sender = Arc::new(MockMediaSender::default());
        self.created.lock().insert(
            remote.clone(),
            CreatedPair {
                connection: connection.clone(),
                sender: sender.clone(),
                events,
            },
        );
        Ok(PairTransport { connection, sender })
    }
}
