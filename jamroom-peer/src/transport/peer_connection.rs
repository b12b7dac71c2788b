use crate::transport::media_sender::MediaSender;
use anyhow::Result;
use async_trait::async_trait;
use jamroom_core::{IceCandidate, PeerId};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl IceConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected | Self::Completed)
    }
}

/// What a peer connection reports back on its event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    LocalCandidate(IceCandidate),
    /// Local discovery finished; no more `LocalCandidate`s follow until a restart.
    GatheringComplete,
    IceStateChanged(IceConnectionState),
}

/// One direct connection to a remote peer.
///
/// Offer and answer creation also install the result as the local description.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self, ice_restart: bool) -> Result<String>;

    async fn create_answer(&self) -> Result<String>;

    async fn set_remote_description(&self, kind: SdpKind, sdp: String) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    fn ice_connection_state(&self) -> IceConnectionState;

    async fn close(&self) -> Result<()>;
}

/// Connection plus the outbound media sender that rides on it.
#[derive(Clone)]
pub struct PairTransport {
    pub connection: Arc<dyn PeerConnection>,
    pub sender: Arc<dyn MediaSender>,
}

#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    /// Builds a connection toward `remote` whose events go to `events`.
    async fn create(&self, remote: &PeerId, events: mpsc::UnboundedSender<PeerEvent>) -> Result<PairTransport>;
}
