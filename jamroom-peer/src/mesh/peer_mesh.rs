use crate::config::PeerConfig;
use crate::error::NegotiationError;
use crate::mesh::pair_session::{MeshContext, PairHandle, spawn_pair};
use crate::negotiation::{PairCommand, PairRole};
use crate::quality::TelemetryReport;
use crate::transport::{AlwaysVisible, PeerConnectionFactory, SignalSink, Visibility};
use jamroom_core::{PeerId, ServerMessage};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One local peer's set of direct connections, driven by coordinator messages.
///
/// The peer that joins later initiates toward everyone already present;
/// existing peers create their side when the offer arrives.
pub struct PeerMesh {
    local: PeerId,
    factory: Arc<dyn PeerConnectionFactory>,
    ctx: MeshContext,
    pairs: HashMap<PeerId, PairHandle>,
}

impl PeerMesh {
    pub fn new(
        local: PeerId,
        factory: Arc<dyn PeerConnectionFactory>,
        signals: Arc<dyn SignalSink>,
        config: PeerConfig,
    ) -> Self {
        Self {
            local,
            factory,
            ctx: MeshContext {
                signals,
                visibility: Arc::new(AlwaysVisible),
                config,
                established_pairs: Arc::new(AtomicUsize::new(0)),
                reports: None,
            },
            pairs: HashMap::new(),
        }
    }

    pub fn with_visibility(mut self, visibility: Arc<dyn Visibility>) -> Self {
        self.ctx.visibility = visibility;
        self
    }

    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<(PeerId, TelemetryReport)>) -> Self {
        self.ctx.reports = Some(reports);
        self
    }

    pub fn local(&self) -> &PeerId {
        &self.local
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn has_pair(&self, remote: &PeerId) -> bool {
        self.pairs.contains_key(remote)
    }

    pub fn established_pairs(&self) -> usize {
        self.ctx.established_pairs.load(Ordering::Relaxed)
    }

    pub async fn handle(&mut self, msg: ServerMessage) -> Result<(), NegotiationError> {
        match msg {
            ServerMessage::Joined { peers, .. } => {
                for entry in peers {
                    if entry.peer_id == self.local {
                        continue;
                    }
                    if let Err(e) = self.open_pair(entry.peer_id, PairRole::Initiator).await {
                        warn!("{}", e);
                    }
                }
                Ok(())
            }

            // The newcomer initiates; its offer opens our side.
            ServerMessage::PeerJoined { peer_id, .. } => {
                debug!("Waiting for an offer from {}", peer_id);
                Ok(())
            }

            ServerMessage::PeerLeft { peer_id, .. } => {
                self.close_pair(&peer_id).await;
                Ok(())
            }

            ServerMessage::Offer { from, sdp } => {
                if !self.pairs.contains_key(&from) {
                    self.open_pair(from.clone(), PairRole::Responder).await?;
                }
                self.forward(&from, PairCommand::RemoteOffer(sdp))
            }

            ServerMessage::Answer { from, sdp } => self.forward(&from, PairCommand::RemoteAnswer(sdp)),

            ServerMessage::IceCandidate { from, candidate } => {
                self.forward(&from, PairCommand::RemoteCandidate(candidate))
            }

            ServerMessage::IceCandidatesBatch { from, candidates } => {
                for candidate in candidates {
                    self.forward(&from, PairCommand::RemoteCandidate(Some(candidate)))?;
                }
                Ok(())
            }

            ServerMessage::Kicked | ServerMessage::Rejected => {
                self.close_all().await;
                Ok(())
            }

            other => {
                debug!("Mesh ignores {:?}", other);
                Ok(())
            }
        }
    }

    async fn open_pair(&mut self, remote: PeerId, role: PairRole) -> Result<(), NegotiationError> {
        if self.pairs.contains_key(&remote) {
            return Ok(());
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let transport = self
            .factory
            .create(&remote, events_tx)
            .await
            .map_err(|e| NegotiationError::connection(&remote, "open a connection", e))?;

        info!("Opening pair {} -> {} as {:?}", self.local, remote, role);
        let handle = spawn_pair(remote.clone(), role, transport, events_rx, &self.ctx);
        self.pairs.insert(remote, handle);
        Ok(())
    }

    fn forward(&self, remote: &PeerId, cmd: PairCommand) -> Result<(), NegotiationError> {
        let pair = self
            .pairs
            .get(remote)
            .ok_or_else(|| NegotiationError::UnknownPeer(remote.clone()))?;
        pair.send(cmd);
        Ok(())
    }

    pub async fn close_pair(&mut self, remote: &PeerId) {
        if let Some(pair) = self.pairs.remove(remote) {
            pair.close().await;
        }
    }

    /// Tears down every pair, e.g. after leaving or being kicked.
    pub async fn close_all(&mut self) {
        for (_, pair) in self.pairs.drain() {
            pair.close().await;
        }
    }
}
