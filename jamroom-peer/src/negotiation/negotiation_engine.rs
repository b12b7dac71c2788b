use crate::config::PeerConfig;
use crate::error::NegotiationError;
use crate::negotiation::negotiation_phase::{NegotiationPhase, PairRole};
use crate::negotiation::pair_command::PairCommand;
use crate::negotiation::pending_candidates::PendingCandidates;
use crate::task::TaskGuard;
use crate::transport::{IceConnectionState, PeerConnection, SdpKind, SignalSink};
use jamroom_core::{ClientMessage, IceCandidate, PeerId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Offer/answer state machine for one remote peer.
///
/// Driven by a single pair task, so every transition completes before the
/// next input is looked at. Restarts happen in place on the same connection,
/// from whichever side notices the failure first. When both sides offer at
/// once the responder yields: it drops its own restart offer and answers the
/// initiator's, while the initiator discards the responder's.
///
/// Answers carry nothing that ties them to a particular offer, so at most one
/// local offer is outstanding. A failure seen while one is unanswered is held
/// back and restarted as soon as that answer lands.
pub struct NegotiationEngine {
    remote: PeerId,
    role: PairRole,
    phase: NegotiationPhase,
    connection: Arc<dyn PeerConnection>,
    signals: Arc<dyn SignalSink>,
    pending: PendingCandidates,
    remote_description_set: bool,
    restart_grace: Duration,
    grace: Option<TaskGuard>,
    restart_pending: bool,
    commands: mpsc::UnboundedSender<PairCommand>,
}

impl NegotiationEngine {
    pub fn new(
        remote: PeerId,
        role: PairRole,
        connection: Arc<dyn PeerConnection>,
        signals: Arc<dyn SignalSink>,
        config: &PeerConfig,
        commands: mpsc::UnboundedSender<PairCommand>,
    ) -> Self {
        Self {
            remote,
            role,
            phase: NegotiationPhase::Idle,
            connection,
            signals,
            pending: PendingCandidates::new(config.pending_candidate_limit),
            remote_description_set: false,
            restart_grace: config.restart_grace,
            grace: None,
            restart_pending: false,
            commands,
        }
    }

    pub fn remote(&self) -> &PeerId {
        &self.remote
    }

    pub fn role(&self) -> PairRole {
        self.role
    }

    pub fn phase(&self) -> NegotiationPhase {
        self.phase
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending.len()
    }

    /// True while a disconnect grace timer is running.
    pub fn restart_armed(&self) -> bool {
        self.grace.is_some()
    }

    /// True while a restart waits for the answer to an outstanding offer.
    pub fn restart_pending(&self) -> bool {
        self.restart_pending
    }

    /// Sends the first offer. Only the initiator of an idle pair does anything.
    pub async fn start(&mut self) -> Result<(), NegotiationError> {
        if self.role != PairRole::Initiator || self.phase != NegotiationPhase::Idle {
            return Ok(());
        }

        self.phase = NegotiationPhase::Offering;
        let sdp = match self.connection.create_offer(false).await {
            Ok(sdp) => sdp,
            Err(e) => {
                self.phase = NegotiationPhase::Idle;
                return Err(NegotiationError::connection(&self.remote, "create an offer", e));
            }
        };

        self.signals.send(ClientMessage::Offer {
            to: self.remote.clone(),
            sdp,
        });
        self.phase = NegotiationPhase::AwaitingAnswer;
        debug!("[{}] Offer sent", self.remote);
        Ok(())
    }

    /// Applies everything except `Close`, which the owning task handles.
    pub async fn handle(&mut self, cmd: PairCommand) -> Result<(), NegotiationError> {
        match cmd {
            PairCommand::RemoteOffer(sdp) => self.on_remote_offer(sdp).await.map(|_| ()),
            PairCommand::RemoteAnswer(sdp) => self.on_remote_answer(sdp).await.map(|_| ()),
            PairCommand::RemoteCandidate(candidate) => {
                self.on_remote_candidate(candidate).await;
                Ok(())
            }
            PairCommand::GraceElapsed => self.on_grace_elapsed().await,
            PairCommand::Close => {
                self.close().await;
                Ok(())
            }
        }
    }

    /// Returns false when the offer was discarded.
    pub async fn on_remote_offer(&mut self, sdp: String) -> Result<bool, NegotiationError> {
        let yields = self.role == PairRole::Responder
            && self.phase
                == (NegotiationPhase::Recovering {
                    awaiting_answer: true,
                });
        if !self.phase.accepts_offer() && !yields {
            warn!("[{}] Discarding offer received in {:?}", self.remote, self.phase);
            return Ok(false);
        }
        if yields {
            info!("[{}] Both sides restarted; answering the initiator's offer", self.remote);
        }

        let previous = self.phase;
        self.phase = NegotiationPhase::OfferReceived;
        if let Err(e) = self
            .connection
            .set_remote_description(SdpKind::Offer, sdp)
            .await
        {
            self.phase = previous;
            return Err(NegotiationError::connection(&self.remote, "apply the remote offer", e));
        }
        self.remote_description_set = true;
        self.apply_pending().await;

        self.phase = NegotiationPhase::Answering;
        let answer = match self.connection.create_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                self.phase = previous;
                return Err(NegotiationError::connection(&self.remote, "create an answer", e));
            }
        };

        self.signals.send(ClientMessage::Answer {
            to: self.remote.clone(),
            sdp: answer,
        });
        self.phase = NegotiationPhase::Established;
        self.restart_pending = false;
        info!("[{}] Answered offer; pair established", self.remote);
        Ok(true)
    }

    /// Returns false for a late or duplicate answer.
    pub async fn on_remote_answer(&mut self, sdp: String) -> Result<bool, NegotiationError> {
        if !self.phase.accepts_answer() {
            debug!("[{}] Discarding answer received in {:?}", self.remote, self.phase);
            return Ok(false);
        }

        self.connection
            .set_remote_description(SdpKind::Answer, sdp)
            .await
            .map_err(|e| NegotiationError::connection(&self.remote, "apply the remote answer", e))?;
        self.remote_description_set = true;
        self.apply_pending().await;

        self.phase = NegotiationPhase::Established;
        info!("[{}] Answer applied; pair established", self.remote);

        if std::mem::take(&mut self.restart_pending) {
            self.restart().await?;
        }
        Ok(true)
    }

    pub async fn on_remote_candidate(&mut self, candidate: Option<IceCandidate>) {
        if self.phase.is_closed() {
            return;
        }

        match candidate {
            None => {
                let dropped = self.pending.discard();
                if dropped > 0 {
                    debug!(
                        "[{}] Remote finished gathering; dropping {} unapplied candidates",
                        self.remote, dropped
                    );
                }
            }
            Some(candidate) if self.remote_description_set => self.add_candidate(candidate).await,
            Some(candidate) => {
                if let Some(evicted) = self.pending.push(candidate) {
                    debug!("[{}] Pending queue full; dropped {}", self.remote, evicted.candidate);
                }
            }
        }
    }

    pub async fn on_ice_state(&mut self, state: IceConnectionState) -> Result<(), NegotiationError> {
        if self.phase.is_closed() {
            return Ok(());
        }

        match state {
            IceConnectionState::Failed => {
                warn!("[{}] Connectivity failed; restarting", self.remote);
                self.grace = None;
                self.restart().await
            }
            IceConnectionState::Disconnected => {
                self.arm_grace();
                Ok(())
            }
            s if s.is_connected() => {
                self.grace = None;
                self.restart_pending = false;
                if self.phase
                    == (NegotiationPhase::Recovering {
                        awaiting_answer: false,
                    })
                {
                    info!("[{}] Connectivity recovered", self.remote);
                    self.phase = NegotiationPhase::Established;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub async fn on_grace_elapsed(&mut self) -> Result<(), NegotiationError> {
        self.grace = None;
        if self.phase.is_closed() {
            return Ok(());
        }
        if self.connection.ice_connection_state() != IceConnectionState::Disconnected {
            debug!("[{}] Came back within the grace period", self.remote);
            return Ok(());
        }

        warn!("[{}] Still disconnected after {:?}; restarting", self.remote, self.restart_grace);
        self.restart().await
    }

    /// Ends the pair for good. Timers are cancelled before anything else.
    pub async fn close(&mut self) {
        if self.phase.is_closed() {
            return;
        }
        self.grace = None;
        self.restart_pending = false;
        self.phase = NegotiationPhase::Closed;
        self.pending.discard();

        if let Err(e) = self.connection.close().await {
            debug!("[{}] Error closing connection: {}", self.remote, e);
        }
        info!("[{}] Pair closed", self.remote);
    }

    async fn restart(&mut self) -> Result<(), NegotiationError> {
        match self.phase {
            NegotiationPhase::AwaitingAnswer
            | NegotiationPhase::Recovering {
                awaiting_answer: true,
            } => {
                debug!("[{}] Offer outstanding; restarting once it is answered", self.remote);
                self.restart_pending = true;
                return Ok(());
            }
            NegotiationPhase::Established
            | NegotiationPhase::Recovering {
                awaiting_answer: false,
            } => {}
            phase => {
                debug!("[{}] Nothing to restart in {:?}", self.remote, phase);
                return Ok(());
            }
        }

        self.phase = NegotiationPhase::Recovering {
            awaiting_answer: true,
        };
        let sdp = match self.connection.create_offer(true).await {
            Ok(sdp) => sdp,
            Err(e) => {
                self.phase = NegotiationPhase::Recovering {
                    awaiting_answer: false,
                };
                return Err(NegotiationError::connection(&self.remote, "create a restart offer", e));
            }
        };

        self.signals.send(ClientMessage::Offer {
            to: self.remote.clone(),
            sdp,
        });
        info!("[{}] Restart offer sent", self.remote);
        Ok(())
    }

    fn arm_grace(&mut self) {
        if self.grace.is_some() {
            return;
        }

        let commands = self.commands.clone();
        let grace = self.restart_grace;
        self.grace = Some(TaskGuard::new(tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let _ = commands.send(PairCommand::GraceElapsed);
        })));
        debug!("[{}] Disconnected; re-checking in {:?}", self.remote, grace);
    }

    async fn apply_pending(&mut self) {
        for candidate in self.pending.drain() {
            self.add_candidate(candidate).await;
        }
    }

    async fn add_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self.connection.add_ice_candidate(candidate).await {
            debug!("[{}] Remote candidate rejected: {}", self.remote, e);
        }
    }
}
