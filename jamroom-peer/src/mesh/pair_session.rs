use crate::batching::CandidateBatcher;
use crate::config::PeerConfig;
use crate::negotiation::{NegotiationEngine, NegotiationPhase, PairCommand, PairRole};
use crate::quality::{QualityLoop, TelemetryReport};
use crate::task::TaskGuard;
use crate::transport::{PairTransport, PeerEvent, SignalSink, Visibility};
use jamroom_core::PeerId;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Shared by every pair of one local peer.
#[derive(Clone)]
pub struct MeshContext {
    pub signals: Arc<dyn SignalSink>,
    pub visibility: Arc<dyn Visibility>,
    pub config: PeerConfig,
    pub established_pairs: Arc<AtomicUsize>,
    pub reports: Option<mpsc::UnboundedSender<(PeerId, TelemetryReport)>>,
}

/// Owner's end of a running pair task.
pub struct PairHandle {
    remote: PeerId,
    commands: mpsc::UnboundedSender<PairCommand>,
    task: Option<JoinHandle<()>>,
}

impl PairHandle {
    pub fn remote(&self) -> &PeerId {
        &self.remote
    }

    pub fn send(&self, cmd: PairCommand) -> bool {
        self.commands.send(cmd).is_ok()
    }

    /// Stops the pair and waits until its timers are gone and the connection is closed.
    pub async fn close(mut self) {
        let _ = self.commands.send(PairCommand::Close);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PairHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Everything one remote pair owns: engine, batcher and, once established, a quality loop.
struct PairSession {
    engine: NegotiationEngine,
    batcher: CandidateBatcher,
    commands_rx: mpsc::UnboundedReceiver<PairCommand>,
    events_rx: mpsc::UnboundedReceiver<PeerEvent>,
    quality_seed: Option<QualityLoop>,
    quality: Option<TaskGuard>,
    established_pairs: Arc<AtomicUsize>,
    counted: bool,
}

pub fn spawn_pair(
    remote: PeerId,
    role: PairRole,
    transport: PairTransport,
    events_rx: mpsc::UnboundedReceiver<PeerEvent>,
    ctx: &MeshContext,
) -> PairHandle {
    let (commands, commands_rx) = mpsc::unbounded_channel();

    let engine = NegotiationEngine::new(
        remote.clone(),
        role,
        transport.connection.clone(),
        ctx.signals.clone(),
        &ctx.config,
        commands.clone(),
    );
    let batcher = CandidateBatcher::new(
        remote.clone(),
        ctx.signals.clone(),
        ctx.config.candidate_debounce,
    );
    let mut quality = QualityLoop::new(
        remote.clone(),
        transport.sender.clone(),
        ctx.visibility.clone(),
        ctx.established_pairs.clone(),
        &ctx.config,
    );
    if let Some(reports) = &ctx.reports {
        quality = quality.with_reports(reports.clone());
    }

    let session = PairSession {
        engine,
        batcher,
        commands_rx,
        events_rx,
        quality_seed: Some(quality),
        quality: None,
        established_pairs: ctx.established_pairs.clone(),
        counted: false,
    };

    PairHandle {
        remote,
        commands,
        task: Some(tokio::spawn(session.run())),
    }
}

impl PairSession {
    async fn run(mut self) {
        if let Err(e) = self.engine.start().await {
            warn!("{}", e);
        }

        let mut events_open = true;
        loop {
            tokio::select! {
                cmd = self.commands_rx.recv() => match cmd {
                    Some(PairCommand::Close) | None => break,
                    Some(cmd) => {
                        if let Err(e) = self.engine.handle(cmd).await {
                            warn!("{}", e);
                        }
                    }
                },

                event = self.events_rx.recv(), if events_open => match event {
                    Some(event) => self.on_event(event).await,
                    None => events_open = false,
                },
            }

            self.track_established();
        }

        self.shutdown().await;
    }

    async fn on_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::LocalCandidate(candidate) => {
                self.batcher.push(candidate);
            }
            PeerEvent::GatheringComplete => self.batcher.gathering_complete(),
            PeerEvent::IceStateChanged(state) => {
                debug!("[{}] ICE state {:?}", self.engine.remote(), state);
                if let Err(e) = self.engine.on_ice_state(state).await {
                    warn!("{}", e);
                }
            }
        }
    }

    fn track_established(&mut self) {
        if self.counted || self.engine.phase() != NegotiationPhase::Established {
            return;
        }
        self.counted = true;
        self.established_pairs.fetch_add(1, Ordering::Relaxed);

        if let Some(quality) = self.quality_seed.take() {
            self.quality = Some(TaskGuard::new(tokio::spawn(quality.run())));
        }
    }

    async fn shutdown(&mut self) {
        self.quality = None;
        self.batcher.close();
        self.engine.close().await;

        if self.counted {
            self.established_pairs.fetch_sub(1, Ordering::Relaxed);
        }
    }
}
