use crate::config::{PeerConfig, PollingConfig, RateMode};
use crate::quality::quality_monitor::{QualityMonitor, TelemetryReport};
use crate::quality::tiers::target_bitrate;
use crate::transport::{MediaSender, Visibility};
use jamroom_core::PeerId;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Samples one pair's sender and steers its encoding rate.
pub struct QualityLoop {
    remote: PeerId,
    monitor: QualityMonitor,
    sender: Arc<dyn MediaSender>,
    visibility: Arc<dyn Visibility>,
    established_pairs: Arc<AtomicUsize>,
    polling: PollingConfig,
    mode: RateMode,
    reports: Option<mpsc::UnboundedSender<(PeerId, TelemetryReport)>>,
}

impl QualityLoop {
    pub fn new(
        remote: PeerId,
        sender: Arc<dyn MediaSender>,
        visibility: Arc<dyn Visibility>,
        established_pairs: Arc<AtomicUsize>,
        config: &PeerConfig,
    ) -> Self {
        Self {
            remote,
            monitor: QualityMonitor::new(),
            sender,
            visibility,
            established_pairs,
            polling: config.polling.clone(),
            mode: config.rate_mode,
            reports: None,
        }
    }

    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<(PeerId, TelemetryReport)>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Fewer samples when many pairs are up or this one has been clean for a while.
    pub fn next_interval(&self) -> Duration {
        if self.established_pairs.load(Ordering::Relaxed) > self.polling.crowded_pairs {
            self.polling.crowded
        } else if self.monitor.stable_run() > self.polling.stable_run {
            self.polling.stable
        } else {
            self.polling.base
        }
    }

    /// One cycle. Returns `None` when the cycle was skipped.
    pub async fn tick(&mut self) -> Option<TelemetryReport> {
        if !self.visibility.is_visible() {
            return None;
        }

        let sample = match self.sender.stats().await {
            Ok(sample) => sample,
            Err(e) => {
                debug!("[{}] Stats unavailable: {}", self.remote, e);
                return None;
            }
        };
        let report = self.monitor.record(sample, Instant::now());

        if self.mode == RateMode::Auto {
            self.steer_rate(&report).await;
        }
        if let Some(reports) = &self.reports {
            let _ = reports.send((self.remote.clone(), report.clone()));
        }
        Some(report)
    }

    async fn steer_rate(&self, report: &TelemetryReport) {
        let target = target_bitrate(report.latency_ms, report.loss_percent);
        if self.sender.max_bitrate() == Some(target) {
            return;
        }

        match self.sender.set_max_bitrate(target).await {
            Ok(()) => info!("[{}] Encoding rate set to {} kbps", self.remote, target / 1000),
            Err(e) => warn!("[{}] Failed to set encoding rate: {}", self.remote, e),
        }
    }

    /// Samples now, then keeps rescheduling until the task is aborted.
    pub async fn run(mut self) {
        loop {
            self.tick().await;
            let interval = self.next_interval();
            tokio::time::sleep(interval).await;
        }
    }
}
