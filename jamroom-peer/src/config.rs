use std::time::Duration;

/// Whether the quality loop may change the sender's encoding rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateMode {
    #[default]
    Auto,
    Manual,
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub base: Duration,
    /// Used once a pair has produced a long run of clean samples.
    pub stable: Duration,
    /// Used while many pairs are established at once.
    pub crowded: Duration,
    /// Clean samples in a row needed before `stable` applies.
    pub stable_run: u32,
    /// Established pairs above which `crowded` applies.
    pub crowded_pairs: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            stable: Duration::from_millis(1500),
            crowded: Duration::from_millis(2000),
            stable_run: 10,
            crowded_pairs: 6,
        }
    }
}

/// Per-peer tuning for negotiation, candidate batching and telemetry.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub candidate_debounce: Duration,
    /// How long a disconnected pair may stay silent before it is restarted.
    pub restart_grace: Duration,
    /// Remote candidates held per pair until the remote description is set.
    pub pending_candidate_limit: usize,
    pub polling: PollingConfig,
    pub rate_mode: RateMode,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            candidate_debounce: Duration::from_millis(50),
            restart_grace: Duration::from_secs(3),
            pending_candidate_limit: 64,
            polling: PollingConfig::default(),
            rate_mode: RateMode::default(),
        }
    }
}
