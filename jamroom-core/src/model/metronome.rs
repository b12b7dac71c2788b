use crate::model::room::DEFAULT_BPM;
use serde::{Deserialize, Serialize};

/// Tempo clock shared by a room.
///
/// The coordinator only rebroadcasts the epoch (`start_time`, `bpm`); every
/// receiver derives its own beat position from it with [`MetronomeState::phase_at`]
/// instead of free-running a local timer. Nothing corrects drift between
/// receivers' wall clocks.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetronomeState {
    pub bpm: u32,
    pub is_playing: bool,
    /// Coordinator wall clock (ms since the Unix epoch) at the last start.
    pub start_time: Option<u64>,
    /// Host wall clock supplied with the start request, passed through untouched.
    pub host_time: Option<u64>,
}

impl Default for MetronomeState {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            is_playing: false,
            start_time: None,
            host_time: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatPhase {
    /// Whole beats elapsed since `start_time`.
    pub beat: u64,
    /// Progress through the current beat, in `[0, 1)`.
    pub fraction: f64,
}

impl BeatPhase {
    pub fn beat_in_bar(&self, beats_per_bar: u64) -> u64 {
        if beats_per_bar == 0 {
            return 0;
        }
        self.beat % beats_per_bar
    }
}

impl MetronomeState {
    pub fn beat_interval_ms(&self) -> Option<f64> {
        (self.bpm > 0).then(|| 60_000.0 / f64::from(self.bpm))
    }

    /// Beat position at `now_ms`, or `None` while stopped.
    pub fn phase_at(&self, now_ms: u64) -> Option<BeatPhase> {
        if !self.is_playing {
            return None;
        }
        let start = self.start_time?;
        let interval = self.beat_interval_ms()?;
        let elapsed = now_ms.saturating_sub(start) as f64;
        let beats = elapsed / interval;

        Some(BeatPhase {
            beat: beats.floor() as u64,
            fraction: beats.fract(),
        })
    }
}
