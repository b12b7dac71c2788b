use crate::quality::tiers::quality_tier;
use crate::transport::TelemetrySample;
use std::collections::VecDeque;
use tokio::time::Instant;

/// Bitrate samples kept for trend reporting.
pub const BITRATE_HISTORY: usize = 60;

const EMA_WEIGHT: f64 = 0.1;
const STABLE_LATENCY_MS: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryReport {
    pub latency_ms: f64,
    pub avg_latency_ms: f64,
    pub jitter_ms: f64,
    pub avg_jitter_ms: f64,
    pub peak_latency_ms: f64,
    /// `None` until a non-zero round trip has been seen.
    pub min_latency_ms: Option<f64>,
    pub send_kbps: f64,
    pub recv_kbps: f64,
    /// Packets lost since the previous sample, as a percentage.
    pub loss_percent: f64,
    pub quality_tier: u8,
    pub stable_run: u32,
}

#[derive(Debug, Clone, Copy)]
struct Previous {
    at: Instant,
    sample: TelemetrySample,
}

/// Smoothed view of one pair's telemetry.
#[derive(Debug, Default)]
pub struct QualityMonitor {
    avg_latency: Option<f64>,
    avg_jitter: Option<f64>,
    peak_latency: f64,
    min_latency: Option<f64>,
    bitrate_history: VecDeque<f64>,
    stable_run: u32,
    previous: Option<Previous>,
}

fn ema(current: Option<f64>, sample: f64) -> Option<f64> {
    if sample <= 0.0 {
        return current;
    }
    Some(match current {
        Some(avg) => avg * (1.0 - EMA_WEIGHT) + sample * EMA_WEIGHT,
        None => sample,
    })
}

impl QualityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sample: TelemetrySample, now: Instant) -> TelemetryReport {
        let latency = sample.round_trip_ms.max(0.0);

        let (send_kbps, recv_kbps, lost, received) = match self.previous {
            Some(prev) => {
                let secs = now.saturating_duration_since(prev.at).as_secs_f64();
                let rate = |cur: u64, old: u64| {
                    if secs > 0.0 {
                        cur.saturating_sub(old) as f64 * 8.0 / 1000.0 / secs
                    } else {
                        0.0
                    }
                };
                (
                    rate(sample.bytes_sent, prev.sample.bytes_sent),
                    rate(sample.bytes_received, prev.sample.bytes_received),
                    sample.packets_lost.saturating_sub(prev.sample.packets_lost),
                    sample
                        .packets_received
                        .saturating_sub(prev.sample.packets_received),
                )
            }
            None => (0.0, 0.0, sample.packets_lost, sample.packets_received),
        };
        self.previous = Some(Previous { at: now, sample });

        let loss_percent = if lost + received > 0 {
            lost as f64 * 100.0 / (lost + received) as f64
        } else {
            0.0
        };

        if latency < STABLE_LATENCY_MS && lost == 0 {
            self.stable_run += 1;
        } else {
            self.stable_run = 0;
        }

        self.avg_latency = ema(self.avg_latency, latency);
        self.avg_jitter = ema(self.avg_jitter, sample.jitter_ms);
        self.peak_latency = self.peak_latency.max(latency);
        if latency > 0.0 {
            self.min_latency = Some(self.min_latency.map_or(latency, |m| m.min(latency)));
        }

        self.bitrate_history.push_back(send_kbps + recv_kbps);
        while self.bitrate_history.len() > BITRATE_HISTORY {
            self.bitrate_history.pop_front();
        }

        TelemetryReport {
            latency_ms: latency,
            avg_latency_ms: self.avg_latency.unwrap_or_default(),
            jitter_ms: sample.jitter_ms,
            avg_jitter_ms: self.avg_jitter.unwrap_or_default(),
            peak_latency_ms: self.peak_latency,
            min_latency_ms: self.min_latency,
            send_kbps,
            recv_kbps,
            loss_percent,
            quality_tier: quality_tier(latency),
            stable_run: self.stable_run,
        }
    }

    /// Consecutive samples with a low round trip and no new loss.
    pub fn stable_run(&self) -> u32 {
        self.stable_run
    }

    /// Combined send+receive kbps, oldest first.
    pub fn bitrate_history(&self) -> impl Iterator<Item = f64> + '_ {
        self.bitrate_history.iter().copied()
    }
}
