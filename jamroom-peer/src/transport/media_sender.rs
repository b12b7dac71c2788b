use anyhow::Result;
use async_trait::async_trait;

/// Cumulative counters read from one connection's statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetrySample {
    /// Round trip of the selected candidate pair; zero when unknown.
    pub round_trip_ms: f64,
    pub jitter_ms: f64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_lost: u64,
    pub packets_received: u64,
}

#[async_trait]
pub trait MediaSender: Send + Sync {
    /// Currently configured encoding cap in bits per second.
    fn max_bitrate(&self) -> Option<u32>;

    async fn set_max_bitrate(&self, bps: u32) -> Result<()>;

    async fn stats(&self) -> Result<TelemetrySample>;
}
