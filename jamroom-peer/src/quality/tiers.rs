pub const LOW_BITRATE: u32 = 32_000;
pub const MEDIUM_BITRATE: u32 = 48_000;
pub const HIGH_BITRATE: u32 = 64_000;

/// Target encoding rate for the given round trip (ms) and loss (percent).
pub fn target_bitrate(latency_ms: f64, loss_percent: f64) -> u32 {
    if loss_percent > 5.0 || latency_ms > 300.0 {
        LOW_BITRATE
    } else if loss_percent > 2.0 || latency_ms > 150.0 {
        MEDIUM_BITRATE
    } else {
        HIGH_BITRATE
    }
}

/// Coarse 1..=5 rating of a round trip, 5 being best.
pub fn quality_tier(latency_ms: f64) -> u8 {
    match latency_ms {
        l if l < 50.0 => 5,
        l if l < 100.0 => 4,
        l if l < 150.0 => 3,
        l if l < 200.0 => 2,
        _ => 1,
    }
}
