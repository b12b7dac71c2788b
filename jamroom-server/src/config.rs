use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Length of one counting window.
    pub window: Duration,
    /// Messages admitted per source address within one window.
    pub max_messages: u32,
    /// How often stale counters are swept.
    pub sweep_interval: Duration,
    /// Counters whose window started longer ago than this are dropped by the sweep.
    pub stale_after: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(1000),
            max_messages: 50,
            sweep_interval: Duration::from_secs(60),
            stale_after: Duration::from_millis(10_000),
        }
    }
}

/// Runtime configuration of the coordinator process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub rate_limit: RateLimitConfig,
    /// Every transport is pinged this often; one missed pong terminates it.
    pub heartbeat_interval: Duration,
    pub max_payload_bytes: usize,
    pub command_queue_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            rate_limit: RateLimitConfig::default(),
            heartbeat_interval: Duration::from_secs(30),
            max_payload_bytes: 64 * 1024,
            command_queue_depth: 1024,
        }
    }
}
