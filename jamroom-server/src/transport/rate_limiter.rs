use crate::config::RateLimitConfig;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window message counter keyed by source address.
pub struct RateLimiter {
    window: Duration,
    max_messages: u32,
    stale_after: Duration,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window: config.window,
            max_messages: config.max_messages,
            stale_after: config.stale_after,
            windows: DashMap::new(),
        }
    }

    /// Counts one message from `source`; false once the window's budget is spent.
    pub fn check(&self, source: &str) -> bool {
        self.check_at(source, Instant::now())
    }

    pub fn check_at(&self, source: &str, now: Instant) -> bool {
        let mut entry = self.windows.entry(source.to_owned()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        entry.count = entry.count.saturating_add(1);
        entry.count <= self.max_messages
    }

    /// Drops counters whose window started more than `stale_after` ago.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) <= self.stale_after);
        before - self.windows.len()
    }

    pub fn tracked_sources(&self) -> usize {
        self.windows.len()
    }
}
