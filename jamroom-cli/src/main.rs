use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use jamroom_server::{RateLimitConfig, ServerConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Signaling coordinator for jam rooms.
#[derive(Parser, Debug)]
#[command(name = "jamroom", version)]
struct Args {
    #[arg(long, env = "JAMROOM_BIND", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Length of one rate-limit window.
    #[arg(long, env = "JAMROOM_RATE_LIMIT_WINDOW_MS", default_value_t = 1000)]
    rate_limit_window_ms: u64,

    /// Messages allowed per source address within one window.
    #[arg(long, env = "JAMROOM_RATE_LIMIT_MAX", default_value_t = 50)]
    rate_limit_max: u32,

    #[arg(long, env = "JAMROOM_RATE_LIMIT_SWEEP_SECS", default_value_t = 60)]
    rate_limit_sweep_secs: u64,

    /// Idle counters older than this many windows are swept.
    #[arg(long, env = "JAMROOM_RATE_LIMIT_STALE_WINDOWS", default_value_t = 10)]
    rate_limit_stale_windows: u32,

    #[arg(long, env = "JAMROOM_HEARTBEAT_SECS", default_value_t = 30)]
    heartbeat_secs: u64,

    /// Largest accepted WebSocket frame, in bytes.
    #[arg(long, env = "JAMROOM_MAX_PAYLOAD", default_value_t = 64 * 1024)]
    max_payload: usize,

    #[arg(long, env = "JAMROOM_COMMAND_QUEUE", default_value_t = 1024)]
    command_queue: usize,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let window = Duration::from_millis(self.rate_limit_window_ms);

        ServerConfig {
            bind: self.bind,
            rate_limit: RateLimitConfig {
                window,
                max_messages: self.rate_limit_max,
                sweep_interval: Duration::from_secs(self.rate_limit_sweep_secs),
                stale_after: window * self.rate_limit_stale_windows,
            },
            heartbeat_interval: Duration::from_secs(self.heartbeat_secs.max(1)),
            max_payload_bytes: self.max_payload,
            command_queue_depth: self.command_queue.max(1),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Args::parse().into_config();

    println!("{}", "🎸 Starting jamroom signaling server...".green().bold());
    println!("   🔌 WebSocket: ws://{}/ws", config.bind);
    println!("   📋 Rooms:     http://{}/api/rooms", config.bind);
    println!(
        "   ⏱  Rate limit: {} msgs / {:?}",
        config.rate_limit.max_messages, config.rate_limit.window
    );
    info!("Configuration: {:?}", config);

    jamroom_server::serve(config)
        .await
        .context("Signaling server stopped")?;

    println!("{}", "Server stopped.".yellow());
    Ok(())
}
