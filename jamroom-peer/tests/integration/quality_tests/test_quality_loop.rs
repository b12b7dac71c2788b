use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use jamroom_core::PeerId;
use jamroom_peer::{
    AlwaysVisible, HIGH_BITRATE, PeerConfig, QualityLoop, RateMode, TelemetrySample,
};

use crate::integration::init_tracing;
use crate::utils::{MockMediaSender, ToggleVisibility};

fn sample(round_trip_ms: f64, n: u64) -> TelemetrySample {
    TelemetrySample {
        round_trip_ms,
        jitter_ms: 2.0,
        bytes_sent: n * 8_000,
        bytes_received: n * 8_000,
        packets_lost: 0,
        packets_received: n * 50,
    }
}

fn quality_loop(sender: Arc<MockMediaSender>, config: &PeerConfig, pairs: usize) -> QualityLoop {
    QualityLoop::new(
        PeerId::from("remote"),
        sender,
        Arc::new(AlwaysVisible),
        Arc::new(AtomicUsize::new(pairs)),
        config,
    )
}

#[tokio::test(start_paused = true)]
async fn test_rate_follows_latency_tiers() {
    init_tracing();
    let sender = Arc::new(MockMediaSender::with_bitrate(HIGH_BITRATE));
    sender.script(
        [40.0, 40.0, 160.0, 160.0, 320.0, 320.0, 100.0, 40.0]
            .into_iter()
            .enumerate()
            .map(|(n, rtt)| sample(rtt, n as u64 + 1)),
    );
    let mut quality = quality_loop(sender.clone(), &PeerConfig::default(), 1);

    for _ in 0..8 {
        quality.tick().await.expect("visible");
        tokio::time::advance(Duration::from_secs(1)).await;
    }

    // Unchanged targets are not re-applied.
    assert_eq!(sender.bitrate_changes(), [48_000, 32_000, 64_000]);
}

#[tokio::test(start_paused = true)]
async fn test_loss_drops_rate() {
    let sender = Arc::new(MockMediaSender::with_bitrate(HIGH_BITRATE));
    let mut lossy = sample(40.0, 2);
    lossy.packets_lost = 10;
    sender.script([sample(40.0, 1), lossy]);
    let mut quality = quality_loop(sender.clone(), &PeerConfig::default(), 1);

    quality.tick().await.expect("first");
    tokio::time::advance(Duration::from_secs(1)).await;
    let report = quality.tick().await.expect("second");

    // 10 lost against 50 received in the interval.
    assert!((report.loss_percent - 100.0 * 10.0 / 60.0).abs() < 1e-9);
    assert_eq!(sender.bitrate_changes(), [32_000]);
}

#[tokio::test(start_paused = true)]
async fn test_manual_mode_never_changes_rate() {
    let sender = Arc::new(MockMediaSender::with_bitrate(HIGH_BITRATE));
    sender.script([sample(400.0, 1), sample(180.0, 2)]);
    let config = PeerConfig {
        rate_mode: RateMode::Manual,
        ..Default::default()
    };
    let mut quality = quality_loop(sender.clone(), &config, 1);

    let report = quality.tick().await.expect("first");
    assert_eq!(report.quality_tier, 1);
    quality.tick().await.expect("second");

    assert!(sender.bitrate_changes().is_empty());
    assert_eq!(sender.stats_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_hidden_cycle_skips_sampling() {
    let sender = Arc::new(MockMediaSender::default());
    let visibility = Arc::new(ToggleVisibility::new(false));
    let mut quality = QualityLoop::new(
        PeerId::from("remote"),
        sender.clone(),
        visibility.clone(),
        Arc::new(AtomicUsize::new(1)),
        &PeerConfig::default(),
    );

    assert!(quality.tick().await.is_none());
    assert_eq!(sender.stats_calls(), 0);

    visibility.set(true);
    assert!(quality.tick().await.is_some());
    assert_eq!(sender.stats_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_interval_stretches_when_stable_or_crowded() {
    let config = PeerConfig::default();

    let crowded = quality_loop(Arc::new(MockMediaSender::default()), &config, 7);
    assert_eq!(crowded.next_interval(), Duration::from_millis(2000));

    let sender = Arc::new(MockMediaSender::default());
    sender.script((1..=11).map(|n| sample(30.0, n)));
    let mut quality = quality_loop(sender, &config, 2);
    assert_eq!(quality.next_interval(), Duration::from_millis(1000));

    for _ in 0..10 {
        quality.tick().await.expect("visible");
        tokio::time::advance(Duration::from_secs(1)).await;
    }
    assert_eq!(quality.next_interval(), Duration::from_millis(1000));

    quality.tick().await.expect("visible");
    assert_eq!(quality.next_interval(), Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn test_run_samples_once_per_interval() {
    let sender = Arc::new(MockMediaSender::default());
    sender.script([sample(200.0, 1)]);
    let quality = quality_loop(sender.clone(), &PeerConfig::default(), 1);

    let task = tokio::spawn(quality.run());
    tokio::time::sleep(Duration::from_millis(5500)).await;
    task.abort();

    assert_eq!(sender.stats_calls(), 6);
}
