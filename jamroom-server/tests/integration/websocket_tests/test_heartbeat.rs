use jamroom_core::ServerMessage;
use jamroom_server::ServerConfig;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{TestClient, create_room, join, spawn_server};

#[tokio::test]
async fn test_silent_transport_is_terminated() {
    init_tracing();
    let config = ServerConfig {
        heartbeat_interval: Duration::from_millis(300),
        ..Default::default()
    };
    let addr = spawn_server(config).await.expect("server");

    let mut host = TestClient::connect(addr).await.expect("connect host");
    host.send(&create_room("jam", "a", None)).await.expect("send");
    host.recv().await.expect("room-created");

    // Never polled again, so it never answers a ping.
    let mut silent = TestClient::connect(addr).await.expect("connect silent");
    silent.send(&join("jam", "b")).await.expect("send");

    host.recv_until(|m| matches!(m, ServerMessage::PeerJoined { .. }))
        .await
        .expect("peer-joined");

    let left = host
        .recv_until(|m| matches!(m, ServerMessage::PeerLeft { .. }))
        .await
        .expect("silent peer evicted");
    assert!(matches!(left, ServerMessage::PeerLeft { peer_id, .. } if peer_id.as_str() == "b"));

    drop(silent);
}
