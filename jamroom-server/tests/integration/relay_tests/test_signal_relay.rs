use jamroom_core::{ClientMessage, ConnectionId, IceCandidate, PeerId, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::{T0, TestRegistry, create_room, join};

fn pair(t: &mut TestRegistry) -> (ConnectionId, ConnectionId, ConnectionId) {
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    let c = ConnectionId::new();
    t.send(a, create_room("jam", "a", None));
    t.send(b, join("jam", "b"));
    t.send(c, join("jam", "c"));
    t.clear();
    (a, b, c)
}

#[test]
fn test_offer_and_answer_are_stamped_with_sender() {
    init_tracing();
    let mut t = TestRegistry::new();
    let (a, b, c) = pair(&mut t);

    t.send(
        b,
        ClientMessage::Offer {
            to: PeerId::from("a"),
            sdp: "v=0 offer".into(),
        },
    );
    t.send(
        a,
        ClientMessage::Answer {
            to: PeerId::from("b"),
            sdp: "v=0 answer".into(),
        },
    );

    assert_eq!(
        t.take(a),
        [ServerMessage::Offer {
            from: PeerId::from("b"),
            sdp: "v=0 offer".into(),
        }]
    );
    assert_eq!(
        t.take(b),
        [ServerMessage::Answer {
            from: PeerId::from("a"),
            sdp: "v=0 answer".into(),
        }]
    );
    assert!(t.take(c).is_empty());
}

#[test]
fn test_candidates_and_end_marker_are_relayed() {
    let mut t = TestRegistry::new();
    let (a, b, _) = pair(&mut t);
    let host = IceCandidate::new("candidate:1 1 udp 2122260223 192.168.1.4 50000 typ host");

    t.send(
        a,
        ClientMessage::IceCandidatesBatch {
            to: PeerId::from("b"),
            candidates: vec![host.clone(), host.clone()],
        },
    );
    t.send_json(
        a,
        serde_json::json!({"type": "ice-candidate", "to": "b", "candidate": null}),
    );

    let from = PeerId::from("a");
    assert_eq!(
        t.take(b),
        [
            ServerMessage::IceCandidatesBatch {
                from: from.clone(),
                candidates: vec![host.clone(), host],
            },
            ServerMessage::IceCandidate {
                from,
                candidate: None,
            },
        ]
    );
}

#[test]
fn test_relay_to_unknown_peer_is_dropped() {
    let mut t = TestRegistry::new();
    let (a, b, c) = pair(&mut t);

    t.send(
        a,
        ClientMessage::Offer {
            to: PeerId::from("ghost"),
            sdp: "v=0".into(),
        },
    );

    for conn in [a, b, c] {
        assert!(t.take(conn).is_empty());
    }
}

#[test]
fn test_relay_from_superseded_transport_is_dropped() {
    let mut t = TestRegistry::new();
    let (a, b, _) = pair(&mut t);
    let b2 = ConnectionId::new();
    t.send(b2, join("jam", "b"));
    t.clear();

    // The old transport lost its binding when b reconnected.
    t.send(
        b,
        ClientMessage::Offer {
            to: PeerId::from("a"),
            sdp: "stale".into(),
        },
    );
    assert!(t.take(a).is_empty());
}

#[test]
fn test_screen_share_goes_to_everyone_else() {
    let mut t = TestRegistry::new();
    let (a, b, c) = pair(&mut t);

    t.send(b, ClientMessage::ScreenShareStarted);
    t.send(b, ClientMessage::ScreenShareStopped);

    let expected = vec![
        ServerMessage::ScreenShareStarted {
            peer_id: PeerId::from("b"),
            nickname: "B".into(),
        },
        ServerMessage::ScreenShareStopped {
            peer_id: PeerId::from("b"),
        },
    ];
    assert_eq!(t.take(a), expected);
    assert_eq!(t.take(c), expected);
    assert!(t.take(b).is_empty());
}

#[test]
fn test_audio_routing_and_latency_ping() {
    let mut t = TestRegistry::new();
    let (a, b, _) = pair(&mut t);

    t.send(
        a,
        ClientMessage::AudioRouting {
            to: PeerId::from("b"),
            enabled: false,
        },
    );
    t.send(
        a,
        ClientMessage::LatencyPing {
            to: PeerId::from("b"),
            timestamp: 12.5,
        },
    );
    t.clock.advance(7);
    t.send(
        b,
        ClientMessage::LatencyPong {
            to: PeerId::from("a"),
            original_timestamp: 12.5,
        },
    );

    assert_eq!(
        t.take(b),
        [
            ServerMessage::AudioRouting {
                from: PeerId::from("a"),
                enabled: false,
            },
            ServerMessage::LatencyPing {
                from: PeerId::from("a"),
                timestamp: 12.5,
            },
        ]
    );
    assert_eq!(
        t.take(a),
        [ServerMessage::LatencyPong {
            from: PeerId::from("b"),
            original_timestamp: 12.5,
            server_timestamp: T0 + 7,
        }]
    );
}
