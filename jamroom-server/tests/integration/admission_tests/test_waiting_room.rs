use jamroom_core::{ClientMessage, ConnectionId, ErrorCode, PeerId, RoomSettingsPatch, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::{TestRegistry, create_room, join, tags};

fn gated_room(t: &mut TestRegistry) -> ConnectionId {
    let a = ConnectionId::new();
    let patch = RoomSettingsPatch {
        waiting_room: Some(true),
        ..Default::default()
    };
    t.send(a, create_room("jam", "a", Some(patch)));
    t.clear();
    a
}

#[test]
fn test_joiner_waits_and_host_is_asked() {
    init_tracing();
    let mut t = TestRegistry::new();
    let a = gated_room(&mut t);

    let b = ConnectionId::new();
    t.send_from(b, "198.51.100.7", join("jam", "b"));

    assert_eq!(t.take(b), [ServerMessage::WaitingRoom]);
    assert_eq!(
        t.take(a),
        [ServerMessage::WaitingRequest {
            peer_id: PeerId::from("b"),
            nickname: "B".into(),
            ip: "198.51.100.7".into(),
        }]
    );

    let room = t.room("jam").expect("room exists");
    assert_eq!(room.peer_count(), 1);
    assert!(room.waiting_peer(&PeerId::from("b")).is_some());
}

#[test]
fn test_approve_admits_waiting_peer() {
    init_tracing();
    let mut t = TestRegistry::new();
    let a = gated_room(&mut t);
    let b = ConnectionId::new();
    t.send(b, join("jam", "b"));
    t.clear();

    t.send(
        a,
        ClientMessage::ApprovePeer {
            target_peer_id: PeerId::from("b"),
        },
    );

    assert_eq!(tags(&t.take(b)), ["joined", "chat-history"]);
    assert_eq!(tags(&t.take(a)), ["peer-joined"]);

    let room = t.room("jam").expect("room exists");
    assert_eq!(room.peer_count(), 2);
    assert_eq!(room.waiting_count(), 0);
}

#[test]
fn test_approve_ignores_capacity() {
    let mut t = TestRegistry::new();
    let a = ConnectionId::new();
    let patch = RoomSettingsPatch {
        waiting_room: Some(true),
        max_peers: Some(2),
        ..Default::default()
    };
    t.send(a, create_room("jam", "a", Some(patch)));

    let b = ConnectionId::new();
    let c = ConnectionId::new();
    t.send(b, join("jam", "b"));
    t.send(c, join("jam", "c"));
    for target in ["b", "c"] {
        t.send(
            a,
            ClientMessage::ApprovePeer {
                target_peer_id: PeerId::from(target),
            },
        );
    }

    assert_eq!(t.room("jam").map(|r| r.peer_count()), Some(3));

    let d = ConnectionId::new();
    t.send(d, join("jam", "d"));
    assert_eq!(
        t.take(d),
        [ServerMessage::Error {
            error: ErrorCode::RoomFull
        }]
    );
}

#[test]
fn test_reject_sends_rejected_and_forgets_peer() {
    init_tracing();
    let mut t = TestRegistry::new();
    let a = gated_room(&mut t);
    let b = ConnectionId::new();
    t.send(b, join("jam", "b"));
    t.clear();

    t.send(
        a,
        ClientMessage::RejectPeer {
            target_peer_id: PeerId::from("b"),
        },
    );

    assert_eq!(t.take(b), [ServerMessage::Rejected]);
    assert_eq!(t.room("jam").map(|r| r.waiting_count()), Some(0));
    assert!(t.registry.session(b).is_none());
}

#[test]
fn test_waiting_peer_cannot_chat_or_relay() {
    let mut t = TestRegistry::new();
    let a = gated_room(&mut t);
    let b = ConnectionId::new();
    t.send(b, join("jam", "b"));
    t.clear();

    t.send_json(b, serde_json::json!({"type": "chat", "message": "let me in"}));
    t.send_json(b, serde_json::json!({"type": "offer", "to": "a", "sdp": "v=0"}));

    assert!(t.take(a).is_empty());
    assert!(t.room("jam").is_some_and(|r| r.chat_log().is_empty()));
}

#[test]
fn test_waiting_peer_disconnect_removes_entry() {
    let mut t = TestRegistry::new();
    let a = gated_room(&mut t);
    let b = ConnectionId::new();
    t.send(b, join("jam", "b"));
    t.clear();

    t.close(b);

    let room = t.room("jam").expect("room exists");
    assert_eq!(room.waiting_count(), 0);
    assert!(t.take(a).is_empty());

    // A late approval finds nothing to admit.
    t.send(
        a,
        ClientMessage::ApprovePeer {
            target_peer_id: PeerId::from("b"),
        },
    );
    assert_eq!(t.room("jam").map(|r| r.peer_count()), Some(1));
}
