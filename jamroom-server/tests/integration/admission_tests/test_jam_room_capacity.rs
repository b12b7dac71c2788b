use jamroom_core::{
    ConnectionId, ErrorCode, PeerId, PeerRole, RoomSettingsPatch, ServerMessage,
};

use crate::integration::init_tracing;
use crate::utils::{TestRegistry, assert_single_host, create_room, join, tags};

fn two_seat_room(t: &mut TestRegistry) -> (ConnectionId, ConnectionId) {
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    let patch = RoomSettingsPatch {
        max_peers: Some(2),
        ..Default::default()
    };
    t.send(a, create_room("jam", "a", Some(patch)));
    t.send(b, join("jam", "b"));
    (a, b)
}

#[test]
fn test_creator_becomes_host() {
    init_tracing();
    let mut t = TestRegistry::new();
    let a = ConnectionId::new();

    t.send(a, create_room("jam", "a", None));

    let msgs = t.take(a);
    assert_eq!(tags(&msgs), ["room-created"]);
    match &msgs[0] {
        ServerMessage::RoomCreated {
            room_id, is_host, settings,
        } => {
            assert_eq!(room_id.0, "jam");
            assert!(is_host);
            assert_eq!(settings.max_peers, 12);
            assert_eq!(settings.bpm, 120);
        }
        other => panic!("unexpected {other:?}"),
    }

    let room = t.room("jam").expect("room exists");
    assert_single_host(room);
    assert_eq!(room.peer(&PeerId::from("a")).map(|p| p.role), Some(PeerRole::Host));
}

#[test]
fn test_second_peer_gets_roster_and_host_is_notified() {
    init_tracing();
    let mut t = TestRegistry::new();
    let (a, b) = two_seat_room(&mut t);

    let to_a = t.take(a);
    assert_eq!(tags(&to_a), ["room-created", "peer-joined"]);
    assert!(matches!(
        &to_a[1],
        ServerMessage::PeerJoined { peer_id, nickname, ip }
            if peer_id.as_str() == "b" && nickname == "B" && ip == "10.0.0.1"
    ));

    let to_b = t.take(b);
    assert_eq!(tags(&to_b), ["joined", "chat-history"]);
    match &to_b[0] {
        ServerMessage::Joined {
            peers, is_host, host_id, ..
        } => {
            assert!(!is_host);
            assert_eq!(host_id.as_str(), "a");
            assert_eq!(peers.len(), 1);
            assert_eq!(peers[0].peer_id.as_str(), "a");
            assert_eq!(peers[0].role, PeerRole::Host);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_third_peer_is_refused_when_full() {
    init_tracing();
    let mut t = TestRegistry::new();
    let (a, b) = two_seat_room(&mut t);
    t.clear();

    let c = ConnectionId::new();
    t.send(c, join("jam", "c"));

    assert_eq!(
        t.take(c),
        [ServerMessage::Error {
            error: ErrorCode::RoomFull
        }]
    );
    assert!(t.take(a).is_empty());
    assert!(t.take(b).is_empty());

    let room = t.room("jam").expect("room exists");
    assert_eq!(room.peer_count(), 2);
    assert_eq!(room.waiting_count(), 0);
    assert!(t.registry.session(c).is_none());
}

#[test]
fn test_nickname_defaults_to_short_id() {
    let mut t = TestRegistry::new();
    let a = ConnectionId::new();
    t.send_json(
        a,
        serde_json::json!({
            "type": "create-room",
            "roomId": "jam",
            "peerId": "0123456789abcdef",
        }),
    );

    let room = t.room("jam").expect("room exists");
    let peer = room.peer(&PeerId::from("0123456789abcdef")).expect("peer");
    assert_eq!(peer.nickname, "01234567");
}
