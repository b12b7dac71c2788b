use jamroom_core::{ClientMessage, ConnectionId, PeerId, RoomSettingsPatch};

use crate::integration::init_tracing;
use crate::utils::{TestRegistry, create_room, join};

#[test]
fn test_member_host_commands_are_silent() {
    init_tracing();
    let mut t = TestRegistry::new();
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    let c = ConnectionId::new();
    t.send(a, create_room("jam", "a", None));
    t.send(b, join("jam", "b"));
    t.send(c, join("jam", "c"));
    t.clear();

    let attempts = vec![
        ClientMessage::KickPeer {
            target_peer_id: PeerId::from("c"),
        },
        ClientMessage::MutePeer {
            target_peer_id: PeerId::from("c"),
            muted: true,
        },
        ClientMessage::TransferHost {
            target_peer_id: PeerId::from("b"),
        },
        ClientMessage::UpdateSettings {
            settings: RoomSettingsPatch {
                max_peers: Some(1),
                ..Default::default()
            },
        },
        ClientMessage::MetronomeStart {
            bpm: Some(200),
            host_time: None,
        },
        ClientMessage::MetronomeBpm { bpm: 60 },
        ClientMessage::MetronomeStop,
        ClientMessage::ApprovePeer {
            target_peer_id: PeerId::from("c"),
        },
        ClientMessage::RejectPeer {
            target_peer_id: PeerId::from("c"),
        },
    ];
    for msg in attempts {
        t.send(b, msg);
    }

    for conn in [a, b, c] {
        assert!(t.take(conn).is_empty());
        assert!(!t.was_closed(conn));
    }

    let room = t.room("jam").expect("room exists");
    assert_eq!(room.peer_count(), 3);
    assert_eq!(room.host_peer_id().as_str(), "a");
    assert_eq!(room.settings.max_peers, 12);
    assert_eq!(room.metronome.bpm, 120);
    assert!(!room.metronome.is_playing);
}
