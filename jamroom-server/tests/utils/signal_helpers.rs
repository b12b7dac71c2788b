use jamroom_core::{ClientMessage, PeerId, RoomId, RoomSettingsPatch, ServerMessage};

pub fn create_room(room_id: &str, peer_id: &str, settings: Option<RoomSettingsPatch>) -> ClientMessage {
    ClientMessage::CreateRoom {
        room_id: RoomId::from(room_id),
        peer_id: PeerId::from(peer_id),
        nickname: Some(peer_id.to_uppercase()),
        settings,
    }
}

pub fn join(room_id: &str, peer_id: &str) -> ClientMessage {
    join_with_password(room_id, peer_id, None)
}

pub fn join_with_password(room_id: &str, peer_id: &str, password: Option<&str>) -> ClientMessage {
    ClientMessage::Join {
        room_id: RoomId::from(room_id),
        peer_id: PeerId::from(peer_id),
        nickname: Some(peer_id.to_uppercase()),
        password: password.map(str::to_owned),
    }
}

/// Wire tag of a server message, e.g. `"peer-joined"`.
pub fn tag(msg: &ServerMessage) -> String {
    let value = serde_json::to_value(msg).expect("server message serializes");
    value["type"].as_str().unwrap_or_default().to_owned()
}

pub fn tags(msgs: &[ServerMessage]) -> Vec<String> {
    msgs.iter().map(tag).collect()
}
