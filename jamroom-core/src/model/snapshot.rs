use crate::model::peer::{PeerId, PeerRole};
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

/// Row of `GET /api/rooms`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub peer_count: usize,
    pub max_peers: usize,
    pub has_password: bool,
    pub waiting_room: bool,
    pub created_at: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomPeerView {
    pub id: PeerId,
    pub nickname: String,
    pub role: PeerRole,
    pub joined_at: u64,
}

/// Body of `GET /api/rooms/{id}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetail {
    pub id: RoomId,
    pub peer_count: usize,
    pub max_peers: usize,
    pub has_password: bool,
    pub waiting_room: bool,
    pub created_at: u64,
    pub bpm: u32,
    pub is_metronome_playing: bool,
    pub peers: Vec<RoomPeerView>,
    pub waiting_count: usize,
}
