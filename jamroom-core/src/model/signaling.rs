use crate::model::candidate::IceCandidate;
use crate::model::chat::ChatMessage;
use crate::model::metronome::MetronomeState;
use crate::model::peer::{PeerId, PeerRole};
use crate::model::room::{RoomId, RoomSettings, RoomSettingsPatch};
use serde::{Deserialize, Serialize};

/// Bare text frame a client sends to check the relay connection.
pub const LIVENESS_TOKEN: &str = "ping";
/// Reply to [`LIVENESS_TOKEN`].
pub const LIVENESS_ACK: &str = "pong";

/// Peer → coordinator envelope, `{"type": "...", ...fields}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        room_id: RoomId,
        peer_id: PeerId,
        #[serde(default)]
        nickname: Option<String>,
        #[serde(default)]
        settings: Option<RoomSettingsPatch>,
    },
    Join {
        room_id: RoomId,
        peer_id: PeerId,
        #[serde(default)]
        nickname: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
    ApprovePeer {
        target_peer_id: PeerId,
    },
    RejectPeer {
        target_peer_id: PeerId,
    },
    KickPeer {
        target_peer_id: PeerId,
    },
    MutePeer {
        target_peer_id: PeerId,
        muted: bool,
    },
    UpdateSettings {
        settings: RoomSettingsPatch,
    },
    TransferHost {
        target_peer_id: PeerId,
    },
    MetronomeStart {
        #[serde(default)]
        bpm: Option<u32>,
        #[serde(default)]
        host_time: Option<u64>,
    },
    MetronomeStop,
    MetronomeBpm {
        bpm: u32,
    },
    Chat {
        message: String,
    },
    Offer {
        to: PeerId,
        sdp: String,
    },
    Answer {
        to: PeerId,
        sdp: String,
    },
    /// `candidate: null` marks the end of the sender's gathering.
    IceCandidate {
        to: PeerId,
        #[serde(default)]
        candidate: Option<IceCandidate>,
    },
    IceCandidatesBatch {
        to: PeerId,
        candidates: Vec<IceCandidate>,
    },
    ScreenShareStarted,
    ScreenShareStopped,
    AudioRouting {
        to: PeerId,
        enabled: bool,
    },
    LatencyPing {
        to: PeerId,
        timestamp: f64,
    },
    LatencyPong {
        to: PeerId,
        original_timestamp: f64,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    RoomNotFound,
    WrongPassword,
    RoomFull,
    RateLimited,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub peer_id: PeerId,
    pub nickname: String,
    pub ip: String,
    pub role: PeerRole,
}

/// Coordinator → peer envelope.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomCreated {
        room_id: RoomId,
        is_host: bool,
        settings: RoomSettings,
    },
    Joined {
        peers: Vec<RosterEntry>,
        is_host: bool,
        host_id: PeerId,
        settings: RoomSettings,
        metronome: MetronomeState,
    },
    PeerJoined {
        peer_id: PeerId,
        nickname: String,
        ip: String,
    },
    PeerLeft {
        peer_id: PeerId,
        nickname: String,
    },
    WaitingRoom,
    WaitingRequest {
        peer_id: PeerId,
        nickname: String,
        ip: String,
    },
    Rejected,
    Kicked,
    ForceMute {
        muted: bool,
    },
    PeerMuted {
        peer_id: PeerId,
        muted: bool,
    },
    HostChanged {
        new_host_id: PeerId,
        new_host_name: String,
    },
    SettingsUpdated {
        settings: RoomSettings,
    },
    MetronomeSync(MetronomeState),
    MetronomeStop,
    MetronomeBpm {
        bpm: u32,
    },
    ChatMessage(ChatMessage),
    ChatHistory {
        messages: Vec<ChatMessage>,
    },
    Error {
        error: ErrorCode,
    },
    Offer {
        from: PeerId,
        sdp: String,
    },
    Answer {
        from: PeerId,
        sdp: String,
    },
    IceCandidate {
        from: PeerId,
        #[serde(default)]
        candidate: Option<IceCandidate>,
    },
    IceCandidatesBatch {
        from: PeerId,
        candidates: Vec<IceCandidate>,
    },
    ScreenShareStarted {
        peer_id: PeerId,
        nickname: String,
    },
    ScreenShareStopped {
        peer_id: PeerId,
    },
    AudioRouting {
        from: PeerId,
        enabled: bool,
    },
    LatencyPing {
        from: PeerId,
        timestamp: f64,
    },
    LatencyPong {
        from: PeerId,
        original_timestamp: f64,
        server_timestamp: u64,
    },
}
