mod candidate;
mod chat;
mod metronome;
mod peer;
mod room;
mod signaling;
mod snapshot;

pub use candidate::{CandidateTransport, CandidateType, IceCandidate};
pub use chat::ChatMessage;
pub use metronome::{BeatPhase, MetronomeState};
pub use peer::{ConnectionId, PeerId, PeerRole};
pub use room::{DEFAULT_BPM, DEFAULT_MAX_PEERS, RoomId, RoomSettings, RoomSettingsPatch};
pub use signaling::{
    ClientMessage, ErrorCode, LIVENESS_ACK, LIVENESS_TOKEN, RosterEntry, ServerMessage,
};
pub use snapshot::{RoomDetail, RoomPeerView, RoomSummary};
