use crate::signaling::SignalingOutput;
use jamroom_core::{
    ChatMessage, ConnectionId, MetronomeState, PeerId, PeerRole, RoomDetail, RoomId,
    RoomPeerView, RoomSettings, RoomSummary, RosterEntry, ServerMessage,
};
use std::collections::{HashMap, VecDeque};

/// Chat entries kept per room; older ones are evicted.
pub const CHAT_CAPACITY: usize = 200;
/// Chat entries replayed to a newly admitted peer.
pub const CHAT_REPLAY: usize = 50;

#[derive(Debug, Clone)]
pub struct Peer {
    pub id: PeerId,
    pub connection: ConnectionId,
    pub source_address: String,
    pub nickname: String,
    pub role: PeerRole,
    pub joined_at: u64,
    /// Admission order; breaks `joined_at` ties during host failover.
    pub(crate) admission: u64,
}

impl Peer {
    fn roster_entry(&self) -> RosterEntry {
        RosterEntry {
            peer_id: self.id.clone(),
            nickname: self.nickname.clone(),
            ip: self.source_address.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WaitingPeer {
    pub id: PeerId,
    pub connection: ConnectionId,
    pub source_address: String,
    pub nickname: String,
}

#[derive(Debug, Default)]
pub struct ChatLog {
    entries: VecDeque<ChatMessage>,
    last_id: u64,
}

impl ChatLog {
    pub fn append(&mut self, peer_id: PeerId, nickname: String, text: String, now: u64) -> ChatMessage {
        let id = now.max(self.last_id + 1);
        self.last_id = id;

        let message = ChatMessage {
            id,
            peer_id,
            nickname,
            message: text,
            timestamp: now,
        };

        self.entries.push_back(message.clone());
        while self.entries.len() > CHAT_CAPACITY {
            self.entries.pop_front();
        }
        message
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ChatMessage> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }
}

pub struct Room {
    pub id: RoomId,
    pub(crate) host_peer_id: PeerId,
    pub settings: RoomSettings,
    pub(crate) peers: HashMap<PeerId, Peer>,
    pub(crate) waiting: HashMap<PeerId, WaitingPeer>,
    pub(crate) chat_log: ChatLog,
    pub metronome: MetronomeState,
    pub created_at: u64,
}

impl Room {
    pub(crate) fn new(id: RoomId, host: PeerId, settings: RoomSettings, now: u64) -> Self {
        let metronome = MetronomeState {
            bpm: settings.bpm,
            ..Default::default()
        };

        Self {
            id,
            host_peer_id: host,
            settings,
            peers: HashMap::new(),
            waiting: HashMap::new(),
            chat_log: ChatLog::default(),
            metronome,
            created_at: now,
        }
    }

    pub fn host_peer_id(&self) -> &PeerId {
        &self.host_peer_id
    }

    pub fn is_host(&self, peer_id: &PeerId) -> bool {
        &self.host_peer_id == peer_id && self.peers.contains_key(peer_id)
    }

    pub fn peer(&self, peer_id: &PeerId) -> Option<&Peer> {
        self.peers.get(peer_id)
    }

    pub fn peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn waiting_peer(&self, peer_id: &PeerId) -> Option<&WaitingPeer> {
        self.waiting.get(peer_id)
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }

    pub fn chat_log(&self) -> &ChatLog {
        &self.chat_log
    }

    /// True when `peer_id` is admitted through exactly this transport.
    pub(crate) fn is_admitted_via(&self, peer_id: &PeerId, connection: ConnectionId) -> bool {
        self.peers
            .get(peer_id)
            .is_some_and(|p| p.connection == connection)
    }

    /// Peers other than `exclude`, in admission order.
    pub(crate) fn roster(&self, exclude: &PeerId) -> Vec<RosterEntry> {
        let mut peers: Vec<&Peer> = self.peers.values().filter(|p| &p.id != exclude).collect();
        peers.sort_by_key(|p| p.admission);
        peers.into_iter().map(Peer::roster_entry).collect()
    }

    /// Earliest-joined remaining peer.
    pub(crate) fn successor(&self) -> Option<PeerId> {
        self.peers
            .values()
            .min_by_key(|p| (p.joined_at, p.admission))
            .map(|p| p.id.clone())
    }

    /// Makes `new_host` the only host. Returns false if it is not a member.
    pub(crate) fn set_host(&mut self, new_host: &PeerId) -> bool {
        if !self.peers.contains_key(new_host) {
            return false;
        }
        for peer in self.peers.values_mut() {
            peer.role = if &peer.id == new_host {
                PeerRole::Host
            } else {
                PeerRole::Member
            };
        }
        self.host_peer_id = new_host.clone();
        true
    }

    pub(crate) fn host_changed_message(&self) -> Option<ServerMessage> {
        let host = self.peers.get(&self.host_peer_id)?;
        Some(ServerMessage::HostChanged {
            new_host_id: host.id.clone(),
            new_host_name: host.nickname.clone(),
        })
    }

    pub(crate) fn send_to(&self, output: &dyn SignalingOutput, peer_id: &PeerId, msg: ServerMessage) {
        if let Some(peer) = self.peers.get(peer_id) {
            output.send(peer.connection, msg);
        }
    }

    /// Best-effort fan-out. A dead transport only loses its own copy.
    pub fn broadcast(&self, output: &dyn SignalingOutput, msg: &ServerMessage, exclude: Option<&PeerId>) {
        for peer in self.peers.values() {
            if exclude == Some(&peer.id) {
                continue;
            }
            output.send(peer.connection, msg.clone());
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            peer_count: self.peers.len(),
            max_peers: self.settings.max_peers,
            has_password: self.settings.has_password(),
            waiting_room: self.settings.waiting_room,
            created_at: self.created_at,
        }
    }

    pub fn detail(&self) -> RoomDetail {
        let mut peers: Vec<&Peer> = self.peers.values().collect();
        peers.sort_by_key(|p| p.admission);

        RoomDetail {
            id: self.id.clone(),
            peer_count: self.peers.len(),
            max_peers: self.settings.max_peers,
            has_password: self.settings.has_password(),
            waiting_room: self.settings.waiting_room,
            created_at: self.created_at,
            bpm: self.metronome.bpm,
            is_metronome_playing: self.metronome.is_playing,
            peers: peers
                .into_iter()
                .map(|p| RoomPeerView {
                    id: p.id.clone(),
                    nickname: p.nickname.clone(),
                    role: p.role,
                    joined_at: p.joined_at,
                })
                .collect(),
            waiting_count: self.waiting.len(),
        }
    }
}
