use crate::clock::Clock;
use crate::error::JoinError;
use crate::room::room::{CHAT_REPLAY, Peer, Room, WaitingPeer};
use crate::signaling::SignalingOutput;
use jamroom_core::{
    ClientMessage, ConnectionId, MetronomeState, PeerId, PeerRole, RoomDetail, RoomId,
    RoomSettings, RoomSettingsPatch, RoomSummary, ServerMessage,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// What a transport is bound to after a create-room or join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub room_id: RoomId,
    pub peer_id: PeerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Admitted,
    Waiting,
}

/// Owns every room of this process.
///
/// All mutation happens through `&mut self` on the coordinator task, one
/// inbound message at a time, so no locking is involved. A room exists from
/// the first create-room for its id until its last peer leaves.
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    sessions: HashMap<ConnectionId, Session>,
    output: Arc<dyn SignalingOutput>,
    clock: Arc<dyn Clock>,
    next_admission: u64,
}

impl RoomRegistry {
    pub fn new(output: Arc<dyn SignalingOutput>, clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: HashMap::new(),
            sessions: HashMap::new(),
            output,
            clock,
            next_admission: 0,
        }
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn session(&self, connection: ConnectionId) -> Option<&Session> {
        self.sessions.get(&connection)
    }

    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self.rooms.values().map(Room::summary).collect();
        rooms.sort_by_key(|r| r.created_at);
        rooms
    }

    pub fn room_detail(&self, room_id: &RoomId) -> Option<RoomDetail> {
        self.rooms.get(room_id).map(Room::detail)
    }

    /// Decoded message from one transport.
    pub fn handle_message(&mut self, connection: ConnectionId, source: &str, msg: ClientMessage) {
        match msg {
            ClientMessage::CreateRoom {
                room_id,
                peer_id,
                nickname,
                settings,
            } => {
                self.create_room(connection, source, room_id, peer_id, nickname, settings);
            }

            ClientMessage::Join {
                room_id,
                peer_id,
                nickname,
                password,
            } => {
                if let Err(e) = self.join(connection, source, room_id, peer_id, nickname, password) {
                    self.output.send(connection, ServerMessage::Error { error: e.code() });
                }
            }

            other => {
                let Some(Session { room_id, peer_id }) = self.sessions.get(&connection).cloned()
                else {
                    debug!("Ignoring {:?} from unbound transport {}", other, connection);
                    return;
                };
                self.handle_bound(connection, room_id, peer_id, other);
            }
        }
    }

    fn handle_bound(&mut self, connection: ConnectionId, room_id: RoomId, caller: PeerId, msg: ClientMessage) {
        match msg {
            ClientMessage::ApprovePeer { target_peer_id } => {
                self.approve(&room_id, &caller, &target_peer_id)
            }
            ClientMessage::RejectPeer { target_peer_id } => {
                self.reject(&room_id, &caller, &target_peer_id)
            }
            ClientMessage::KickPeer { target_peer_id } => {
                self.kick(&room_id, &caller, &target_peer_id)
            }
            ClientMessage::MutePeer {
                target_peer_id,
                muted,
            } => self.mute(&room_id, &caller, &target_peer_id, muted),
            ClientMessage::UpdateSettings { settings } => {
                self.update_settings(&room_id, &caller, settings)
            }
            ClientMessage::TransferHost { target_peer_id } => {
                self.transfer_host(&room_id, &caller, &target_peer_id)
            }
            ClientMessage::MetronomeStart { bpm, host_time } => {
                self.metronome_start(&room_id, &caller, bpm, host_time)
            }
            ClientMessage::MetronomeStop => self.metronome_stop(&room_id, &caller),
            ClientMessage::MetronomeBpm { bpm } => self.metronome_bpm(&room_id, &caller, bpm),
            other => self.handle_member(connection, &room_id, &caller, other),
        }
    }

    /// Messages any admitted peer may send: chat, relay, presence.
    fn handle_member(&mut self, connection: ConnectionId, room_id: &RoomId, sender: &PeerId, msg: ClientMessage) {
        let admitted = self
            .rooms
            .get(room_id)
            .is_some_and(|room| room.is_admitted_via(sender, connection));
        if !admitted {
            debug!("Ignoring message from non-member {} in [{}]", sender, room_id);
            return;
        }
        if let ClientMessage::Chat { message } = msg {
            self.chat(room_id, sender, message);
            return;
        }
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };

        let output = self.output.as_ref();
        let from = sender.clone();
        match msg {
            ClientMessage::Offer { to, sdp } => {
                room.send_to(output, &to, ServerMessage::Offer { from, sdp })
            }
            ClientMessage::Answer { to, sdp } => {
                room.send_to(output, &to, ServerMessage::Answer { from, sdp })
            }
            ClientMessage::IceCandidate { to, candidate } => {
                room.send_to(output, &to, ServerMessage::IceCandidate { from, candidate })
            }
            ClientMessage::IceCandidatesBatch { to, candidates } => room.send_to(
                output,
                &to,
                ServerMessage::IceCandidatesBatch { from, candidates },
            ),
            ClientMessage::AudioRouting { to, enabled } => {
                room.send_to(output, &to, ServerMessage::AudioRouting { from, enabled })
            }
            ClientMessage::LatencyPing { to, timestamp } => {
                room.send_to(output, &to, ServerMessage::LatencyPing { from, timestamp })
            }
            ClientMessage::LatencyPong {
                to,
                original_timestamp,
            } => {
                let server_timestamp = self.clock.now_ms();
                room.send_to(
                    output,
                    &to,
                    ServerMessage::LatencyPong {
                        from,
                        original_timestamp,
                        server_timestamp,
                    },
                )
            }
            ClientMessage::ScreenShareStarted => {
                let nickname = room.peer(sender).map(|p| p.nickname.clone()).unwrap_or_default();
                let msg = ServerMessage::ScreenShareStarted {
                    peer_id: from,
                    nickname,
                };
                room.broadcast(output, &msg, Some(sender));
            }
            ClientMessage::ScreenShareStopped => {
                let msg = ServerMessage::ScreenShareStopped { peer_id: from };
                room.broadcast(output, &msg, Some(sender));
            }
            other => debug!("Unhandled member message {:?}", other),
        }
    }

    /// Creates the room, or adopts an existing one with the requester as sole host.
    pub fn create_room(
        &mut self,
        connection: ConnectionId,
        source: &str,
        room_id: RoomId,
        peer_id: PeerId,
        nickname: Option<String>,
        settings: Option<RoomSettingsPatch>,
    ) -> RoomSettings {
        self.detach_other_binding(connection, &room_id, &peer_id);
        self.evict_stale_transport(connection, &room_id, &peer_id);

        let now = self.clock.now_ms();
        let nickname = resolve_nickname(nickname, &peer_id);
        let admission = self.next_admission();

        let created = !self.rooms.contains_key(&room_id);
        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            Room::new(room_id.clone(), peer_id.clone(), RoomSettings::default(), now)
        });
        if let Some(patch) = settings {
            room.settings.merge(patch);
        }
        if created {
            room.metronome.bpm = room.settings.bpm;
            info!("[{}] Room created by {}", room_id, nickname);
        }

        room.waiting.remove(&peer_id);
        let previous_host = room.host_peer_id.clone();
        let joined_at = room.peers.get(&peer_id).map_or(now, |p| p.joined_at);
        let admission = room.peers.get(&peer_id).map_or(admission, |p| p.admission);
        room.peers.insert(
            peer_id.clone(),
            Peer {
                id: peer_id.clone(),
                connection,
                source_address: source.to_owned(),
                nickname,
                role: PeerRole::Member,
                joined_at,
                admission,
            },
        );
        room.set_host(&peer_id);

        let output = self.output.as_ref();
        output.send(
            connection,
            ServerMessage::RoomCreated {
                room_id: room_id.clone(),
                is_host: true,
                settings: room.settings.clone(),
            },
        );

        if previous_host != peer_id && room.peers.len() > 1 {
            info!("[{}] Host re-bound from {} to {}", room_id, previous_host, peer_id);
            if let Some(msg) = room.host_changed_message() {
                room.broadcast(output, &msg, Some(&peer_id));
            }
        }

        let settings = room.settings.clone();
        self.sessions.insert(connection, Session { room_id, peer_id });
        settings
    }

    /// Validates in order: room exists, password, capacity; then admits or queues.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        source: &str,
        room_id: RoomId,
        peer_id: PeerId,
        nickname: Option<String>,
        password: Option<String>,
    ) -> Result<JoinOutcome, JoinError> {
        self.validate_join(connection, &room_id, &peer_id, password.as_deref())?;

        self.detach_other_binding(connection, &room_id, &peer_id);
        self.evict_stale_transport(connection, &room_id, &peer_id);

        let now = self.clock.now_ms();
        let admission = self.next_admission();
        let nickname = resolve_nickname(nickname, &peer_id);
        let output = self.output.as_ref();
        let room = self.rooms.get_mut(&room_id).ok_or(JoinError::RoomNotFound)?;

        let outcome = if room.peers.contains_key(&peer_id) {
            // Reconnect under an id that is already admitted: keep its role.
            if let Some(peer) = room.peers.get_mut(&peer_id) {
                peer.connection = connection;
                peer.source_address = source.to_owned();
            }
            send_admission(room, output, &peer_id);
            JoinOutcome::Admitted
        } else if room.settings.waiting_room {
            room.waiting.insert(
                peer_id.clone(),
                WaitingPeer {
                    id: peer_id.clone(),
                    connection,
                    source_address: source.to_owned(),
                    nickname: nickname.clone(),
                },
            );
            output.send(connection, ServerMessage::WaitingRoom);
            let host = room.host_peer_id.clone();
            room.send_to(
                output,
                &host,
                ServerMessage::WaitingRequest {
                    peer_id: peer_id.clone(),
                    nickname: nickname.clone(),
                    ip: source.to_owned(),
                },
            );
            info!("[{}] {} is waiting for approval", room_id, nickname);
            JoinOutcome::Waiting
        } else {
            admit(
                room,
                output,
                Peer {
                    id: peer_id.clone(),
                    connection,
                    source_address: source.to_owned(),
                    nickname,
                    role: PeerRole::Member,
                    joined_at: now,
                    admission,
                },
            );
            JoinOutcome::Admitted
        };

        self.sessions.insert(connection, Session { room_id, peer_id });
        Ok(outcome)
    }

    /// Checks the join against the room as it will be once this transport has
    /// released its current binding, without releasing anything yet.
    fn validate_join(
        &self,
        connection: ConnectionId,
        room_id: &RoomId,
        peer_id: &PeerId,
        password: Option<&str>,
    ) -> Result<(), JoinError> {
        let room = self.rooms.get(room_id).ok_or(JoinError::RoomNotFound)?;

        // Admitted here under another id; that seat is vacated by the join.
        let vacating = self
            .sessions
            .get(&connection)
            .filter(|s| &s.room_id == room_id && &s.peer_id != peer_id)
            .is_some_and(|s| room.is_admitted_via(&s.peer_id, connection));
        let occupied = room.peers.len() - usize::from(vacating);

        if occupied == 0 {
            // Leaving would delete the room.
            return Err(JoinError::RoomNotFound);
        }
        if !room.settings.password_matches(password) {
            return Err(JoinError::WrongPassword);
        }
        if !room.peers.contains_key(peer_id) && occupied >= room.settings.max_peers {
            return Err(JoinError::RoomFull);
        }
        Ok(())
    }

    pub fn approve(&mut self, room_id: &RoomId, host_id: &PeerId, target: &PeerId) {
        let admission = self.next_admission();
        let now = self.clock.now_ms();
        let Some(room) = host_room_mut(&mut self.rooms, room_id, host_id) else {
            return;
        };
        let Some(waiting) = room.waiting.remove(target) else {
            return;
        };

        admit(
            room,
            self.output.as_ref(),
            Peer {
                id: waiting.id,
                connection: waiting.connection,
                source_address: waiting.source_address,
                nickname: waiting.nickname,
                role: PeerRole::Member,
                joined_at: now,
                admission,
            },
        );
    }

    pub fn reject(&mut self, room_id: &RoomId, host_id: &PeerId, target: &PeerId) {
        let Some(room) = host_room_mut(&mut self.rooms, room_id, host_id) else {
            return;
        };
        let Some(waiting) = room.waiting.remove(target) else {
            return;
        };

        info!("[{}] {} was rejected", room_id, waiting.nickname);
        self.output.send(waiting.connection, ServerMessage::Rejected);
        self.sessions.remove(&waiting.connection);
    }

    pub fn kick(&mut self, room_id: &RoomId, host_id: &PeerId, target: &PeerId) {
        if host_id == target {
            return;
        }
        let Some(room) = host_room_mut(&mut self.rooms, room_id, host_id) else {
            return;
        };
        let Some(connection) = room.peers.get(target).map(|p| p.connection) else {
            return;
        };

        info!("[{}] {} kicked by host", room_id, target);
        self.output.send(connection, ServerMessage::Kicked);
        self.output.close(connection);
        self.sessions.remove(&connection);
        self.leave(room_id, target);
    }

    /// Advisory: the target is trusted to mute itself. Nothing here touches media.
    pub fn mute(&mut self, room_id: &RoomId, host_id: &PeerId, target: &PeerId, muted: bool) {
        let Some(room) = host_room_mut(&mut self.rooms, room_id, host_id) else {
            return;
        };
        if !room.peers.contains_key(target) {
            return;
        }

        let output = self.output.as_ref();
        room.send_to(output, target, ServerMessage::ForceMute { muted });
        room.broadcast(
            output,
            &ServerMessage::PeerMuted {
                peer_id: target.clone(),
                muted,
            },
            None,
        );
    }

    pub fn transfer_host(&mut self, room_id: &RoomId, host_id: &PeerId, target: &PeerId) {
        if host_id == target {
            return;
        }
        let Some(room) = host_room_mut(&mut self.rooms, room_id, host_id) else {
            return;
        };
        if !room.set_host(target) {
            return;
        }

        info!("[{}] Host transferred from {} to {}", room_id, host_id, target);
        if let Some(msg) = room.host_changed_message() {
            room.broadcast(self.output.as_ref(), &msg, None);
        }
    }

    pub fn update_settings(&mut self, room_id: &RoomId, host_id: &PeerId, patch: RoomSettingsPatch) {
        let Some(room) = host_room_mut(&mut self.rooms, room_id, host_id) else {
            return;
        };
        room.settings.merge(patch);

        let msg = ServerMessage::SettingsUpdated {
            settings: room.settings.clone(),
        };
        room.broadcast(self.output.as_ref(), &msg, None);
    }

    pub fn metronome_start(&mut self, room_id: &RoomId, host_id: &PeerId, bpm: Option<u32>, host_time: Option<u64>) {
        let now = self.clock.now_ms();
        let Some(room) = host_room_mut(&mut self.rooms, room_id, host_id) else {
            return;
        };

        room.metronome = MetronomeState {
            bpm: bpm.unwrap_or(room.settings.bpm),
            is_playing: true,
            start_time: Some(now),
            host_time,
        };
        let msg = ServerMessage::MetronomeSync(room.metronome.clone());
        room.broadcast(self.output.as_ref(), &msg, None);
    }

    pub fn metronome_stop(&mut self, room_id: &RoomId, host_id: &PeerId) {
        let Some(room) = host_room_mut(&mut self.rooms, room_id, host_id) else {
            return;
        };

        room.metronome.is_playing = false;
        room.broadcast(self.output.as_ref(), &ServerMessage::MetronomeStop, None);
    }

    pub fn metronome_bpm(&mut self, room_id: &RoomId, host_id: &PeerId, bpm: u32) {
        let Some(room) = host_room_mut(&mut self.rooms, room_id, host_id) else {
            return;
        };

        room.metronome.bpm = bpm;
        room.settings.bpm = bpm;
        room.broadcast(self.output.as_ref(), &ServerMessage::MetronomeBpm { bpm }, None);
    }

    pub fn chat(&mut self, room_id: &RoomId, sender: &PeerId, text: String) {
        let now = self.clock.now_ms();
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let Some(nickname) = room.peers.get(sender).map(|p| p.nickname.clone()) else {
            return;
        };

        let entry = room.chat_log.append(sender.clone(), nickname, text, now);
        room.broadcast(self.output.as_ref(), &ServerMessage::ChatMessage(entry), None);
    }

    /// Close handling for a transport, whatever the reason (leave, kick, liveness).
    pub fn disconnect(&mut self, connection: ConnectionId) {
        let Some(Session { room_id, peer_id }) = self.sessions.remove(&connection) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };

        if room
            .waiting
            .get(&peer_id)
            .is_some_and(|w| w.connection == connection)
        {
            room.waiting.remove(&peer_id);
            debug!("[{}] {} left the waiting room", room_id, peer_id);
        }

        if room.is_admitted_via(&peer_id, connection) {
            self.leave(&room_id, &peer_id);
        }
    }

    fn leave(&mut self, room_id: &RoomId, peer_id: &PeerId) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        room.waiting.remove(peer_id);
        let Some(leaving) = room.peers.remove(peer_id) else {
            return;
        };

        info!(
            "[{}] {} left. Remaining: {}",
            room_id,
            leaving.nickname,
            room.peers.len()
        );

        if room.peers.is_empty() {
            for waiting in room.waiting.values() {
                self.sessions.remove(&waiting.connection);
            }
            self.rooms.remove(room_id);
            info!("[{}] Room deleted (empty)", room_id);
            return;
        }

        let output = self.output.as_ref();
        if &room.host_peer_id == peer_id {
            if let Some(successor) = room.successor() {
                room.set_host(&successor);
                info!("[{}] Host passed to {}", room_id, successor);
                if let Some(msg) = room.host_changed_message() {
                    room.broadcast(output, &msg, None);
                }
            }
        }

        room.broadcast(
            output,
            &ServerMessage::PeerLeft {
                peer_id: peer_id.clone(),
                nickname: leaving.nickname,
            },
            None,
        );
    }

    /// A transport re-binding to a different room or peer id leaves its old place first.
    fn detach_other_binding(&mut self, connection: ConnectionId, room_id: &RoomId, peer_id: &PeerId) {
        let same = self
            .sessions
            .get(&connection)
            .is_some_and(|s| &s.room_id == room_id && &s.peer_id == peer_id);
        if !same {
            self.disconnect(connection);
        }
    }

    /// A newer transport claiming a peer id supersedes the old one.
    fn evict_stale_transport(&mut self, connection: ConnectionId, room_id: &RoomId, peer_id: &PeerId) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };

        let stale = room
            .peers
            .get(peer_id)
            .map(|p| p.connection)
            .into_iter()
            .chain(room.waiting.get(peer_id).map(|w| w.connection))
            .filter(|c| *c != connection)
            .collect::<Vec<_>>();

        for old in stale {
            debug!("[{}] {} reconnected; closing stale transport {}", room_id, peer_id, old);
            self.sessions.remove(&old);
            self.output.close(old);
        }
    }

    fn next_admission(&mut self) -> u64 {
        self.next_admission += 1;
        self.next_admission
    }
}

fn host_room_mut<'a>(
    rooms: &'a mut HashMap<RoomId, Room>,
    room_id: &RoomId,
    caller: &PeerId,
) -> Option<&'a mut Room> {
    let room = rooms.get_mut(room_id)?;
    if !room.is_host(caller) {
        debug!("[{}] Ignoring host-only command from {}", room_id, caller);
        return None;
    }
    Some(room)
}

fn resolve_nickname(nickname: Option<String>, peer_id: &PeerId) -> String {
    nickname
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| peer_id.short())
}

fn admit(room: &mut Room, output: &dyn SignalingOutput, peer: Peer) {
    let peer_id = peer.id.clone();
    info!(
        "[{}] {} ({}, {}) joined. Total: {}",
        room.id,
        peer.nickname,
        peer.id,
        peer.source_address,
        room.peers.len() + 1
    );

    let notice = ServerMessage::PeerJoined {
        peer_id: peer.id.clone(),
        nickname: peer.nickname.clone(),
        ip: peer.source_address.clone(),
    };
    room.peers.insert(peer_id.clone(), peer);
    room.broadcast(output, &notice, Some(&peer_id));

    send_admission(room, output, &peer_id);
}

/// Roster, chat replay and tempo epoch for a freshly admitted peer.
fn send_admission(room: &Room, output: &dyn SignalingOutput, peer_id: &PeerId) {
    room.send_to(
        output,
        peer_id,
        ServerMessage::Joined {
            peers: room.roster(peer_id),
            is_host: room.is_host(peer_id),
            host_id: room.host_peer_id.clone(),
            settings: room.settings.clone(),
            metronome: room.metronome.clone(),
        },
    );
    room.send_to(
        output,
        peer_id,
        ServerMessage::ChatHistory {
            messages: room.chat_log.recent(CHAT_REPLAY),
        },
    );
    if room.metronome.is_playing {
        room.send_to(output, peer_id, ServerMessage::MetronomeSync(room.metronome.clone()));
    }
}
