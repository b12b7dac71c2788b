use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use jamroom_core::{ClientMessage, ConnectionId, RoomId, ServerMessage};
use jamroom_server::{ManualClock, Room, RoomRegistry};
use tokio::sync::mpsc;

use super::mock_signaling::{MockSignalingOutput, Outbound};

/// Wall-clock origin for registry tests.
pub const T0: u64 = 1_700_000_000_000;

pub const DEFAULT_SOURCE: &str = "10.0.0.1";

/// Drives a [`RoomRegistry`] synchronously and sorts what it emits per transport.
pub struct TestRegistry {
    pub registry: RoomRegistry,
    pub clock: ManualClock,
    rx: mpsc::UnboundedReceiver<Outbound>,
    inbox: HashMap<ConnectionId, Vec<ServerMessage>>,
    closed: HashSet<ConnectionId>,
}

impl TestRegistry {
    pub fn new() -> Self {
        let clock = ManualClock::new(T0);
        let (signaling, rx) = MockSignalingOutput::new();
        let registry = RoomRegistry::new(Arc::new(signaling), Arc::new(clock.clone()));

        Self {
            registry,
            clock,
            rx,
            inbox: HashMap::new(),
            closed: HashSet::new(),
        }
    }

    pub fn send(&mut self, connection: ConnectionId, msg: ClientMessage) {
        self.send_from(connection, DEFAULT_SOURCE, msg);
    }

    pub fn send_from(&mut self, connection: ConnectionId, source: &str, msg: ClientMessage) {
        self.registry.handle_message(connection, source, msg);
    }

    /// Decodes a raw wire object first, the way the transport would.
    pub fn send_json(&mut self, connection: ConnectionId, value: serde_json::Value) {
        let msg: ClientMessage = serde_json::from_value(value).expect("valid client message");
        self.send(connection, msg);
    }

    pub fn close(&mut self, connection: ConnectionId) {
        self.registry.disconnect(connection);
    }

    fn pump(&mut self) {
        while let Ok(out) = self.rx.try_recv() {
            match out {
                Outbound::Message(connection, msg) => {
                    self.inbox.entry(connection).or_default().push(msg)
                }
                Outbound::Close(connection) => {
                    self.closed.insert(connection);
                }
            }
        }
    }

    /// Everything delivered to `connection` since the last call.
    pub fn take(&mut self, connection: ConnectionId) -> Vec<ServerMessage> {
        self.pump();
        self.inbox.remove(&connection).unwrap_or_default()
    }

    /// Discards pending frames for every transport.
    pub fn clear(&mut self) {
        self.pump();
        self.inbox.clear();
    }

    pub fn was_closed(&mut self, connection: ConnectionId) -> bool {
        self.pump();
        self.closed.contains(&connection)
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.registry.room(&RoomId::from(room_id))
    }
}

/// Asserts the single-host invariant on a live room.
pub fn assert_single_host(room: &Room) {
    use jamroom_core::PeerRole;

    let hosts: Vec<_> = room.peers().filter(|p| p.role == PeerRole::Host).collect();
    assert_eq!(hosts.len(), 1, "exactly one host expected");
    assert_eq!(&hosts[0].id, room.host_peer_id());
}
