use jamroom_core::{ClientMessage, ConnectionId, RoomDetail, RoomId, RoomSummary};
use tokio::sync::oneshot;

/// Work items for the coordinator task, sent by WebSocket sessions and the REST layer.
#[derive(Debug)]
pub enum RoomCommand {
    /// A decoded envelope that passed the rate limiter.
    Inbound {
        connection: ConnectionId,
        source: String,
        message: ClientMessage,
    },

    /// The transport closed, was kicked, or missed a heartbeat.
    Disconnect { connection: ConnectionId },

    ListRooms {
        reply: oneshot::Sender<Vec<RoomSummary>>,
    },

    GetRoom {
        room_id: RoomId,
        reply: oneshot::Sender<Option<RoomDetail>>,
    },
}
