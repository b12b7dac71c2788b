use jamroom_core::{ConnectionId, ServerMessage};

/// Outbound side of the relay, as seen by the room registry.
///
/// Both calls return immediately. Frames for a closed or unknown transport
/// are dropped without reporting back.
pub trait SignalingOutput: Send + Sync {
    /// Queue one frame for a transport.
    fn send(&self, connection: ConnectionId, msg: ServerMessage);

    /// Close a transport after the frames already queued for it.
    fn close(&self, connection: ConnectionId);
}
