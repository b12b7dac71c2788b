use crate::room::room_command::RoomCommand;
use crate::room::room_registry::RoomRegistry;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Single task that owns the [`RoomRegistry`] and applies commands in arrival order.
pub struct Coordinator {
    registry: RoomRegistry,
    command_rx: mpsc::Receiver<RoomCommand>,
}

impl Coordinator {
    pub fn new(registry: RoomRegistry, command_rx: mpsc::Receiver<RoomCommand>) -> Self {
        Self {
            registry,
            command_rx,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Runs until every command sender is dropped.
    pub async fn run(mut self) {
        info!("Coordinator event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }

        info!("Command channel closed. Coordinator stopped.");
    }

    pub fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Inbound {
                connection,
                source,
                message,
            } => {
                self.registry.handle_message(connection, &source, message);
            }

            RoomCommand::Disconnect { connection } => {
                debug!("Transport {} closed", connection);
                self.registry.disconnect(connection);
            }

            RoomCommand::ListRooms { reply } => {
                let _ = reply.send(self.registry.list_rooms());
            }

            RoomCommand::GetRoom { room_id, reply } => {
                let _ = reply.send(self.registry.room_detail(&room_id));
            }
        }
    }
}
