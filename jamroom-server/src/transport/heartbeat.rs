/// What the session should do on a heartbeat tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    SendPing,
    Terminate,
}

/// Liveness of one transport: a ping must be acknowledged before the next tick.
#[derive(Debug, Default)]
pub struct Heartbeat {
    awaiting_ack: bool,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acknowledge(&mut self) {
        self.awaiting_ack = false;
    }

    pub fn on_tick(&mut self) -> HeartbeatAction {
        if self.awaiting_ack {
            return HeartbeatAction::Terminate;
        }
        self.awaiting_ack = true;
        HeartbeatAction::SendPing
    }
}
