use jamroom_core::ClientMessage;
use jamroom_peer::SignalSink;
use parking_lot::Mutex;

/// SignalSink that keeps every outbound relay message.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<ClientMessage>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<ClientMessage> {
        self.sent.lock().clone()
    }

    pub fn take(&self) -> Vec<ClientMessage> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl SignalSink for RecordingSink {
    fn send(&self, msg: ClientMessage) {
        tracing::debug!("[RecordingSink] {:?}", msg);
        self.sent.lock().push(msg);
    }
}
