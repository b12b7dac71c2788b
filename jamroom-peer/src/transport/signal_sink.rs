use jamroom_core::ClientMessage;

/// Outbound half of the relay connection.
pub trait SignalSink: Send + Sync {
    /// May be called with a pair's candidate queue locked; must not block.
    fn send(&self, msg: ClientMessage);
}

/// Whether the user can currently see the session.
pub trait Visibility: Send + Sync {
    fn is_visible(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

impl Visibility for AlwaysVisible {
    fn is_visible(&self) -> bool {
        true
    }
}
