pub mod media_sender;
pub mod peer_connection;
pub mod signal_sink;

pub use media_sender::*;
pub use peer_connection::*;
pub use signal_sink::*;
