pub mod mock_factory;
pub mod recording_sink;

pub use mock_connection::*;
pub use mock_factory::*;
pub use mock_sender::*;
pub use recording_sink::*;
