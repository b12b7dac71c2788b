pub use jamroom_core::model::{PeerId, RoomId};

pub mod model {
    pub use jamroom_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use jamroom_server::*;
}

#[cfg(feature = "peer")]
pub mod peer {
    pub use jamroom_peer::*;
}
