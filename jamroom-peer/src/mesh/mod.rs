pub mod pair_session;
pub mod peer_mesh;

pub use pair_session::*;
pub use peer_mesh::*;
