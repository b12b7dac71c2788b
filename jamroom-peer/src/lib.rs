pub mod batching;
pub mod config;
pub mod error;
pub mod mesh;
pub mod negotiation;
pub mod quality;
mod task;
pub mod transport;

pub use batching::*;
pub use config::*;
pub use error::*;
pub use mesh::*;
pub use negotiation::*;
pub use quality::*;
pub use transport::*;
