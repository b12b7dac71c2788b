pub mod quality_loop;
pub mod quality_monitor;
pub mod tiers;

pub use quality_loop::*;
pub use quality_monitor::*;
pub use tiers::*;
