pub mod negotiation_engine;
pub mod negotiation_phase;
pub mod pair_command;
pub mod pending_candidates;

pub use negotiation_engine::*;
pub use negotiation_phase::*;
pub use pair_command::*;
pub use pending_candidates::*;
