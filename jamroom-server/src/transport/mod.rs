mod heartbeat;
mod rate_limiter;

pub use heartbeat::*;
pub use rate_limiter::*;
