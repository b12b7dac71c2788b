pub mod candidate_batcher;
pub mod candidate_filter;

pub use candidate_batcher::*;
pub use candidate_filter::*;
