//! State-sequence modules.

pub mod filter;
pub mod runs;
pub mod stats;
pub mod transition;
