//! Care-Aid Runtime
//!
//! Drives a scoring engine from two recurring triggers: an observation tick
//! that polls every source, and a passive drift tick.

pub mod monitor;
pub mod reading;

pub use monitor::*;
pub use reading::*;
