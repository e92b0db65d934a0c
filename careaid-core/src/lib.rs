//! Care-Aid Core - Signal scoring engine for distress monitoring
//!
//! This crate provides the foundational primitives:
//! - Named signal channels with weights, keyword sets and idle bands
//! - Two combination policies (priority max and weighted sum)
//! - Tier classification over a bounded 0-100 score
//! - Passive drift driven by an injected random source
//! - Engine profiles loaded from TOML

pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod keywords;
pub mod observation;
pub mod policy;
pub mod profile;
pub mod snapshot;
pub mod tier;

pub use channel::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use history::*;
pub use keywords::*;
pub use observation::*;
pub use policy::*;
pub use profile::*;
pub use snapshot::*;
pub use tier::*;

/// Lowest value a channel or aggregate score may take
pub const MIN_SCORE: f64 = 0.0;

/// Highest value a channel or aggregate score may take
pub const MAX_SCORE: f64 = 100.0;

/// Default passive drift interval in milliseconds
pub const DEFAULT_DRIFT_INTERVAL_MS: u64 = 2000;

/// Default drift magnitude per tick (uniform in [-m, +m])
pub const DEFAULT_DRIFT_MAGNITUDE: f64 = 1.0;

/// Default idle band lower edge
pub const DEFAULT_IDLE_MIN: f64 = 2.0;

/// Default idle band upper edge
pub const DEFAULT_IDLE_MAX: f64 = 15.0;

/// Default number of scores kept in a history
pub const DEFAULT_HISTORY_LEN: usize = 600;
