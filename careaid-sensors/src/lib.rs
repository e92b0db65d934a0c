//! Care-Aid Sensors
//!
//! Input sources that drive a scoring engine:
//! - **Acoustic**: windows raw audio, runs an opaque classifier, ingests observations
//! - **Replay**: a classifier that plays back recorded observations
//! - **Synthetic**: seeded random acute events for demos without live input
//!
//! Every source implements [`SignalSource`], so the runtime can poll them
//! uniformly.

pub mod acoustic;
pub mod capture;
pub mod classifier;
pub mod synthetic;
pub mod traits;
pub mod window;

pub use acoustic::*;
pub use capture::*;
pub use classifier::*;
pub use synthetic::*;
pub use traits::*;
pub use window::*;

/// Sample rate the classifier expects, in Hz
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Samples per classification window (one second of audio)
pub const WINDOW_SAMPLES: usize = SAMPLE_RATE_HZ as usize;
