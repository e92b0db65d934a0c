//! Errors raised while building engines and loading profiles
//!
//! Scoring itself never fails; only configuration can.

use thiserror::Error;

/// Errors from engine construction and profile loading
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Duplicate channel id: {0}")]
    DuplicateChannel(String),

    #[error("Keyword pattern error: {0}")]
    Keyword(#[from] regex::Error),

    #[error("Profile parse error: {0}")]
    ProfileParse(#[from] toml::de::Error),

    #[error("Observation parse error: {0}")]
    ObservationParse(#[from] serde_json::Error),

    #[error("Profile I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),
}
