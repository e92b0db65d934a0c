//! Readings - timestamped snapshots emitted by the monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use careaid_core::ScoreSnapshot;

/// What produced a reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReadingOrigin {
    /// A polled source (acoustic, synthetic, ...)
    Source { id: String, kind: String },
    /// A passive drift tick
    Drift,
    /// A direct channel update, boost or context change from the caller
    Direct,
}

/// A snapshot with session, ordering and time attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub session: Uuid,
    /// Monotonic per-session counter, starting at 1
    pub sequence: u64,
    pub at: DateTime<Utc>,
    pub origin: ReadingOrigin,
    pub snapshot: ScoreSnapshot,
}

impl Reading {
    pub fn headline(&self) -> String {
        self.snapshot.headline()
    }

    /// Single-line JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
