//! Score snapshots
//!
//! A snapshot is derived state, recomputed on every update and never
//! persisted. It carries no timestamp, so equal engine state always yields
//! equal snapshots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Tier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    /// Aggregate score in [0, 100]
    pub aggregate_score: u8,
    /// Tier derived from `aggregate_score`
    pub tier: Tier,
    /// Channel id -> current value
    pub per_channel: BTreeMap<String, f64>,
    /// Top-ranked label of the most recent observation
    pub top_label: Option<String>,
}

impl ScoreSnapshot {
    pub fn channel(&self, id: &str) -> Option<f64> {
        self.per_channel.get(id).copied()
    }

    pub fn headline(&self) -> String {
        self.tier.headline(self.top_label.as_deref())
    }
}
