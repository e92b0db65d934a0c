//! Aggregate combination policies
//!
//! An engine picks one policy at construction and keeps it:
//! - `PriorityMax`: the strongest weighted channel wins outright, so an
//!   impulse event dominates regardless of what else is present
//! - `WeightedSum`: linear blend of weighted channels scaled by a context
//!   multiplier

use serde::{Deserialize, Serialize};

use crate::{clamp_value, Channel, MAX_SCORE, MIN_SCORE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CombinationPolicy {
    /// score = max(value_i * weight_i)
    #[default]
    PriorityMax,
    /// score = sum(value_i * weight_i) * context_multiplier
    WeightedSum,
}

impl CombinationPolicy {
    /// Combine channel values into a bounded integer score.
    /// `context_multiplier` only applies to `WeightedSum`.
    pub fn combine(&self, channels: &[Channel], context_multiplier: f64) -> u8 {
        let raw = match self {
            CombinationPolicy::PriorityMax => channels
                .iter()
                .map(Channel::contribution)
                .fold(MIN_SCORE, f64::max),
            CombinationPolicy::WeightedSum => {
                channels.iter().map(Channel::contribution).sum::<f64>() * context_multiplier
            }
        };
        to_score(raw)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CombinationPolicy::PriorityMax => "priority_max",
            CombinationPolicy::WeightedSum => "weighted_sum",
        }
    }
}

/// Clamp to [0, 100] and round to the nearest integer
pub fn to_score(raw: f64) -> u8 {
    clamp_value(raw, MIN_SCORE, MAX_SCORE).round() as u8
}
