//! Status tiers
//!
//! A tier is a pure function of the aggregate score: a monotonic threshold
//! ladder with no hysteresis. Thresholds are configuration because the
//! deployments disagree on where the bands sit.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CoreError;

/// Discrete status derived from the aggregate score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Calm / monitoring
    Calm,
    /// Anomaly detected
    Anomaly,
    /// Probable distress
    ProbableDistress,
    /// Immediate risk
    Critical,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Calm => "Calm",
            Tier::Anomaly => "Anomaly",
            Tier::ProbableDistress => "Probable Distress",
            Tier::Critical => "Critical",
        }
    }

    /// Operator-facing status line naming the top classifier label.
    /// Without a label the line is just the tier name.
    pub fn headline(&self, top_label: Option<&str>) -> String {
        let Some(label) = top_label else {
            return self.label().to_string();
        };
        match self {
            Tier::Calm => format!("Monitoring ambient noise (top: {})", label),
            Tier::Anomaly => format!("Anomaly detected: {}", label),
            Tier::ProbableDistress => {
                format!("PROBABLE THREAT: {} detected", label.to_uppercase())
            }
            Tier::Critical => format!("CRITICAL ALERT: {} CONFIRMED", label.to_uppercase()),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower edges of the three non-calm tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub anomaly: u8,
    pub probable: u8,
    pub critical: u8,
}

impl TierThresholds {
    /// 25 / 55 / 85
    pub const fn standard() -> Self {
        Self {
            anomaly: 25,
            probable: 55,
            critical: 85,
        }
    }

    /// 30 / 60 / 85
    pub const fn conservative() -> Self {
        Self {
            anomaly: 30,
            probable: 60,
            critical: 85,
        }
    }

    /// 10 / 40 / 70, used for live audio where scores run low
    pub const fn sensitive() -> Self {
        Self {
            anomaly: 10,
            probable: 40,
            critical: 70,
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            "conservative" => Some(Self::conservative()),
            "sensitive" => Some(Self::sensitive()),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let ordered = 0 < self.anomaly && self.anomaly < self.probable && self.probable < self.critical;
        if !ordered || self.critical > 100 {
            return Err(CoreError::InvalidConfig(format!(
                "tier thresholds {}/{}/{} must be strictly increasing within 1-100",
                self.anomaly, self.probable, self.critical
            )));
        }
        Ok(())
    }

    pub fn classify(&self, score: u8) -> Tier {
        if score >= self.critical {
            Tier::Critical
        } else if score >= self.probable {
            Tier::ProbableDistress
        } else if score >= self.anomaly {
            Tier::Anomaly
        } else {
            Tier::Calm
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self::standard()
    }
}
