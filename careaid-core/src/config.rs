//! Engine configuration
//!
//! Configurations are usually loaded from TOML profiles (see
//! [`crate::ProfileRegistry`]), but can be assembled in code as well.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{
    to_score, Band, ChannelSpec, CombinationPolicy, CoreError, TierThresholds,
    DEFAULT_DRIFT_INTERVAL_MS, DEFAULT_DRIFT_MAGNITUDE, MIN_SCORE,
};

/// Either a named preset or explicit threshold values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdSetting {
    Preset(String),
    Explicit(TierThresholds),
}

impl ThresholdSetting {
    pub fn resolve(&self) -> Result<TierThresholds, CoreError> {
        let thresholds = match self {
            ThresholdSetting::Preset(name) => TierThresholds::preset(name).ok_or_else(|| {
                CoreError::InvalidConfig(format!("unknown threshold preset: {}", name))
            })?,
            ThresholdSetting::Explicit(t) => *t,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }
}

impl Default for ThresholdSetting {
    fn default() -> Self {
        ThresholdSetting::Preset("standard".to_string())
    }
}

/// Passive drift parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftSettings {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_magnitude")]
    pub magnitude: f64,
    #[serde(default)]
    pub idle_band: Band,
}

fn default_interval_ms() -> u64 {
    DEFAULT_DRIFT_INTERVAL_MS
}

fn default_magnitude() -> f64 {
    DEFAULT_DRIFT_MAGNITUDE
}

fn default_context_multiplier() -> f64 {
    1.0
}

impl Default for DriftSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_DRIFT_INTERVAL_MS,
            magnitude: DEFAULT_DRIFT_MAGNITUDE,
            idle_band: Band::idle(),
        }
    }
}

impl DriftSettings {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.interval_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "drift interval must be positive".to_string(),
            ));
        }
        if !self.magnitude.is_finite() || self.magnitude < 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "drift magnitude {} must be finite and non-negative",
                self.magnitude
            )));
        }
        self.idle_band.validate()
    }
}

/// Full description of a scoring engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub policy: CombinationPolicy,
    #[serde(default = "default_context_multiplier")]
    pub context_multiplier: f64,
    #[serde(default)]
    pub thresholds: ThresholdSetting,
    #[serde(default)]
    pub drift: DriftSettings,
    pub channels: Vec<ChannelSpec>,
}

impl EngineConfig {
    pub fn new(name: &str, policy: CombinationPolicy) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            policy,
            context_multiplier: 1.0,
            thresholds: ThresholdSetting::default(),
            drift: DriftSettings::default(),
            channels: Vec::new(),
        }
    }

    pub fn with_channel(mut self, channel: ChannelSpec) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn with_thresholds(mut self, thresholds: TierThresholds) -> Self {
        self.thresholds = ThresholdSetting::Explicit(thresholds);
        self
    }

    pub fn with_drift(mut self, drift: DriftSettings) -> Self {
        self.drift = drift;
        self
    }

    /// Highest score passive drift alone can produce
    pub fn idle_ceiling(&self) -> u8 {
        let peaks = self
            .channels
            .iter()
            .map(|c| c.idle_band.unwrap_or(self.drift.idle_band).max * c.weight);
        let raw = match self.policy {
            CombinationPolicy::PriorityMax => peaks.fold(MIN_SCORE, f64::max),
            CombinationPolicy::WeightedSum => peaks.sum::<f64>() * self.context_multiplier,
        };
        to_score(raw)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.channels.is_empty() {
            return Err(CoreError::InvalidConfig(format!(
                "profile {} declares no channels",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for channel in &self.channels {
            channel.validate()?;
            if !seen.insert(channel.id.as_str()) {
                return Err(CoreError::DuplicateChannel(channel.id.clone()));
            }
        }

        if !self.context_multiplier.is_finite() || self.context_multiplier < 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "context multiplier {} must be finite and non-negative",
                self.context_multiplier
            )));
        }

        let thresholds = self.thresholds.resolve()?;
        self.drift.validate()?;

        // Drift is ambient noise and must stay in the calm tier
        let ceiling = self.idle_ceiling();
        if ceiling >= thresholds.anomaly {
            return Err(CoreError::InvalidConfig(format!(
                "profile {}: idle drift reaches score {}, at or above the anomaly threshold {}",
                self.name, ceiling, thresholds.anomaly
            )));
        }
        Ok(())
    }
}
