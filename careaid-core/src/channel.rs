//! Signal channels
//!
//! A channel is one named source of intensity (vocal distress, impulse
//! events, micro-expressions, ...). Values live in [0, 100] and, during
//! passive drift, inside the channel's idle band.

use serde::{Deserialize, Serialize};

use crate::{CoreError, KeywordMatcher, DEFAULT_IDLE_MAX, DEFAULT_IDLE_MIN, MAX_SCORE, MIN_SCORE};

/// Clamp a value into [min, max], mapping NaN to `min`
pub fn clamp_value(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Inclusive [min, max] range a channel value is held within
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// The full score range [0, 100]
    pub const fn full() -> Self {
        Self::new(MIN_SCORE, MAX_SCORE)
    }

    /// The default idle band [2, 15]
    pub const fn idle() -> Self {
        Self::new(DEFAULT_IDLE_MIN, DEFAULT_IDLE_MAX)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        clamp_value(value, self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// A band must be finite, ordered and inside [0, 100]
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(CoreError::InvalidConfig(format!(
                "band [{}, {}] must be finite",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(CoreError::InvalidConfig(format!(
                "band [{}, {}] has min above max",
                self.min, self.max
            )));
        }
        if self.min < MIN_SCORE || self.max > MAX_SCORE {
            return Err(CoreError::InvalidConfig(format!(
                "band [{}, {}] leaves the 0-100 range",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

impl Default for Band {
    fn default() -> Self {
        Self::idle()
    }
}

/// Declarative description of a channel, as found in profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Stable identifier
    pub id: String,
    /// Contribution factor in [0, 1]
    pub weight: f64,
    /// Case-insensitive label fragments matched in observation mode
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Starting value, also restored on reset
    #[serde(default)]
    pub initial: f64,
    /// Per-channel idle band; falls back to the engine drift band
    #[serde(default)]
    pub idle_band: Option<Band>,
}

impl ChannelSpec {
    pub fn new(id: &str, weight: f64) -> Self {
        Self {
            id: id.to_string(),
            weight,
            keywords: Vec::new(),
            initial: 0.0,
            idle_band: None,
        }
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_initial(mut self, initial: f64) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_idle_band(mut self, band: Band) -> Self {
        self.idle_band = Some(band);
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.id.trim().is_empty() {
            return Err(CoreError::InvalidConfig("channel id is empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(CoreError::InvalidConfig(format!(
                "channel {} weight {} outside [0, 1]",
                self.id, self.weight
            )));
        }
        if let Some(band) = &self.idle_band {
            band.validate()?;
        }
        Ok(())
    }
}

/// A live channel inside an engine
#[derive(Debug, Clone)]
pub struct Channel {
    id: String,
    value: f64,
    initial: f64,
    weight: f64,
    idle_band: Band,
    matcher: Option<KeywordMatcher>,
}

impl Channel {
    /// Build a channel from its spec, using `default_idle` when the spec has no band
    pub fn from_spec(spec: &ChannelSpec, default_idle: Band) -> Result<Self, CoreError> {
        spec.validate()?;

        let matcher = if spec.keywords.is_empty() {
            None
        } else {
            Some(KeywordMatcher::new(&spec.keywords)?)
        };
        let initial = Band::full().clamp(spec.initial);

        Ok(Self {
            id: spec.id.clone(),
            value: initial,
            initial,
            weight: spec.weight,
            idle_band: spec.idle_band.unwrap_or(default_idle),
            matcher,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn idle_band(&self) -> Band {
        self.idle_band
    }

    pub fn matcher(&self) -> Option<&KeywordMatcher> {
        self.matcher.as_ref()
    }

    /// Weighted contribution of the current value
    pub fn contribution(&self) -> f64 {
        self.value * self.weight
    }

    /// Replace the value, clamped to [0, 100]
    pub fn set(&mut self, intensity: f64) {
        self.value = Band::full().clamp(intensity);
    }

    /// Additive bump, clamped to [0, 100]
    pub fn boost(&mut self, amount: f64) {
        let amount = if amount.is_nan() { 0.0 } else { amount };
        self.set(self.value + amount);
    }

    /// Nudge by `delta` and hold the result inside the idle band
    pub fn drift(&mut self, delta: f64) {
        self.value = self.idle_band.clamp(self.value + delta);
    }

    pub fn reset(&mut self) {
        self.value = self.initial;
    }
}
