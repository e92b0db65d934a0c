//! Synthetic Source
//!
//! Simulates acute events when no live sensor is attached: on each poll an
//! event fires with a fixed probability and boosts one channel. Seeded, so a
//! run can be replayed exactly.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use careaid_core::{ScoreSnapshot, ScoringEngine};

use crate::{SensorError, SignalSource, SourceConfig};

/// Parameters for synthetic acute events
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Chance that a poll produces an event, in [0, 1]
    pub event_probability: f64,
    /// Smallest boost applied by an event
    pub boost_min: f64,
    /// Largest boost applied by an event
    pub boost_max: f64,
    /// Channels eligible for events; empty means every engine channel.
    /// Ids the engine does not have are never picked.
    pub channels: Vec<String>,
    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            event_probability: 0.15,
            boost_min: 20.0,
            boost_max: 60.0,
            channels: Vec::new(),
            seed: None,
        }
    }
}

impl SyntheticConfig {
    pub fn validate(&self) -> Result<(), SensorError> {
        if !(0.0..=1.0).contains(&self.event_probability) {
            return Err(SensorError::Config(format!(
                "event probability {} outside [0, 1]",
                self.event_probability
            )));
        }
        if !self.boost_min.is_finite() || !self.boost_max.is_finite() {
            return Err(SensorError::Config("boost range must be finite".to_string()));
        }
        if self.boost_min > self.boost_max {
            return Err(SensorError::Config(format!(
                "boost range [{}, {}] is inverted",
                self.boost_min, self.boost_max
            )));
        }
        Ok(())
    }
}

/// Synthetic source - random acute boosts
pub struct SyntheticSource {
    config: SourceConfig,
    synthetic: SyntheticConfig,
    rng: StdRng,
    events: u64,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig, synthetic: SyntheticConfig) -> Result<Self, SensorError> {
        synthetic.validate()?;
        let rng = match synthetic.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            synthetic,
            rng,
            events: 0,
        })
    }

    pub fn events(&self) -> u64 {
        self.events
    }

    fn pick_channel(&mut self, engine: &ScoringEngine) -> Option<String> {
        let candidates: Vec<&str> = if self.synthetic.channels.is_empty() {
            engine.channels().iter().map(|c| c.id()).collect()
        } else {
            self.synthetic
                .channels
                .iter()
                .map(|s| s.as_str())
                .filter(|id| engine.channel(id).is_some())
                .collect()
        };

        if candidates.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..candidates.len());
        Some(candidates[idx].to_string())
    }
}

#[async_trait]
impl SignalSource for SyntheticSource {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn kind(&self) -> &str {
        "synthetic"
    }

    async fn poll(&mut self, engine: &mut ScoringEngine) -> Result<ScoreSnapshot, SensorError> {
        if !self.rng.gen_bool(self.synthetic.event_probability) {
            return Err(SensorError::NoWork);
        }

        let channel = self.pick_channel(engine).ok_or(SensorError::NoWork)?;
        let amount = self
            .rng
            .gen_range(self.synthetic.boost_min..=self.synthetic.boost_max);

        self.events += 1;
        let snapshot = engine.apply_boost(&channel, amount);
        info!(
            "Synthetic event on {}: +{:.1} -> score {} ({})",
            channel, amount, snapshot.aggregate_score, snapshot.tier
        );

        Ok(snapshot)
    }
}
