//! Scoring Engine - owned channel state and the aggregate score
//!
//! The engine is the only place channel values change:
//! - Observations replace every channel value with its keyword peak
//! - Direct updates and boosts touch a single channel
//! - Passive drift nudges idle channels inside their idle band
//!
//! Every mutation returns a fresh [`ScoreSnapshot`]. Unknown channel ids are
//! ignored rather than reported.

use rand::Rng;

use crate::{
    observation, Channel, Classification, CombinationPolicy, CoreError, DriftSettings,
    EngineConfig, ScoreSnapshot, TierThresholds, MAX_SCORE,
};

/// Result of a passive drift tick
#[derive(Debug, Clone, PartialEq)]
pub struct DriftTick {
    /// False when acute input since the previous tick suppressed the drift
    pub drifted: bool,
    pub snapshot: ScoreSnapshot,
}

/// Signal scoring engine
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    name: String,
    channels: Vec<Channel>,
    policy: CombinationPolicy,
    thresholds: TierThresholds,
    context_multiplier: f64,
    drift: DriftSettings,
    top_label: Option<String>,
    acute_since_drift: bool,
}

impl ScoringEngine {
    /// Build an engine from a validated configuration
    pub fn new(config: &EngineConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let channels = config
            .channels
            .iter()
            .map(|spec| Channel::from_spec(spec, config.drift.idle_band))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: config.name.clone(),
            channels,
            policy: config.policy,
            thresholds: config.thresholds.resolve()?,
            context_multiplier: config.context_multiplier,
            drift: config.drift.clone(),
            top_label: None,
            acute_since_drift: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> CombinationPolicy {
        self.policy
    }

    pub fn thresholds(&self) -> TierThresholds {
        self.thresholds
    }

    pub fn drift_settings(&self) -> &DriftSettings {
        &self.drift
    }

    pub fn context_multiplier(&self) -> f64 {
        self.context_multiplier
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id() == id)
    }

    fn channel_mut(&mut self, id: &str) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.id() == id)
    }

    /// Set the situational vulnerability modifier (weighted sum only).
    /// Non-finite values fall back to 1.0, negatives to 0.
    pub fn set_context_multiplier(&mut self, multiplier: f64) {
        self.context_multiplier = if multiplier.is_finite() {
            multiplier.max(0.0)
        } else {
            1.0
        };
    }

    /// Current aggregate score
    pub fn aggregate_score(&self) -> u8 {
        self.policy.combine(&self.channels, self.context_multiplier)
    }

    /// Snapshot of the current state without mutating it
    pub fn snapshot(&self) -> ScoreSnapshot {
        let aggregate_score = self.aggregate_score();
        ScoreSnapshot {
            aggregate_score,
            tier: self.thresholds.classify(aggregate_score),
            per_channel: self
                .channels
                .iter()
                .map(|c| (c.id().to_string(), c.value()))
                .collect(),
            top_label: self.top_label.clone(),
        }
    }

    /// Map one classifier observation onto every channel.
    ///
    /// Each channel takes the peak confidence of its matching labels scaled to
    /// [0, 100]; channels without a match drop to 0.
    pub fn ingest_observation(&mut self, observations: &[Classification]) -> ScoreSnapshot {
        for channel in &mut self.channels {
            let peak = channel
                .matcher()
                .and_then(|m| m.peak_confidence(observations))
                .unwrap_or(0.0);
            channel.set(peak * MAX_SCORE);
        }

        self.top_label = observation::top_label(observations).map(str::to_string);
        self.acute_since_drift = true;
        self.snapshot()
    }

    /// Directly set one channel's intensity
    pub fn ingest_channel_update(&mut self, channel_id: &str, intensity: f64) -> ScoreSnapshot {
        if let Some(channel) = self.channel_mut(channel_id) {
            channel.set(intensity);
            self.acute_since_drift = true;
        }
        self.snapshot()
    }

    /// Additive bump to one channel, used for acute events
    pub fn apply_boost(&mut self, channel_id: &str, amount: f64) -> ScoreSnapshot {
        if let Some(channel) = self.channel_mut(channel_id) {
            channel.boost(amount);
            self.acute_since_drift = true;
        }
        self.snapshot()
    }

    /// One passive drift tick.
    ///
    /// Skipped (but re-armed) when acute input arrived since the previous
    /// tick; otherwise every channel moves by a uniform delta in
    /// [-magnitude, +magnitude] and is held inside its idle band, and the
    /// top label is dropped.
    pub fn passive_drift<R: Rng>(&mut self, rng: &mut R) -> DriftTick {
        if self.acute_since_drift {
            self.acute_since_drift = false;
            return DriftTick {
                drifted: false,
                snapshot: self.snapshot(),
            };
        }

        let magnitude = self.drift.magnitude;
        for channel in &mut self.channels {
            let delta = if magnitude > 0.0 {
                rng.gen_range(-magnitude..=magnitude)
            } else {
                0.0
            };
            channel.drift(delta);
        }
        // The last observation no longer drives the score
        self.top_label = None;

        DriftTick {
            drifted: true,
            snapshot: self.snapshot(),
        }
    }

    /// Restore initial channel values and forget the last observation
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
        self.top_label = None;
        self.acute_since_drift = false;
    }
}
