//! Monitor
//!
//! Owns one scoring engine and the sources that feed it:
//! - An observation tick polls every live source
//! - A drift tick applies passive drift when nothing acute happened
//! - Both ticks share one task, so engine calls never overlap
//! - Every produced snapshot becomes a [`Reading`] and enters the history

use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use careaid_core::{EngineConfig, ScoreHistory, ScoreSnapshot, ScoringEngine, DEFAULT_HISTORY_LEN};
use careaid_sensors::{SensorError, SignalSource};

use crate::{Reading, ReadingOrigin};

/// Default observation tick in milliseconds (one classifier window)
pub const DEFAULT_OBSERVE_INTERVAL_MS: u64 = 1000;

/// Observation ticks between init retries for a source that is not ready
pub const DEFAULT_INIT_RETRY_TICKS: u64 = 10;

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Engine to build
    pub engine: EngineConfig,
    /// Observation tick interval in milliseconds
    pub observe_interval_ms: u64,
    /// Drift tick interval; `None` uses the engine profile's interval
    pub drift_interval_ms: Option<u64>,
    /// Maximum runtime in seconds (0 = unlimited)
    pub max_runtime_secs: u64,
    /// Stop after this many observation ticks
    pub max_ticks: Option<u64>,
    /// Scores kept in the history
    pub history_len: usize,
    /// Seed for the drift RNG; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Stop once every source reports exhaustion
    pub stop_when_exhausted: bool,
    /// Retry `init` on a not-ready source every this many observation ticks
    pub init_retry_ticks: u64,
}

impl MonitorConfig {
    pub fn new(engine: EngineConfig) -> Self {
        Self {
            engine,
            observe_interval_ms: DEFAULT_OBSERVE_INTERVAL_MS,
            drift_interval_ms: None,
            max_runtime_secs: 0,
            max_ticks: None,
            history_len: DEFAULT_HISTORY_LEN,
            seed: None,
            stop_when_exhausted: true,
            init_retry_ticks: DEFAULT_INIT_RETRY_TICKS,
        }
    }
}

/// Monitor statistics
#[derive(Debug, Clone)]
pub struct MonitorStats {
    pub session: Uuid,
    pub readings: u64,
    pub observe_ticks: u64,
    pub drift_ticks: u64,
    pub drifts_skipped: u64,
    pub source_errors: u64,
    /// Polls answered with "not ready"
    pub not_ready_polls: u64,
    pub peak_score: Option<u8>,
    pub mean_score: Option<f64>,
    pub last: ScoreSnapshot,
}

struct SourceSlot {
    source: Box<dyn SignalSource>,
    exhausted: bool,
    /// Observation tick at which the source started reporting not ready
    not_ready_since: Option<u64>,
}

/// The monitor runtime
pub struct Monitor {
    session: Uuid,
    engine: ScoringEngine,
    sources: Vec<SourceSlot>,
    rng: StdRng,
    history: ScoreHistory,
    observe_interval_ms: u64,
    drift_interval_ms: u64,
    max_runtime_secs: u64,
    max_ticks: Option<u64>,
    stop_when_exhausted: bool,
    init_retry_ticks: u64,
    sequence: u64,
    observe_ticks: u64,
    drift_ticks: u64,
    drifts_skipped: u64,
    source_errors: u64,
    not_ready_polls: u64,
}

impl Monitor {
    /// Create a new monitor with configuration
    pub fn new(config: MonitorConfig) -> Result<Self, anyhow::Error> {
        let engine = ScoringEngine::new(&config.engine)?;

        if config.observe_interval_ms == 0 {
            anyhow::bail!("observation interval must be positive");
        }
        let drift_interval_ms = config
            .drift_interval_ms
            .unwrap_or(engine.drift_settings().interval_ms);
        if drift_interval_ms == 0 {
            anyhow::bail!("drift interval must be positive");
        }
        if config.init_retry_ticks == 0 {
            anyhow::bail!("init retry interval must be positive");
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let session = Uuid::new_v4();
        info!(
            "Monitor {} using profile {} ({})",
            session,
            engine.name(),
            engine.policy().name()
        );

        Ok(Self {
            session,
            engine,
            sources: Vec::new(),
            rng,
            history: ScoreHistory::new(config.history_len),
            observe_interval_ms: config.observe_interval_ms,
            drift_interval_ms,
            max_runtime_secs: config.max_runtime_secs,
            max_ticks: config.max_ticks,
            stop_when_exhausted: config.stop_when_exhausted,
            init_retry_ticks: config.init_retry_ticks,
            sequence: 0,
            observe_ticks: 0,
            drift_ticks: 0,
            drifts_skipped: 0,
            source_errors: 0,
            not_ready_polls: 0,
        })
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn history(&self) -> &ScoreHistory {
        &self.history
    }

    /// Attach a source; it is polled on every observation tick.
    /// A source that is not ready gets its `init` retried periodically.
    pub fn add_source(&mut self, source: Box<dyn SignalSource>) {
        info!("Attached {} source {}", source.kind(), source.id());
        self.sources.push(SourceSlot {
            source,
            exhausted: false,
            not_ready_since: None,
        });
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// True when at least one source exists and all of them are exhausted
    pub fn all_sources_exhausted(&self) -> bool {
        !self.sources.is_empty() && self.sources.iter().all(|s| s.exhausted)
    }

    fn record(&mut self, origin: ReadingOrigin, snapshot: ScoreSnapshot) -> Reading {
        self.sequence += 1;
        self.history.push(snapshot.aggregate_score);
        Reading {
            session: self.session,
            sequence: self.sequence,
            at: Utc::now(),
            origin,
            snapshot,
        }
    }

    /// Set one channel directly
    pub fn update_channel(&mut self, channel_id: &str, intensity: f64) -> Reading {
        if self.engine.channel(channel_id).is_none() {
            debug!("Ignoring update for unknown channel {}", channel_id);
        }
        let snapshot = self.engine.ingest_channel_update(channel_id, intensity);
        self.record(ReadingOrigin::Direct, snapshot)
    }

    /// Bump one channel
    pub fn boost(&mut self, channel_id: &str, amount: f64) -> Reading {
        if self.engine.channel(channel_id).is_none() {
            debug!("Ignoring boost for unknown channel {}", channel_id);
        }
        let snapshot = self.engine.apply_boost(channel_id, amount);
        self.record(ReadingOrigin::Direct, snapshot)
    }

    /// Change the situational context multiplier
    pub fn set_context_multiplier(&mut self, multiplier: f64) -> Reading {
        self.engine.set_context_multiplier(multiplier);
        let snapshot = self.engine.snapshot();
        self.record(ReadingOrigin::Direct, snapshot)
    }

    /// One observation tick: poll every live source once
    pub async fn poll_sources(&mut self) -> Vec<Reading> {
        self.observe_ticks += 1;
        let mut produced = Vec::new();

        for slot in self.sources.iter_mut().filter(|s| !s.exhausted) {
            match slot.source.poll(&mut self.engine).await {
                Ok(snapshot) => {
                    slot.not_ready_since = None;
                    produced.push((
                        ReadingOrigin::Source {
                            id: slot.source.id().to_string(),
                            kind: slot.source.kind().to_string(),
                        },
                        snapshot,
                    ));
                }
                Err(SensorError::NoWork) => {
                    // Normal - nothing new this tick
                }
                Err(SensorError::NotReady(msg)) => {
                    self.not_ready_polls += 1;
                    let since = *slot.not_ready_since.get_or_insert(self.observe_ticks);
                    let waited = self.observe_ticks - since;
                    if waited == 0 {
                        warn!("Source {} not ready: {}", slot.source.id(), msg);
                    } else if waited % self.init_retry_ticks == 0 {
                        match slot.source.init().await {
                            Ok(()) => {
                                info!("Source {} ready after retry", slot.source.id());
                                slot.not_ready_since = None;
                            }
                            Err(e) => warn!("Source {} still not ready: {}", slot.source.id(), e),
                        }
                    }
                }
                Err(SensorError::Exhausted) => {
                    info!("Source {} exhausted", slot.source.id());
                    slot.exhausted = true;
                }
                Err(e) => {
                    self.source_errors += 1;
                    error!("Source {} error: {}", slot.source.id(), e);
                }
            }
        }

        produced
            .into_iter()
            .map(|(origin, snapshot)| self.record(origin, snapshot))
            .collect()
    }

    /// One drift tick; `None` when acute input suppressed it
    pub fn drift_tick(&mut self) -> Option<Reading> {
        self.drift_ticks += 1;
        let tick = self.engine.passive_drift(&mut self.rng);

        if tick.drifted {
            Some(self.record(ReadingOrigin::Drift, tick.snapshot))
        } else {
            self.drifts_skipped += 1;
            debug!("Drift skipped after acute input");
            None
        }
    }

    /// Run both ticks until a stop condition is met, then release sources
    pub async fn run<F>(&mut self, mut on_reading: F) -> Result<MonitorStats, anyhow::Error>
    where
        F: FnMut(&Reading),
    {
        let mut observe = interval(Duration::from_millis(self.observe_interval_ms));
        observe.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut drift = interval(Duration::from_millis(self.drift_interval_ms));
        drift.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let start = Instant::now();
        let max_runtime = if self.max_runtime_secs > 0 {
            Some(Duration::from_secs(self.max_runtime_secs))
        } else {
            None
        };
        let ticks_at_start = self.observe_ticks;

        info!(
            "Monitor starting with {} sources (observe {}ms, drift {}ms)",
            self.sources.len(),
            self.observe_interval_ms,
            self.drift_interval_ms
        );

        loop {
            tokio::select! {
                _ = observe.tick() => {
                    if max_runtime.is_some_and(|max| start.elapsed() >= max) {
                        warn!("Monitor reached maximum runtime");
                        break;
                    }

                    for reading in self.poll_sources().await {
                        on_reading(&reading);
                    }

                    if self.stop_when_exhausted && self.all_sources_exhausted() {
                        info!("All sources exhausted");
                        break;
                    }

                    if self
                        .max_ticks
                        .is_some_and(|max| self.observe_ticks - ticks_at_start >= max)
                    {
                        debug!("Monitor reached tick limit");
                        break;
                    }
                }
                _ = drift.tick() => {
                    if let Some(reading) = self.drift_tick() {
                        on_reading(&reading);
                    }
                }
            }
        }

        self.shutdown();
        Ok(self.stats())
    }

    /// Release every source
    pub fn shutdown(&mut self) {
        for slot in &mut self.sources {
            slot.source.shutdown();
        }
        info!("Monitor {} stopped", self.session);
    }

    /// Get monitor statistics
    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            session: self.session,
            readings: self.sequence,
            observe_ticks: self.observe_ticks,
            drift_ticks: self.drift_ticks,
            drifts_skipped: self.drifts_skipped,
            source_errors: self.source_errors,
            not_ready_polls: self.not_ready_polls,
            peak_score: self.history.peak(),
            mean_score: self.history.mean(),
            last: self.engine.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careaid_core::{Classification, ProfileRegistry, Tier};
    use careaid_sensors::{
        create_replay_classifier, AcousticSource, ReplayClassifier, SilentCapture, SourceConfig,
        SyntheticConfig, SyntheticSource, WINDOW_SAMPLES,
    };
    use std::sync::Arc;

    fn config(profile: &str) -> MonitorConfig {
        let registry = ProfileRegistry::load_embedded();
        let mut config = MonitorConfig::new(registry.require(profile).unwrap().clone());
        config.seed = Some(11);
        config
    }

    async fn replay_source(batches: Vec<Vec<Classification>>) -> AcousticSource {
        let classifier = Arc::new(ReplayClassifier::from_batches(batches));
        let mut source = AcousticSource::new(SourceConfig::default().with_id("replay"), classifier)
            .with_capture(Box::new(SilentCapture::new(WINDOW_SAMPLES)));
        source.init().await.unwrap();
        source
    }

    #[test]
    fn test_monitor_creation() {
        let monitor = Monitor::new(config("micro-signals")).unwrap();
        assert_eq!(monitor.source_count(), 0);
        assert!(!monitor.all_sources_exhausted());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = config("micro-signals");
        config.observe_interval_ms = 0;
        assert!(Monitor::new(config).is_err());
    }

    #[test]
    fn test_direct_updates_produce_readings() {
        let mut monitor = Monitor::new(config("micro-signals")).unwrap();
        monitor.update_channel("microExpressions", 50.0);
        let reading = monitor.update_channel("bodyMicroBehavior", 40.0);
        let reading_after = monitor.update_channel("vocalMicroSounds", 0.0);

        assert_eq!(reading.origin, ReadingOrigin::Direct);
        assert_eq!(reading.sequence, 2);
        assert_eq!(reading_after.snapshot.aggregate_score, 32);
        assert_eq!(reading_after.snapshot.tier, Tier::Anomaly);
        assert_eq!(monitor.history().len(), 3);
    }

    #[test]
    fn test_drift_suppressed_after_boost() {
        let mut monitor = Monitor::new(config("micro-signals")).unwrap();
        monitor.boost("vocalMicroSounds", 70.0);

        assert!(monitor.drift_tick().is_none());
        let reading = monitor.drift_tick().unwrap();
        assert_eq!(reading.origin, ReadingOrigin::Drift);
        assert!(reading.snapshot.channel("vocalMicroSounds").unwrap() <= 15.0);

        let stats = monitor.stats();
        assert_eq!(stats.drift_ticks, 2);
        assert_eq!(stats.drifts_skipped, 1);
    }

    #[test]
    fn test_seeded_drift_is_reproducible() {
        let mut a = Monitor::new(config("micro-signals")).unwrap();
        let mut b = Monitor::new(config("micro-signals")).unwrap();
        for _ in 0..20 {
            let ra = a.drift_tick().map(|r| r.snapshot);
            let rb = b.drift_tick().map(|r| r.snapshot);
            assert_eq!(ra, rb);
        }
    }

    #[tokio::test]
    async fn test_poll_sources_ingests_observations() {
        let mut monitor = Monitor::new(config("acoustic")).unwrap();
        monitor.add_source(Box::new(
            replay_source(vec![vec![Classification::new("Explosion", 0.88)]]).await,
        ));

        let readings = monitor.poll_sources().await;
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].snapshot.aggregate_score, 88);
        assert_eq!(readings[0].snapshot.tier, Tier::Critical);
        assert!(matches!(
            &readings[0].origin,
            ReadingOrigin::Source { kind, .. } if kind == "acoustic"
        ));

        assert!(monitor.poll_sources().await.is_empty());
        assert!(monitor.all_sources_exhausted());
    }

    #[tokio::test]
    async fn test_not_ready_source_is_retried() {
        let path = std::env::temp_dir().join(format!("careaid-{}.jsonl", Uuid::new_v4()));
        let mut source = AcousticSource::new(
            SourceConfig::default().with_id("late"),
            create_replay_classifier(&path),
        )
        .with_capture(Box::new(SilentCapture::new(WINDOW_SAMPLES)));
        assert!(source.init().await.is_err());

        let mut config = config("acoustic");
        config.init_retry_ticks = 2;
        let mut monitor = Monitor::new(config).unwrap();
        monitor.add_source(Box::new(source));

        // Not ready on ticks 1 and 2; the file appears before the retry on tick 3
        assert!(monitor.poll_sources().await.is_empty());
        assert!(monitor.poll_sources().await.is_empty());
        std::fs::write(&path, "[{\"label\":\"Glass\",\"score\":0.6}]\n").unwrap();
        assert!(monitor.poll_sources().await.is_empty());

        let readings = monitor.poll_sources().await;
        std::fs::remove_file(&path).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].snapshot.aggregate_score, 60);
        assert_eq!(monitor.stats().not_ready_polls, 3);
    }

    #[test]
    fn test_zero_retry_interval_rejected() {
        let mut config = config("acoustic");
        config.init_retry_ticks = 0;
        assert!(Monitor::new(config).is_err());
    }

    #[tokio::test]
    async fn test_run_stops_when_replay_exhausted() {
        let mut config = config("acoustic");
        config.observe_interval_ms = 5;
        config.drift_interval_ms = Some(60_000);
        let mut monitor = Monitor::new(config).unwrap();
        monitor.add_source(Box::new(
            replay_source(vec![
                vec![Classification::new("Speech", 0.9)],
                vec![Classification::new("Screaming", 0.6)],
                vec![Classification::new("Smash, crash", 0.95)],
            ])
            .await,
        ));

        let mut scores = Vec::new();
        let stats = monitor
            .run(|reading| {
                if matches!(reading.origin, ReadingOrigin::Source { .. }) {
                    scores.push(reading.snapshot.aggregate_score);
                }
            })
            .await
            .unwrap();

        assert_eq!(scores, vec![0, 48, 95]);
        assert_eq!(stats.observe_ticks, 4);
        assert_eq!(stats.peak_score, Some(95));
    }

    #[tokio::test]
    async fn test_run_respects_tick_limit() {
        let mut config = config("micro-signals");
        config.observe_interval_ms = 2;
        config.drift_interval_ms = Some(3);
        config.max_ticks = Some(10);
        let mut monitor = Monitor::new(config).unwrap();
        let source = SyntheticSource::new(
            SourceConfig::default().with_id("synthetic"),
            SyntheticConfig {
                event_probability: 0.3,
                seed: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        monitor.add_source(Box::new(source));

        let mut seen = 0u64;
        let stats = monitor.run(|_| seen += 1).await.unwrap();

        assert_eq!(stats.observe_ticks, 10);
        assert_eq!(stats.readings, seen);
        assert!(stats.last.aggregate_score <= 100);
    }
}
