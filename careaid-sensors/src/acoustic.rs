//! Acoustic Source
//!
//! Feeds classifier observations into the engine.
//! - Accumulates raw samples into one-second windows
//! - Classifies one pending window per poll
//! - Produces nothing until the classifier has loaded

use async_trait::async_trait;
use std::collections::VecDeque;
use tracing::{debug, error, info};

use careaid_core::{ScoreSnapshot, ScoringEngine};

use crate::{
    ClassifierError, SampleCapture, SampleWindow, SensorError, SharedClassifier, SignalSource,
    SourceConfig,
};

/// Classifier lifecycle as seen by the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceState {
    Unloaded,
    Ready,
    LoadFailed(String),
}

/// Acoustic source - runs an audio classifier over windowed samples
pub struct AcousticSource {
    config: SourceConfig,
    classifier: SharedClassifier,
    capture: Option<Box<dyn SampleCapture>>,
    window: SampleWindow,
    pending: VecDeque<Vec<f32>>,
    state: SourceState,
    windows_classified: u64,
}

impl AcousticSource {
    pub fn new(config: SourceConfig, classifier: SharedClassifier) -> Self {
        Self {
            config,
            classifier,
            capture: None,
            window: SampleWindow::default(),
            pending: VecDeque::new(),
            state: SourceState::Unloaded,
            windows_classified: 0,
        }
    }

    /// Pull samples from `capture` on every poll
    pub fn with_capture(mut self, capture: Box<dyn SampleCapture>) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn with_window(mut self, window: SampleWindow) -> Self {
        self.window = window;
        self
    }

    pub fn state(&self) -> &SourceState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SourceState::Ready
    }

    pub fn windows_classified(&self) -> u64 {
        self.windows_classified
    }

    pub fn pending_windows(&self) -> usize {
        self.pending.len()
    }

    /// Queue raw samples; returns the number of complete windows now pending
    pub fn feed(&mut self, samples: &[f32]) -> usize {
        let windows = self.window.push(samples);
        self.pending.extend(windows);
        self.pending.len()
    }
}

#[async_trait]
impl SignalSource for AcousticSource {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn kind(&self) -> &str {
        "acoustic"
    }

    /// Load the classifier. Safe to call again after a failure.
    async fn init(&mut self) -> Result<(), SensorError> {
        info!("Loading classifier {}", self.classifier.model_name());

        match self.classifier.load().await {
            Ok(()) => {
                self.state = SourceState::Ready;
                if let Some(capture) = self.capture.as_mut() {
                    capture.start();
                }
                info!("Classifier {} ready", self.classifier.model_name());
                Ok(())
            }
            Err(e) => {
                error!("Classifier {} failed to load: {}", self.classifier.model_name(), e);
                self.state = SourceState::LoadFailed(e.to_string());
                Err(SensorError::Classifier(e))
            }
        }
    }

    async fn poll(&mut self, engine: &mut ScoringEngine) -> Result<ScoreSnapshot, SensorError> {
        match &self.state {
            SourceState::Ready => {}
            SourceState::Unloaded => {
                return Err(SensorError::NotReady("classifier not loaded".to_string()))
            }
            SourceState::LoadFailed(reason) => return Err(SensorError::NotReady(reason.clone())),
        }

        if let Some(capture) = self.capture.as_mut() {
            let samples = capture.read();
            if !samples.is_empty() {
                let windows = self.window.push(&samples);
                self.pending.extend(windows);
            }
        }

        let Some(window) = self.pending.pop_front() else {
            return Err(SensorError::NoWork);
        };

        let observations = match self.classifier.classify(&window).await {
            Ok(observations) => observations,
            Err(ClassifierError::Exhausted) => return Err(SensorError::Exhausted),
            Err(e) => return Err(SensorError::Classifier(e)),
        };

        self.windows_classified += 1;
        let snapshot = engine.ingest_observation(&observations);
        debug!(
            "Window {} classified: score {} ({})",
            self.windows_classified, snapshot.aggregate_score, snapshot.tier
        );

        Ok(snapshot)
    }

    fn shutdown(&mut self) {
        if let Some(capture) = self.capture.as_mut() {
            capture.stop();
        }
        self.window.clear();
        self.pending.clear();
        info!("Acoustic source {} released", self.config.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ReplayClassifier, SilentCapture, AudioClassifier, WINDOW_SAMPLES};
    use careaid_core::{Classification, ProfileRegistry, Tier};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn engine() -> ScoringEngine {
        let registry = ProfileRegistry::load_embedded();
        ScoringEngine::new(registry.require("acoustic").unwrap()).unwrap()
    }

    /// Fails the first `failures` loads, then succeeds
    struct FlakyClassifier {
        failures: u32,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl AudioClassifier for FlakyClassifier {
        async fn load(&self) -> Result<(), ClassifierError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                Err(ClassifierError::Load("network unreachable".to_string()))
            } else {
                Ok(())
            }
        }

        async fn classify(&self, _window: &[f32]) -> Result<Vec<Classification>, ClassifierError> {
            Ok(vec![Classification::new("Glass", 0.75)])
        }

        fn model_name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_poll_before_init_is_not_ready() {
        let classifier = Arc::new(ReplayClassifier::from_batches(vec![]));
        let mut source = AcousticSource::new(SourceConfig::default(), classifier);
        let mut engine = engine();

        source.feed(&vec![0.0; WINDOW_SAMPLES]);
        assert!(matches!(
            source.poll(&mut engine).await,
            Err(SensorError::NotReady(_))
        ));
    }

    #[tokio::test]
    async fn test_load_failure_then_retry() {
        let classifier = Arc::new(FlakyClassifier {
            failures: 1,
            attempts: AtomicU32::new(0),
        });
        let mut source = AcousticSource::new(SourceConfig::default().with_id("mic"), classifier);
        let mut engine = engine();

        assert!(source.init().await.is_err());
        assert!(matches!(source.state(), SourceState::LoadFailed(_)));

        source.feed(&vec![0.0; WINDOW_SAMPLES]);
        assert!(matches!(
            source.poll(&mut engine).await,
            Err(SensorError::NotReady(_))
        ));

        source.init().await.unwrap();
        assert!(source.is_ready());

        let snapshot = source.poll(&mut engine).await.unwrap();
        assert_eq!(snapshot.channel("impulse"), Some(75.0));
        assert_eq!(snapshot.tier, Tier::Critical);
    }

    #[tokio::test]
    async fn test_no_pending_window_is_no_work() {
        let classifier = Arc::new(ReplayClassifier::from_batches(vec![vec![]]));
        let mut source = AcousticSource::new(SourceConfig::default(), classifier);
        let mut engine = engine();
        source.init().await.unwrap();

        source.feed(&vec![0.0; WINDOW_SAMPLES / 2]);
        assert!(matches!(source.poll(&mut engine).await, Err(SensorError::NoWork)));
    }

    #[tokio::test]
    async fn test_capture_feeds_replay_until_exhausted() {
        let classifier = Arc::new(ReplayClassifier::from_batches(vec![
            vec![Classification::new("Screaming", 0.5)],
            vec![Classification::new("Speech", 0.9)],
        ]));
        let mut source = AcousticSource::new(SourceConfig::default(), classifier)
            .with_capture(Box::new(SilentCapture::new(WINDOW_SAMPLES)));
        let mut engine = engine();
        source.init().await.unwrap();

        let first = source.poll(&mut engine).await.unwrap();
        assert_eq!(first.aggregate_score, 40);
        assert_eq!(first.top_label.as_deref(), Some("Screaming"));

        let second = source.poll(&mut engine).await.unwrap();
        assert_eq!(second.aggregate_score, 0);
        assert_eq!(source.windows_classified(), 2);

        assert!(matches!(source.poll(&mut engine).await, Err(SensorError::Exhausted)));
    }

    #[tokio::test]
    async fn test_shutdown_releases_buffers() {
        let classifier = Arc::new(ReplayClassifier::from_batches(vec![]));
        let mut source = AcousticSource::new(SourceConfig::default(), classifier);
        source.feed(&vec![0.0; WINDOW_SAMPLES * 3]);
        assert_eq!(source.pending_windows(), 3);

        source.shutdown();
        assert_eq!(source.pending_windows(), 0);
    }
}
