//! Audio classifier abstraction
//!
//! The classifier is an opaque black box: it loads once and turns a window of
//! raw samples into a ranked list of (label, confidence) pairs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use careaid_core::{parse_observation_line, Classification};

/// Classifier errors
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Model load failed: {0}")]
    Load(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("No more observations")]
    Exhausted,
}

/// Generic audio classifier
#[async_trait]
pub trait AudioClassifier: Send + Sync {
    /// Load model weights; may be retried after a failure
    async fn load(&self) -> Result<(), ClassifierError>;

    /// Classify one window of mono samples, most confident label first
    async fn classify(&self, window: &[f32]) -> Result<Vec<Classification>, ClassifierError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Thread-safe reference to a classifier
pub type SharedClassifier = Arc<dyn AudioClassifier>;

/// Parse JSON Lines of observations. Blank lines and `#` comments are skipped.
pub fn parse_observations(content: &str) -> Result<Vec<Vec<Classification>>, ClassifierError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(idx, line)| {
            parse_observation_line(line).map_err(|e| ClassifierError::Parse {
                line: idx + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Classifier that plays back recorded observations, ignoring the audio.
///
/// Built either from in-memory batches or from a JSON Lines file read on
/// `load`.
pub struct ReplayClassifier {
    name: String,
    source: Option<PathBuf>,
    batches: Mutex<VecDeque<Vec<Classification>>>,
}

impl ReplayClassifier {
    pub fn from_batches(batches: Vec<Vec<Classification>>) -> Self {
        Self {
            name: "replay:memory".to_string(),
            source: None,
            batches: Mutex::new(batches.into()),
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("replay:{}", path.display()),
            source: Some(path),
            batches: Mutex::new(VecDeque::new()),
        }
    }

    /// Observations not yet served
    pub async fn remaining(&self) -> usize {
        self.batches.lock().await.len()
    }
}

#[async_trait]
impl AudioClassifier for ReplayClassifier {
    async fn load(&self) -> Result<(), ClassifierError> {
        let Some(path) = &self.source else {
            return Ok(());
        };

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ClassifierError::Load(format!("{}: {}", path.display(), e)))?;
        let batches = parse_observations(&content)?;

        *self.batches.lock().await = batches.into();
        Ok(())
    }

    async fn classify(&self, _window: &[f32]) -> Result<Vec<Classification>, ClassifierError> {
        self.batches
            .lock()
            .await
            .pop_front()
            .ok_or(ClassifierError::Exhausted)
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Create a shared replay classifier over a JSON Lines file
pub fn create_replay_classifier(path: impl Into<PathBuf>) -> SharedClassifier {
    Arc::new(ReplayClassifier::from_file(path))
}
