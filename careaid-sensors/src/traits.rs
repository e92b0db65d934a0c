//! Common traits for signal sources

use async_trait::async_trait;
use careaid_core::{ScoreSnapshot, ScoringEngine};
use thiserror::Error;

use crate::ClassifierError;

/// Errors from source operations
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Invalid source configuration: {0}")]
    Config(String),

    #[error("No work available")]
    NoWork,

    #[error("Source not ready: {0}")]
    NotReady(String),

    #[error("Source exhausted")]
    Exhausted,
}

/// Common interface for everything that feeds an engine
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Unique source identifier
    fn id(&self) -> &str;

    /// Source type name
    fn kind(&self) -> &str;

    /// Acquire whatever the source needs before it can poll. Called again to
    /// retry after a failure; sources with nothing to load succeed at once.
    async fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    /// Produce at most one update and apply it to the engine
    async fn poll(&mut self, engine: &mut ScoringEngine) -> Result<ScoreSnapshot, SensorError>;

    /// Release any held resources
    fn shutdown(&mut self) {}
}

/// Source configuration
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Unique source ID
    pub id: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string()[..8].to_string(),
        }
    }
}

impl SourceConfig {
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }
}
