//! Classifier observations
//!
//! One observation is the ranked top-K output of an audio/event classifier
//! for a single window, most confident first.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A single (label, confidence) pair from a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    /// Raw classifier confidence, nominally in [0, 1]
    pub score: f64,
}

impl Classification {
    pub fn new(label: &str, score: f64) -> Self {
        Self {
            label: label.to_string(),
            score,
        }
    }

    /// Confidence clamped to [0, 1], NaN read as zero
    pub fn confidence(&self) -> f64 {
        crate::clamp_value(self.score, 0.0, 1.0)
    }
}

/// Label of the top-ranked entry
pub fn top_label(observations: &[Classification]) -> Option<&str> {
    observations.first().map(|c| c.label.as_str())
}

/// Parse one JSON line holding an array of `{label, score}` objects
pub fn parse_observation_line(line: &str) -> Result<Vec<Classification>, CoreError> {
    Ok(serde_json::from_str(line.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_observation_line() {
        let line = r#"[{"label":"Screaming","score":0.72},{"label":"Speech","score":0.11}]"#;
        let observations = parse_observation_line(line).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(top_label(&observations), Some("Screaming"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_observation_line("not json").is_err());
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(Classification::new("a", 1.7).confidence(), 1.0);
        assert_eq!(Classification::new("a", -0.2).confidence(), 0.0);
        assert_eq!(Classification::new("a", f64::NAN).confidence(), 0.0);
    }
}
