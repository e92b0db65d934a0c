//! Case-insensitive keyword matching over classifier labels
//!
//! Audio classifiers emit free-form labels ("Screaming", "Glass shatter",
//! "Police car (siren)"). A channel claims a label when any of its keywords
//! appears anywhere inside it, ignoring case.

use regex::{Regex, RegexBuilder};

use crate::{Classification, CoreError};

/// A compiled keyword set
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    pattern: Regex,
}

impl KeywordMatcher {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self, CoreError> {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.is_empty() {
            return Err(CoreError::InvalidConfig(
                "keyword set contains no usable keywords".to_string(),
            ));
        }

        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()?;

        Ok(Self { keywords, pattern })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Whether any keyword occurs inside `label`
    pub fn matches(&self, label: &str) -> bool {
        self.pattern.is_match(label)
    }

    /// Highest confidence among matching classifications, if any matched
    pub fn peak_confidence(&self, observations: &[Classification]) -> Option<f64> {
        observations
            .iter()
            .filter(|c| self.matches(&c.label))
            .map(|c| c.confidence())
            .fold(None, |peak, score| match peak {
                Some(p) if p >= score => Some(p),
                _ => Some(score),
            })
    }
}
