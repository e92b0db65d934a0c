//! Bounded history of aggregate scores
//!
//! Keeps the most recent scores for trend display; the oldest entry is
//! evicted once capacity is reached.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::DEFAULT_HISTORY_LEN;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreHistory {
    scores: VecDeque<u8>,
    capacity: usize,
}

impl ScoreHistory {
    /// A zero capacity is bumped to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            scores: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, score: u8) {
        if self.scores.len() == self.capacity {
            self.scores.pop_front();
        }
        self.scores.push_back(score);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn latest(&self) -> Option<u8> {
        self.scores.back().copied()
    }

    pub fn peak(&self) -> Option<u8> {
        self.scores.iter().copied().max()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        let total: u64 = self.scores.iter().map(|&s| s as u64).sum();
        Some(total as f64 / self.scores.len() as f64)
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.scores.iter().copied()
    }

    pub fn clear(&mut self) {
        self.scores.clear();
    }
}

impl Default for ScoreHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = ScoreHistory::new(3);
        for score in [10, 20, 30, 40] {
            history.push(score);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![20, 30, 40]);
        assert_eq!(history.latest(), Some(40));
    }

    #[test]
    fn test_history_stats() {
        let mut history = ScoreHistory::new(10);
        assert_eq!(history.mean(), None);
        assert_eq!(history.peak(), None);

        for score in [5, 90, 25] {
            history.push(score);
        }
        assert_eq!(history.peak(), Some(90));
        assert_eq!(history.mean(), Some(40.0));
    }

    #[test]
    fn test_zero_capacity() {
        let mut history = ScoreHistory::new(0);
        history.push(1);
        history.push(2);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.latest(), Some(2));
    }
}
