// src/miner/difficulty.rs
//! Difficulty adjustment from observed block times.
//!
//! The manager records the timestamp of every new chain tip it observes. On
//! each adjustment the average spacing of the last `window` tips is compared
//! with the target spacing and the difficulty is scaled by
//! `target / observed`, clamped to a bounded step.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Difficulty adjustment parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Difficulty used before any adjustment
    pub initial_difficulty: f64,
    /// Lower bound for any adjusted difficulty
    pub min_difficulty: f64,
    /// Desired spacing between blocks (seconds)
    pub target_block_time_secs: u64,
    /// Number of recent tips averaged per adjustment
    pub window: usize,
    /// Seconds between adjustments
    pub adjustment_interval_secs: u64,
    /// Smallest allowed ratio per adjustment
    pub min_ratio: f64,
    /// Largest allowed ratio per adjustment
    pub max_ratio: f64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        DifficultyConfig {
            initial_difficulty: 1000.0,
            min_difficulty: 0.1,
            target_block_time_secs: 600,
            window: 10,
            adjustment_interval_secs: 60,
            min_ratio: 0.75,
            max_ratio: 1.25,
        }
    }
}

/// Tracks observed tip timestamps and the current difficulty
#[derive(Debug)]
pub struct DifficultyAdjuster {
    config: DifficultyConfig,
    current: f64,
    timestamps: VecDeque<i64>,
}

impl DifficultyAdjuster {
    /// Creates an adjuster starting at `config.initial_difficulty`
    pub fn new(config: DifficultyConfig) -> Self {
        let current = config.initial_difficulty.max(config.min_difficulty);
        DifficultyAdjuster {
            timestamps: VecDeque::with_capacity(config.window + 1),
            config,
            current,
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Overrides the current difficulty, e.g. with the ledger's network value
    pub fn set_current(&mut self, difficulty: f64) {
        if difficulty.is_finite() {
            self.current = difficulty.max(self.config.min_difficulty);
        }
    }

    /// Records the timestamp of a newly observed tip
    ///
    /// Timestamps that do not advance past the last recorded one are ignored.
    pub fn record_block_time(&mut self, timestamp: i64) {
        if let Some(last) = self.timestamps.back() {
            if timestamp <= *last {
                return;
            }
        }
        self.timestamps.push_back(timestamp);
        while self.timestamps.len() > self.config.window + 1 {
            self.timestamps.pop_front();
        }
    }

    /// Average spacing of the recorded tips, if at least two were seen
    pub fn observed_block_time(&self) -> Option<f64> {
        let first = *self.timestamps.front()?;
        let last = *self.timestamps.back()?;
        let intervals = self.timestamps.len().checked_sub(1).filter(|n| *n > 0)?;
        Some((last - first) as f64 / intervals as f64)
    }

    /// Runs one adjustment and returns the new difficulty
    ///
    /// Without enough observations the difficulty is left unchanged.
    pub fn adjust(&mut self) -> f64 {
        if let Some(observed) = self.observed_block_time() {
            if observed > 0.0 {
                let ratio = (self.config.target_block_time_secs as f64 / observed)
                    .clamp(self.config.min_ratio, self.config.max_ratio);
                self.current = (self.current * ratio).max(self.config.min_difficulty);
            }
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjuster(initial: f64) -> DifficultyAdjuster {
        DifficultyAdjuster::new(DifficultyConfig {
            initial_difficulty: initial,
            ..Default::default()
        })
    }

    #[test]
    fn test_no_observations_keeps_difficulty() {
        let mut adj = adjuster(1000.0);
        assert_eq!(adj.adjust(), 1000.0);
        adj.record_block_time(100);
        assert_eq!(adj.adjust(), 1000.0);
    }

    #[test]
    fn test_fast_blocks_raise_difficulty_clamped() {
        let mut adj = adjuster(1000.0);
        for i in 0..5 {
            adj.record_block_time(i * 60);
        }
        // 60 s observed against 600 s target: ratio 10, clamped to 1.25
        assert!((adj.adjust() - 1250.0).abs() < 1e-9);
    }

    #[test]
    fn test_slow_blocks_lower_difficulty_with_floor() {
        let mut adj = adjuster(0.12);
        for i in 0..5 {
            adj.record_block_time(i * 6000);
        }
        assert!((adj.adjust() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_exact_spacing_is_stable() {
        let mut adj = adjuster(500.0);
        for i in 0..3 {
            adj.record_block_time(i * 600);
        }
        assert!((adj.adjust() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_keeps_most_recent_tips() {
        let mut adj = adjuster(1.0);
        for i in 0..30 {
            adj.record_block_time(i * 10);
        }
        adj.record_block_time(5);
        assert_eq!(adj.observed_block_time(), Some(10.0));
    }
}
