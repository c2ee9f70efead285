// src/miner/reward.rs
//! Block reward schedule: a base reward plus an early-miner bonus, halved
//! every `halving_interval` blocks and floored at `min_reward`.

use serde::{Deserialize, Serialize};

/// One early-miner bonus band: blocks below `below_height` earn `bonus`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusBand {
    pub below_height: u64,
    pub bonus: f64,
}

/// Reward schedule parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub base_reward: f64,
    pub halving_interval: u64,
    pub min_reward: f64,
    /// Bands in ascending `below_height` order; the first match wins
    pub bonus_bands: Vec<BonusBand>,
}

impl Default for RewardConfig {
    fn default() -> Self {
        let band = |below_height, bonus| BonusBand {
            below_height,
            bonus,
        };
        RewardConfig {
            base_reward: 10.0,
            halving_interval: 100_000,
            min_reward: 1e-8,
            bonus_bands: vec![
                band(1_000, 500.0),
                band(5_000, 250.0),
                band(10_000, 100.0),
                band(25_000, 50.0),
                band(50_000, 25.0),
                band(100_000, 10.0),
            ],
        }
    }
}

impl RewardConfig {
    /// Early-miner bonus for `height`
    pub fn early_bonus(&self, height: u64) -> f64 {
        self.bonus_bands
            .iter()
            .find(|b| height < b.below_height)
            .map(|b| b.bonus)
            .unwrap_or(0.0)
    }

    /// Reward paid by the coinbase of the block at `height`
    pub fn calculate_mining_reward(&self, height: u64) -> f64 {
        let halvings = if self.halving_interval == 0 {
            0
        } else {
            height / self.halving_interval
        };
        let factor = 0.5f64.powi(halvings.min(i32::MAX as u64) as i32);
        ((self.base_reward + self.early_bonus(height)) * factor).max(self.min_reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bonus_bands() {
        let cfg = RewardConfig::default();
        assert_eq!(cfg.calculate_mining_reward(0), 510.0);
        assert_eq!(cfg.calculate_mining_reward(999), 510.0);
        assert_eq!(cfg.calculate_mining_reward(1_000), 260.0);
        assert_eq!(cfg.calculate_mining_reward(24_999), 60.0);
        assert_eq!(cfg.calculate_mining_reward(99_999), 20.0);
    }

    #[test]
    fn test_halving_and_floor() {
        let cfg = RewardConfig::default();
        assert_eq!(cfg.calculate_mining_reward(100_000), 5.0);
        assert_eq!(cfg.calculate_mining_reward(250_000), 2.5);
        assert_eq!(cfg.calculate_mining_reward(u64::MAX), 1e-8);
    }

    #[test]
    fn test_reward_never_increases_within_an_era() {
        let cfg = RewardConfig::default();
        let mut previous = f64::INFINITY;
        for height in (0..100_000).step_by(250) {
            let reward = cfg.calculate_mining_reward(height);
            assert!(reward <= previous, "reward rose at height {}", height);
            previous = reward;
        }
    }
}
