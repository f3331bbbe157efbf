use crate::constants::{
    DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD, DEFAULT_MINING_THREADS, HASH_HEX_SIZE,
};
use serde::{Deserialize, Serialize};

/// Tunables for a [`Ledger`](crate::Ledger).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Required leading `'0'` characters in a mined block's hex hash.
    pub difficulty: usize,
    /// Amount paid to the reward address of every mined block.
    pub mining_reward: i64,
    /// Worker count for [`ParallelMiner`](crate::mine::ParallelMiner); 0 = rayon default.
    pub mining_threads: usize,
    /// Reject empty addresses and non-positive amounts in `submit_transaction`.
    pub strict_submission: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            mining_threads: DEFAULT_MINING_THREADS,
            strict_submission: false,
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(mut self, difficulty: usize) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_mining_reward(mut self, mining_reward: i64) -> Self {
        self.mining_reward = mining_reward;
        self
    }

    pub fn with_mining_threads(mut self, mining_threads: usize) -> Self {
        self.mining_threads = mining_threads;
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict_submission = true;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // A hex SHA-256 digest has 64 characters; anything above can never be met.
        if self.difficulty > HASH_HEX_SIZE {
            return Err(ConfigError::DifficultyTooHigh {
                difficulty: self.difficulty,
                max: HASH_HEX_SIZE,
            });
        }
        if self.mining_reward < 0 {
            return Err(ConfigError::NegativeReward(self.mining_reward));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("difficulty {difficulty} exceeds the {max} hex characters of a digest")]
    DifficultyTooHigh { difficulty: usize, max: usize },

    #[error("mining reward must not be negative, got {0}")]
    NegativeReward(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_example() {
        let config = LedgerConfig::default();
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.mining_reward, 100);
        assert_eq!(config.mining_threads, 0);
        assert!(!config.strict_submission);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_methods_example() {
        let config = LedgerConfig::default()
            .with_difficulty(4)
            .with_mining_reward(50)
            .with_mining_threads(2)
            .strict();
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.mining_reward, 50);
        assert_eq!(config.mining_threads, 2);
        assert!(config.strict_submission);
    }

    #[test]
    fn validate_rejects_unreachable_difficulty() {
        let config = LedgerConfig::default().with_difficulty(65);
        assert_eq!(
            config.validate(),
            Err(ConfigError::DifficultyTooHigh {
                difficulty: 65,
                max: 64
            })
        );
        assert!(LedgerConfig::default().with_difficulty(64).validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_reward() {
        let config = LedgerConfig::default().with_mining_reward(-1);
        assert_eq!(config.validate(), Err(ConfigError::NegativeReward(-1)));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: LedgerConfig = serde_json::from_str(r#"{"difficulty":3}"#).unwrap();
        assert_eq!(config.difficulty, 3);
        assert_eq!(config.mining_reward, 100);
        assert!(!config.strict_submission);
    }
}
