pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const DEFAULT_DIFFICULTY: usize = 2;
pub const DEFAULT_MINING_REWARD: i64 = 100;
/// 0 lets rayon pick one worker per logical CPU.
pub const DEFAULT_MINING_THREADS: usize = 0;
/// 2018-01-01T00:00:00Z in Unix milliseconds.
pub const GENESIS_TIMESTAMP: u64 = 1_514_764_800_000;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const GENESIS_PLACEHOLDER_ADDRESS: &str = "x";
