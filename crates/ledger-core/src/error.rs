use crate::config::ConfigError;
use crate::mine::MineError;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid ledger config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mining(#[from] MineError),

    #[error("a chain must contain at least the genesis block")]
    EmptyChain,

    #[error("transaction rejected: {0}")]
    InvalidTransaction(String),

    #[error("failed to build mining worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to serialize chain: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
