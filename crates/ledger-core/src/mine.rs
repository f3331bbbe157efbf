use crate::config::LedgerConfig;
use crate::constants::HASH_HEX_SIZE;
use crate::pow::{self, Candidate, Seal};
use crate::{Block, LedgerError};
use rayon::prelude::*;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MineError {
    #[error("mining was cancelled before a seal was found")]
    Cancelled,

    #[error("difficulty {0} can never be met by a 64-character hex digest")]
    Unreachable(usize),

    #[error("nonce space exhausted without a seal")]
    Exhausted,
}

/// Shared flag that asks an in-flight search to stop.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Searches nonces on a dedicated rayon pool.
///
/// The search only reads the block; the caller applies the returned [`Seal`]
/// through `&mut Block`, so two searches can never both write the same block.
pub struct ParallelMiner {
    pool: rayon::ThreadPool,
}

impl ParallelMiner {
    /// `threads == 0` lets rayon size the pool from the available CPUs.
    pub fn new(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("ledger-miner-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    /// Pool sized by `config.mining_threads`.
    pub fn from_config(config: &LedgerConfig) -> crate::Result<Self> {
        Self::new(config.mining_threads).map_err(LedgerError::WorkerPool)
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Finds any nonce whose digest meets `difficulty`. Not necessarily the
    /// smallest one: workers race over disjoint nonce ranges.
    pub fn seal(
        &self,
        block: &Block,
        difficulty: usize,
        cancel: &CancelToken,
    ) -> Result<Seal, MineError> {
        if difficulty > HASH_HEX_SIZE {
            return Err(MineError::Unreachable(difficulty));
        }
        if cancel.is_cancelled() {
            return Err(MineError::Cancelled);
        }

        let search = block.candidates(0);
        let found = self.pool.install(|| {
            (0u64..=u64::MAX).into_par_iter().find_any(|nonce| {
                cancel.is_cancelled()
                    || pow::meets_difficulty(&search.digest_at(*nonce), difficulty)
            })
        });

        let nonce = found.ok_or(MineError::Exhausted)?;
        let candidate = Candidate {
            nonce,
            digest: search.digest_at(nonce),
        };
        // A worker may have stopped on the cancel flag rather than a real hit.
        if !pow::meets_difficulty(&candidate.digest, difficulty) {
            warn!(difficulty, "parallel mining cancelled");
            return Err(MineError::Cancelled);
        }

        let seal = candidate.into_seal();
        info!(
            "Found seal with nonce {} and hash {} on {} threads",
            seal.nonce,
            seal.hash,
            self.threads()
        );
        Ok(seal)
    }
}
