use crate::{Block, ValidationFailure};
use std::sync::Arc;
use tracing::{info, warn};

/// Event sink for ledger activity. Both hooks default to doing nothing.
pub trait LedgerObserver: Send + Sync {
    /// A block at `height` was sealed and appended.
    fn block_mined(&self, _height: usize, _block: &Block) {}

    /// `is_chain_valid` found a broken block.
    fn validation_failed(&self, _failure: &ValidationFailure) {}
}

impl<T: LedgerObserver + ?Sized> LedgerObserver for Arc<T> {
    fn block_mined(&self, height: usize, block: &Block) {
        (**self).block_mined(height, block)
    }

    fn validation_failed(&self, failure: &ValidationFailure) {
        (**self).validation_failed(failure)
    }
}

/// Default sink: reports through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl LedgerObserver for TracingObserver {
    fn block_mined(&self, height: usize, block: &Block) {
        info!(
            height,
            nonce = block.nonce,
            txs = block.transactions.len(),
            "Block successfully mined: {}",
            block.hash
        );
    }

    fn validation_failed(&self, failure: &ValidationFailure) {
        warn!(block = failure.index(), "chain invalid: {failure}");
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl LedgerObserver for NoopObserver {}
