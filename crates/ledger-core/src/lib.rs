//! Single-node proof-of-work ledger: transactions, hash-linked blocks, a
//! pending buffer and the chain controller that mines it.

pub mod block;
pub mod config;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod mine;
pub mod observer;
pub mod pow;
pub mod transaction;

pub use block::Block;
pub use config::{ConfigError, LedgerConfig};
pub use error::{LedgerError, Result};
pub use ledger::{Ledger, ValidationFailure};
pub use mine::{CancelToken, MineError, ParallelMiner};
pub use observer::{LedgerObserver, NoopObserver, TracingObserver};
pub use pow::{Candidate, NonceSearch, Seal};
pub use transaction::Transaction;

/// Raw SHA-256 digest.
pub type Hash = [u8; 32];

/// Running total of `i64` amounts. Wide enough that no realistic chain of
/// `i64` transfers, including `i64::MIN` debits, can overflow it.
pub type Balance = i128;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mined_hash_has_required_prefix_for_small_difficulties() {
        for difficulty in 0..=3 {
            let mut block = Block::new(
                1_600_000_000 + difficulty as u64,
                vec![Transaction::transfer("Alice", "Bob", 10)],
                "0",
            );
            block.mine(difficulty);
            assert!(block.hash.starts_with(&"0".repeat(difficulty)));
            assert_eq!(block.compute_hash(), block.hash);
        }
    }

    #[test]
    fn genesis_hash_is_stable() {
        let genesis = Block::genesis();
        assert_eq!(genesis.hash, Block::genesis().compute_hash());
        assert_eq!(genesis.hash.len(), constants::HASH_HEX_SIZE);
    }

    #[test]
    fn reexports_compose() {
        let mut ledger = Ledger::with_config(LedgerConfig::default().with_difficulty(1))
            .unwrap()
            .with_observer(NoopObserver);
        ledger.create_transaction(Transaction::transfer("a", "b", 3));
        ledger.mine_pending("m");
        assert_eq!(ledger.balance_of("b"), 3);
        assert!(ledger.is_valid());
    }
}
