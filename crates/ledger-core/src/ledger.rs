use crate::block::now_millis;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::mine::{CancelToken, ParallelMiner};
use crate::observer::{LedgerObserver, TracingObserver};
use crate::{Balance, Block, Transaction};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// First broken invariant found while walking the chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("block {index} stores hash {stored} but its content hashes to {computed}")]
    HashMismatch {
        index: usize,
        stored: String,
        computed: String,
    },

    #[error("block {index} links to {found} but its parent hash is {expected}")]
    BrokenLink {
        index: usize,
        expected: String,
        found: String,
    },
}

impl ValidationFailure {
    pub fn index(&self) -> usize {
        match self {
            ValidationFailure::HashMismatch { index, .. }
            | ValidationFailure::BrokenLink { index, .. } => *index,
        }
    }
}

/// Single-owner chain controller: the block sequence, the pending buffer and
/// the mining loop that moves one into the other.
pub struct Ledger {
    chain: Vec<Block>,
    pending_transactions: Vec<Transaction>,
    config: LedgerConfig,
    observer: Box<dyn LedgerObserver>,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("chain", &self.chain)
            .field("pending_transactions", &self.pending_transactions)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Genesis-only ledger with difficulty 2 and a reward of 100.
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending_transactions: Vec::new(),
            config: LedgerConfig::default(),
            observer: Box::new(TracingObserver),
        }
    }

    pub fn with_config(config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Adopts an existing block sequence as-is. Nothing is re-hashed or
    /// repaired; call [`Ledger::is_chain_valid`] to find out what was loaded.
    pub fn from_chain(chain: Vec<Block>, config: LedgerConfig) -> Result<Self> {
        if chain.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        config.validate()?;
        Ok(Self {
            chain,
            config,
            ..Self::new()
        })
    }

    pub fn with_observer(mut self, observer: impl LedgerObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    pub fn mining_reward(&self) -> i64 {
        self.config.mining_reward
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    pub fn latest_block(&self) -> &Block {
        // never empty: every constructor installs at least one block
        &self.chain[self.chain.len() - 1]
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    /// Queues `tx` for the next block exactly as given.
    pub fn create_transaction(&mut self, tx: Transaction) {
        debug!(
            from = tx.from().unwrap_or("<reward>"),
            to = tx.to(),
            amount = tx.amount(),
            "transaction queued"
        );
        self.pending_transactions.push(tx);
    }

    /// Caller-facing submission. Only fails when `strict_submission` is on.
    pub fn submit_transaction(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: i64,
    ) -> Result<()> {
        let tx = Transaction::transfer(from, to, amount);
        if self.config.strict_submission {
            check_strict(&tx)?;
        }
        self.create_transaction(tx);
        Ok(())
    }

    fn next_block(&self) -> Block {
        Block::new(
            now_millis(),
            self.pending_transactions.clone(),
            self.latest_block().hash.clone(),
        )
    }

    fn append(&mut self, block: Block, reward_address: &str) -> &Block {
        let height = self.chain.len();
        self.chain.push(block);
        self.pending_transactions = vec![Transaction::reward(
            reward_address,
            self.config.mining_reward,
        )];
        let block = &self.chain[height];
        self.observer.block_mined(height, block);
        block
    }

    /// Seals the pending buffer into a new block on the calling thread.
    ///
    /// The reward for this block is only queued: it is paid out by the block
    /// mined after it.
    pub fn mine_pending_transactions(&mut self, reward_address: &str) -> &Block {
        let mut block = self.next_block();
        block.mine(self.config.difficulty);
        self.append(block, reward_address)
    }

    /// Like [`Ledger::mine_pending_transactions`] but searches on `miner`'s
    /// pool and gives up when `cancel` fires. A cancelled call leaves both the
    /// chain and the pending buffer unchanged.
    pub fn mine_pending_with(
        &mut self,
        reward_address: &str,
        miner: &ParallelMiner,
        cancel: &CancelToken,
    ) -> Result<&Block> {
        let mut block = self.next_block();
        let seal = miner.seal(&block, self.config.difficulty, cancel)?;
        block.apply_seal(&seal);
        Ok(self.append(block, reward_address))
    }

    pub fn mine_pending(&mut self, reward_address: &str) -> &Block {
        self.mine_pending_transactions(reward_address)
    }

    /// Credits minus debits for `address` over every mined transaction.
    ///
    /// Summed as [`Balance`] so any mix of `i64` amounts totals without
    /// overflow.
    pub fn get_balance(&self, address: &str) -> Balance {
        self.chain
            .iter()
            .flat_map(|block| &block.transactions)
            .map(|tx| tx.delta_for(address))
            .sum()
    }

    pub fn balance_of(&self, address: &str) -> Balance {
        self.get_balance(address)
    }

    /// Every address that appears as sender or recipient in the chain.
    pub fn addresses(&self) -> BTreeSet<&str> {
        self.chain
            .iter()
            .flat_map(|block| &block.transactions)
            .flat_map(|tx| tx.from().into_iter().chain(Some(tx.to())))
            .collect()
    }

    /// Sum of reward transactions already sealed into the chain.
    pub fn total_rewards(&self) -> Balance {
        self.chain
            .iter()
            .flat_map(|block| &block.transactions)
            .filter(|tx| tx.is_reward())
            .map(|tx| Balance::from(tx.amount()))
            .sum()
    }

    /// Checks every block after genesis for a stale hash or a broken link.
    pub fn validate_chain(&self) -> std::result::Result<(), ValidationFailure> {
        for (offset, pair) in self.chain.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let index = offset + 1;

            let computed = current.compute_hash();
            if current.hash != computed {
                return Err(ValidationFailure::HashMismatch {
                    index,
                    stored: current.hash.clone(),
                    computed,
                });
            }
            if current.previous_hash != previous.hash {
                return Err(ValidationFailure::BrokenLink {
                    index,
                    expected: previous.hash.clone(),
                    found: current.previous_hash.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn is_chain_valid(&self) -> bool {
        match self.validate_chain() {
            Ok(()) => true,
            Err(failure) => {
                self.observer.validation_failed(&failure);
                false
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_chain_valid()
    }

    /// Pretty JSON array of blocks in chain order.
    pub fn export_chain_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.chain)?)
    }
}

fn check_strict(tx: &Transaction) -> Result<()> {
    if tx.from().map_or(true, |from| from.trim().is_empty()) {
        return Err(LedgerError::InvalidTransaction("sender address is empty".into()));
    }
    if tx.to().trim().is_empty() {
        return Err(LedgerError::InvalidTransaction("recipient address is empty".into()));
    }
    if tx.amount() <= 0 {
        return Err(LedgerError::InvalidTransaction(format!(
            "amount must be positive, got {}",
            tx.amount()
        )));
    }
    Ok(())
}
