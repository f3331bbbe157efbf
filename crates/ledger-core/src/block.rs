use crate::constants::{GENESIS_PLACEHOLDER_ADDRESS, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP};
use crate::pow::{self, NonceSearch, Seal};
use crate::Transaction;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Milliseconds since the Unix epoch; 0 if the clock is set before 1970.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// A batch of transactions linked to its predecessor by `previous_hash`.
///
/// `hash` is only trustworthy while it equals [`Block::compute_hash`]; nothing
/// here stops a caller from editing fields, [`crate::Ledger::is_chain_valid`]
/// is what notices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub previous_hash: String,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    /// Builds an unmined block (`nonce = 0`) and computes its hash right away.
    pub fn new(
        timestamp: u64,
        transactions: Vec<Transaction>,
        previous_hash: impl Into<String>,
    ) -> Self {
        let mut block = Self {
            previous_hash: previous_hash.into(),
            timestamp,
            transactions,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// The fixed first block. Never mined and never validated against a parent.
    pub fn genesis() -> Self {
        Self::new(
            GENESIS_TIMESTAMP,
            vec![Transaction::transfer(
                GENESIS_PLACEHOLDER_ADDRESS,
                GENESIS_PLACEHOLDER_ADDRESS,
                0,
            )],
            GENESIS_PREVIOUS_HASH,
        )
    }

    /// Canonical bytes of everything the hash covers except the nonce.
    ///
    /// Layout: len-prefixed `previous_hash`, LE `timestamp`, LE tx count, then
    /// each transaction in order. The nonce is appended last by the search.
    pub fn hash_prefix(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(24 + self.previous_hash.len() + 48 * self.transactions.len());
        bytes.extend_from_slice(&(self.previous_hash.len() as u64).to_le_bytes());
        bytes.extend_from_slice(self.previous_hash.as_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&(self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            tx.write_hash_bytes(&mut bytes);
        }
        bytes
    }

    /// Lazy proof-of-work search over this block's body from `start`.
    pub fn candidates(&self, start: u64) -> NonceSearch {
        NonceSearch::new(&self.hash_prefix(), start)
    }

    /// Hex SHA-256 of `(previous_hash, timestamp, transactions, nonce)`.
    pub fn compute_hash(&self) -> String {
        hex::encode(self.candidates(self.nonce).digest_at(self.nonce))
    }

    pub fn hash_matches(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        pow::hex_meets_difficulty(&self.hash, difficulty)
    }

    /// Walks nonces upward from the current one until the hash starts with
    /// `difficulty` zeros. Blocks the calling thread with no upper bound.
    pub fn mine(&mut self, difficulty: usize) {
        let mut search = self.candidates(self.nonce);
        let start = search.position();
        loop {
            let candidate = search.next_candidate();
            if pow::meets_difficulty(&candidate.digest, difficulty) {
                self.nonce = candidate.nonce;
                self.hash = candidate.hex();
                break;
            }
        }
        debug!(
            hash = %self.hash,
            nonce = self.nonce,
            attempts = search.position().wrapping_sub(start),
            "Block mined"
        );
    }

    /// Installs a seal found by another searcher. The hash is recomputed from
    /// the nonce, never copied from the seal.
    pub fn apply_seal(&mut self, seal: &Seal) {
        self.nonce = seal.nonce;
        self.hash = self.compute_hash();
        debug!(nonce = seal.nonce, hash = %self.hash, "seal applied");
    }
}
