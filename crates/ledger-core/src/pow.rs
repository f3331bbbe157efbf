//! Difficulty predicates and the lazy nonce search shared by the sequential and
//! parallel miners.

use crate::Hash;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of leading zero bits in `hash`.
pub fn count_leading_zero_bits(hash: &Hash) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 8;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}

/// Number of leading `'0'` characters in the hex encoding of `hash`.
pub fn leading_zero_nibbles(hash: &Hash) -> usize {
    (count_leading_zero_bits(hash) / 4) as usize
}

/// True when the hex encoding of `hash` starts with `difficulty` zeros.
pub fn meets_difficulty(hash: &Hash, difficulty: usize) -> bool {
    leading_zero_nibbles(hash) >= difficulty
}

/// Same predicate as [`meets_difficulty`] applied to an already hex-encoded digest.
pub fn hex_meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// A nonce together with the digest it produces for one fixed block body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub nonce: u64,
    pub digest: Hash,
}

impl Candidate {
    pub fn hex(&self) -> String {
        hex::encode(self.digest)
    }

    pub fn into_seal(self) -> Seal {
        Seal {
            nonce: self.nonce,
            hash: self.hex(),
        }
    }
}

/// The winning `(nonce, hash)` pair of a proof-of-work search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seal {
    pub nonce: u64,
    pub hash: String,
}

/// Infinite iterator over the candidates of a block body, starting at any nonce.
///
/// The body bytes are absorbed once; each step clones the hasher state and
/// only feeds the nonce. The nonce wraps at `u64::MAX`, so the search never
/// ends on its own.
#[derive(Clone)]
pub struct NonceSearch {
    base: Sha256,
    next: u64,
}

impl NonceSearch {
    pub(crate) fn new(prefix: &[u8], start: u64) -> Self {
        Self {
            base: Sha256::new_with_prefix(prefix),
            next: start,
        }
    }

    /// The nonce the next call to [`NonceSearch::next_candidate`] will try.
    pub fn position(&self) -> u64 {
        self.next
    }

    /// Digest for an arbitrary nonce without moving the cursor.
    pub fn digest_at(&self, nonce: u64) -> Hash {
        self.base.clone().chain_update(nonce.to_le_bytes()).finalize().into()
    }

    pub fn next_candidate(&mut self) -> Candidate {
        let nonce = self.next;
        self.next = nonce.wrapping_add(1);
        Candidate {
            nonce,
            digest: self.digest_at(nonce),
        }
    }
}

impl Iterator for NonceSearch {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        Some(self.next_candidate())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zero_bits_examples() {
        let mut h = [0u8; 32];
        assert_eq!(count_leading_zero_bits(&h), 256);
        h[0] = 0x0F; // 00001111
        assert_eq!(count_leading_zero_bits(&h), 4);
        h = [0u8; 32];
        h[1] = 0x80; // 00000000 10000000
        assert_eq!(count_leading_zero_bits(&h), 8);
        h[1] = 0x40; // 01000000
        assert_eq!(count_leading_zero_bits(&h), 9);
    }

    #[test]
    fn leading_zero_nibbles_match_hex_encoding() {
        let mut h = [0xFFu8; 32];
        h[0] = 0x00;
        h[1] = 0x0A;
        assert_eq!(leading_zero_nibbles(&h), 3);
        assert!(hex::encode(h).starts_with("000a"));
        assert!(meets_difficulty(&h, 3));
        assert!(!meets_difficulty(&h, 4));
        assert_eq!(leading_zero_nibbles(&[0u8; 32]), 64);
    }

    #[test]
    fn hex_predicate_examples() {
        assert!(hex_meets_difficulty("00ab", 0));
        assert!(hex_meets_difficulty("00ab", 2));
        assert!(!hex_meets_difficulty("00ab", 3));
        assert!(!hex_meets_difficulty("0", 2));
        assert!(hex_meets_difficulty("", 0));
    }

    #[test]
    fn byte_and_hex_predicates_agree() {
        let search = NonceSearch::new(b"agreement", 0);
        for candidate in search.take(500) {
            for d in 0..4 {
                assert_eq!(
                    meets_difficulty(&candidate.digest, d),
                    hex_meets_difficulty(&candidate.hex(), d)
                );
            }
        }
    }

    #[test]
    fn search_yields_consecutive_nonces() {
        let nonces: Vec<u64> = NonceSearch::new(b"body", 7).take(3).map(|c| c.nonce).collect();
        assert_eq!(nonces, vec![7, 8, 9]);
    }

    #[test]
    fn search_is_restartable() {
        let mut first = NonceSearch::new(b"body", 0);
        let ten: Vec<Candidate> = (&mut first).take(10).collect();
        assert_eq!(first.position(), 10);
        let resumed = NonceSearch::new(b"body", 5).next_candidate();
        assert_eq!(resumed, ten[5]);
    }

    #[test]
    fn digest_matches_one_shot_sha256() {
        let search = NonceSearch::new(b"prefix", 0);
        let mut hasher = Sha256::new();
        hasher.update(b"prefix");
        hasher.update(42u64.to_le_bytes());
        let expected: Hash = hasher.finalize().into();
        assert_eq!(search.digest_at(42), expected);
    }

    #[test]
    fn search_wraps_at_max_nonce() {
        let mut search = NonceSearch::new(b"wrap", u64::MAX);
        assert_eq!(search.next_candidate().nonce, u64::MAX);
        assert_eq!(search.next_candidate().nonce, 0);
    }
}
