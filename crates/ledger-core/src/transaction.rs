use crate::Balance;
use serde::{Deserialize, Serialize};

/// A value transfer between two unauthenticated addresses.
///
/// Fields are stored verbatim: there is no signature, no address format and no
/// balance check. A missing `from` marks a mining reward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    from: Option<String>,
    to: String,
    amount: i64,
}

impl Transaction {
    pub fn new(from: Option<String>, to: impl Into<String>, amount: i64) -> Self {
        Self {
            from,
            to: to.into(),
            amount,
        }
    }

    /// Transfer between two named addresses.
    pub fn transfer(from: impl Into<String>, to: impl Into<String>, amount: i64) -> Self {
        Self::new(Some(from.into()), to, amount)
    }

    /// Newly minted value with no sender.
    pub fn reward(to: impl Into<String>, amount: i64) -> Self {
        Self::new(None, to, amount)
    }

    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn is_reward(&self) -> bool {
        self.from.is_none()
    }

    /// Net effect of this transaction on `address`.
    pub fn delta_for(&self, address: &str) -> Balance {
        let amount = Balance::from(self.amount);
        let mut delta = 0;
        if self.to == address {
            delta += amount;
        }
        if self.from.as_deref() == Some(address) {
            delta -= amount;
        }
        delta
    }

    /// Appends the canonical byte form used by block hashing.
    pub(crate) fn write_hash_bytes(&self, out: &mut Vec<u8>) {
        match &self.from {
            Some(from) => {
                out.push(1);
                write_str(out, from);
            }
            None => out.push(0),
        }
        write_str(out, &self.to);
        out.extend_from_slice(&self.amount.to_le_bytes());
    }
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u64).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}
