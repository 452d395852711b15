// crates/ballast-core/src/traits.rs
//
// Capability traits injected into the vault at construction: the NFT custody
// transport, the reward-token transport, the weight-derivation policy, and
// the clock. The vault owns all staking state; transports own their own
// state and never share memory with the vault.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, U256};
use chrono::Utc;

use crate::error::BallastError;
use crate::types::{TokenId, Weight};

/// Custody transport for the staked NFTs.
///
/// The vault prefers `safe_transfer_from` when returning a token and falls
/// back to the unchecked `transfer_from` if the safe path fails.
pub trait NftTransport: Send + Sync {
    /// Transfer with receiver acknowledgment.
    fn safe_transfer_from(
        &self,
        from: Address,
        to: Address,
        id: TokenId,
        value: u64,
        data: &[u8],
    ) -> Result<(), BallastError>;

    /// Transfer without receiver acknowledgment.
    fn transfer_from(&self, from: Address, to: Address, id: TokenId) -> Result<(), BallastError>;
}

/// Minimal value-token interface for the reward token.
///
/// A returned `false` means the transfer was refused; callers must treat it
/// the same as an error.
pub trait RewardTransport: Send + Sync {
    /// Pull `amount` from `sender` into `recipient`.
    fn transfer_from(
        &self,
        sender: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<bool, BallastError>;

    /// Push `amount` from the vault's balance to `recipient`.
    fn transfer(&self, recipient: Address, amount: U256) -> Result<bool, BallastError>;
}

/// Weight-derivation policy: validates a token id and returns the fixed
/// weight it contributes while staked.
pub trait WeightPolicy: Send + Sync {
    /// # Errors
    /// Returns `UnsupportedToken` when the id is not stakeable.
    fn validate_and_weight(&self, id: TokenId) -> Result<Weight, BallastError>;
}

/// Source of wall-clock time. Each vault operation reads the clock exactly
/// once, so all cycle/period indices within one operation are consistent.
pub trait Clock: Send + Sync {
    /// Current unix timestamp in seconds.
    fn unix_now(&self) -> u64;
}

/// System clock backed by UTC wall time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_now(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64
    }
}

/// Settable clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at the given timestamp.
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Jump to an absolute timestamp.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `secs` seconds.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn unix_now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.unix_now(), 100);
        clock.advance(60);
        assert_eq!(clock.unix_now(), 160);
        clock.set(1_000);
        assert_eq!(clock.unix_now(), 1_000);
    }
}
