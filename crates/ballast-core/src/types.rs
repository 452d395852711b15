// crates/ballast-core/src/types.rs
//
// Canonical data model for the Ballast staking engine.
//
// Stake histories are piecewise-constant: a Snapshot records the aggregate
// weight from its start_cycle until the next snapshot's start_cycle (or
// forever if it is the tail). Cycles and periods are 1-based throughout.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// A cycle index. Cycle 1 begins at the staking start timestamp.
pub type Cycle = u16;

/// A period index. Period 1 spans cycles `1..=period_cycles`.
pub type Period = u16;

/// The fixed integer weight contributed by one staked NFT.
pub type Weight = u64;

/// An NFT identifier. The two most significant bytes carry the token type
/// and attribute used by the weight policy.
pub type TokenId = U256;

/// One piecewise-constant segment of a stake history.
///
/// The segment covers `[start_cycle, next.start_cycle)`, or `[start_cycle, ∞)`
/// for the tail. Within one history, `start_cycle` strictly increases with
/// index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Aggregate staked weight over the segment.
    pub stake: u128,
    /// First cycle the segment covers (≥ 1 for live entries).
    pub start_cycle: Cycle,
}

impl Snapshot {
    /// The "no next segment" sentinel used by the claim walker, and the value
    /// written over reclaimed entries.
    pub const ZERO: Snapshot = Snapshot {
        stake: 0,
        start_cycle: 0,
    };
}

/// Registry record for one NFT.
///
/// Created on first deposit and mutated in place thereafter; never deleted.
/// `owner` is `None` when the token is not currently staked, but
/// `withdraw_cycle` retains the last unstake cycle so the re-stake cooldown
/// can be enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Current staker, or `None` after unstake.
    pub owner: Option<Address>,
    /// Weight assigned by the weight policy on deposit. Immutable once set.
    pub weight: Weight,
    /// Cycle of the most recent deposit.
    pub deposit_cycle: Cycle,
    /// Cycle of the most recent withdrawal, 0 if never withdrawn.
    pub withdraw_cycle: Cycle,
}

/// Per-staker claim cursor.
///
/// `period` is the next not-yet-claimed period; 0 means the staker has never
/// staked, or fully exhausted their claims with zero stake remaining.
/// The two indices resume the segment walk in O(new-segments).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextClaim {
    /// Next period to claim, 0 = uninitialized.
    pub period: Period,
    /// Index into the global history where the walk resumes.
    pub global_idx: u64,
    /// Index into the staker's history where the walk resumes.
    pub staker_idx: u64,
}

impl NextClaim {
    /// Whether the cursor points at a claimable position.
    pub fn is_initialized(&self) -> bool {
        self.period != 0
    }
}

/// Result of one claim computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedClaim {
    /// First period covered by the computation.
    pub start_period: Period,
    /// Number of periods covered. 0 when nothing was claimable.
    pub periods: u16,
    /// Total reward owed over the covered periods.
    pub amount: U256,
}

impl ComputedClaim {
    /// A zero-period result leaving the given cursor position untouched.
    pub fn empty(start_period: Period) -> Self {
        Self {
            start_period,
            periods: 0,
            amount: U256::ZERO,
        }
    }
}
