// crates/ballast-vault/src/events.rs
//
// Observable events recorded by the vault. The embedder drains the log;
// each event is also mirrored to tracing at its emission site.

use alloy_primitives::{Address, U256};

use ballast_core::types::{Cycle, Period, TokenId, Weight};

/// Events emitted by vault operations, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    /// Rewards were scheduled over an inclusive period range.
    RewardsAdded {
        start_period: Period,
        end_period: Period,
        rewards_per_cycle: U256,
    },
    /// Staking started.
    Started,
    /// An NFT was deposited.
    NftStaked {
        staker: Address,
        cycle: Cycle,
        token_id: TokenId,
        weight: Weight,
    },
    /// An NFT was withdrawn.
    NftUnstaked {
        staker: Address,
        cycle: Cycle,
        token_id: TokenId,
        weight: Weight,
    },
    /// A claim computed and paid out a reward.
    RewardsClaimed {
        staker: Address,
        cycle: Cycle,
        start_period: Period,
        periods: u16,
        amount: U256,
    },
    /// Both stake histories were updated. Emitted once per stake or unstake
    /// operation, after both updates.
    HistoriesUpdated {
        staker: Address,
        start_cycle: Cycle,
        staker_stake: u128,
        global_stake: u128,
    },
    /// The vault was disabled.
    Disabled,
}
