// crates/ballast-vault/src/vault.rs
//
// The staking vault controller.
//
// All mutable state lives in a single owned VaultState behind this facade;
// every mutating operation takes &mut self, so execution is serial and a
// transport can never re-enter the vault mid-operation. Each operation reads
// the clock exactly once, completes its state mutations before touching a
// transport, and rolls those mutations back if the transport call fails, so
// every operation is all-or-nothing.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use ballast_core::error::BallastError;
use ballast_core::timegrid;
use ballast_core::traits::{Clock, NftTransport, RewardTransport, WeightPolicy};
use ballast_core::types::{ComputedClaim, Cycle, NextClaim, Period, Snapshot, TokenId, TokenInfo};

use crate::claim::compute_claim;
use crate::config::VaultConfig;
use crate::events::VaultEvent;
use crate::history::StakeHistory;
use crate::registry::TokenRegistry;
use crate::schedule::RewardSchedule;

/// Acknowledgment returned by the single-token receiver hook.
pub const SINGLE_RECEIPT: [u8; 4] = [0xba, 0x11, 0xa5, 0x01];

/// Acknowledgment returned by the batch receiver hook.
pub const BATCH_RECEIPT: [u8; 4] = [0xba, 0x11, 0xa5, 0x02];

/// Every piece of mutable vault state. Serializable as a whole for the
/// persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultState {
    /// False once `disable` has been called; one-way.
    pub enabled: bool,
    /// Unix timestamp of cycle 1, or 0 before `start`.
    pub start_timestamp: u64,
    /// Undistributed remainder of the scheduled reward budget.
    pub total_rewards_pool: U256,
    /// Total-weight history across all stakers.
    pub global_history: StakeHistory,
    /// Per-staker weight histories.
    pub staker_histories: HashMap<Address, StakeHistory>,
    /// Per-staker claim cursors. An absent entry is an uninitialized cursor.
    pub cursors: HashMap<Address, NextClaim>,
    /// Custody registry for every token ever staked.
    pub registry: TokenRegistry,
    /// Per-period reward budgets.
    pub schedule: RewardSchedule,
}

impl VaultState {
    /// Fresh state: enabled, not started, nothing staked.
    pub fn new() -> Self {
        Self {
            enabled: true,
            start_timestamp: 0,
            total_rewards_pool: U256::ZERO,
            global_history: StakeHistory::new(),
            staker_histories: HashMap::new(),
            cursors: HashMap::new(),
            registry: TokenRegistry::new(),
            schedule: RewardSchedule::new(),
        }
    }
}

impl Default for VaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// The staking vault: custodial NFT staking with period-budgeted,
/// weight-proportional reward distribution.
pub struct NftVault {
    config: VaultConfig,
    state: VaultState,
    weight_policy: Arc<dyn WeightPolicy>,
    nft_transport: Arc<dyn NftTransport>,
    reward_transport: Arc<dyn RewardTransport>,
    clock: Arc<dyn Clock>,
    events: Vec<VaultEvent>,
}

impl NftVault {
    /// Create a vault with fresh state.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when the configuration fails validation.
    pub fn new(
        config: VaultConfig,
        weight_policy: Arc<dyn WeightPolicy>,
        nft_transport: Arc<dyn NftTransport>,
        reward_transport: Arc<dyn RewardTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, BallastError> {
        Self::from_state(
            config,
            VaultState::new(),
            weight_policy,
            nft_transport,
            reward_transport,
            clock,
        )
    }

    /// Create a vault over previously persisted state.
    pub fn from_state(
        config: VaultConfig,
        state: VaultState,
        weight_policy: Arc<dyn WeightPolicy>,
        nft_transport: Arc<dyn NftTransport>,
        reward_transport: Arc<dyn RewardTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, BallastError> {
        config.validate()?;
        Ok(Self {
            config,
            state,
            weight_policy,
            nft_transport,
            reward_transport,
            clock,
            events: Vec::new(),
        })
    }

    // -----------------------------------------------------------------
    // Administrative operations
    // -----------------------------------------------------------------

    /// Start the time grid: cycle 1 begins now. One-shot, owner-only.
    pub fn start(&mut self, caller: Address) -> Result<(), BallastError> {
        self.require_owner(caller)?;
        if self.state.start_timestamp != 0 {
            return Err(BallastError::AlreadyStarted);
        }
        self.state.start_timestamp = self.clock.unix_now();
        tracing::info!("Staking started at timestamp {}", self.state.start_timestamp);
        self.events.push(VaultEvent::Started);
        Ok(())
    }

    /// Disable the vault. One-way, owner-only. Afterwards only emergency
    /// unstakes and the pool drain are possible.
    pub fn disable(&mut self, caller: Address) -> Result<(), BallastError> {
        self.require_owner(caller)?;
        if !self.state.enabled {
            return Err(BallastError::Disabled);
        }
        self.state.enabled = false;
        tracing::info!("Vault disabled");
        self.events.push(VaultEvent::Disabled);
        Ok(())
    }

    /// Schedule `rewards_per_cycle` over every period in the inclusive range
    /// and pull the corresponding funding from the caller.
    ///
    /// # Errors
    /// - `Unauthorized` for non-owner callers.
    /// - `BadRange` for an invalid range or an already-started period.
    /// - `TransferFailed` when the funding transfer fails; the schedule and
    ///   pool are rolled back.
    pub fn add_rewards(
        &mut self,
        caller: Address,
        start_period: Period,
        end_period: Period,
        rewards_per_cycle: U256,
    ) -> Result<(), BallastError> {
        self.require_owner(caller)?;
        if start_period == 0 || end_period < start_period {
            return Err(BallastError::BadRange(format!(
                "invalid period range [{}, {}]",
                start_period, end_period
            )));
        }
        if self.state.start_timestamp != 0 {
            let current_period = self.current_period()?;
            if start_period < current_period {
                return Err(BallastError::BadRange(format!(
                    "cannot schedule rewards for past period {} (current period is {})",
                    start_period, current_period
                )));
            }
        }

        let span = U256::from(u32::from(end_period - start_period) + 1);
        let total = rewards_per_cycle
            .checked_mul(U256::from(self.config.period_cycles))
            .and_then(|v| v.checked_mul(span))
            .ok_or_else(|| {
                BallastError::Overflow("scheduled reward total exceeds U256".to_string())
            })?;
        let new_pool = self
            .state
            .total_rewards_pool
            .checked_add(total)
            .ok_or_else(|| BallastError::Overflow("rewards pool exceeds U256".to_string()))?;

        self.state
            .schedule
            .add(start_period, end_period, rewards_per_cycle)?;
        let old_pool = self.state.total_rewards_pool;
        self.state.total_rewards_pool = new_pool;

        match self
            .reward_transport
            .transfer_from(caller, self.config.vault_address, total)
        {
            Ok(true) => {}
            outcome => {
                self.state
                    .schedule
                    .subtract(start_period, end_period, rewards_per_cycle);
                self.state.total_rewards_pool = old_pool;
                return Err(transfer_failure("rewards funding", outcome));
            }
        }

        tracing::info!(
            "Scheduled {} rewards per cycle over periods {}..={}",
            rewards_per_cycle,
            start_period,
            end_period
        );
        self.events.push(VaultEvent::RewardsAdded {
            start_period,
            end_period,
            rewards_per_cycle,
        });
        Ok(())
    }

    /// Drain `amount` from the rewards pool to the owner. Only permitted
    /// once the vault is disabled.
    pub fn withdraw_rewards_pool(
        &mut self,
        caller: Address,
        amount: U256,
    ) -> Result<(), BallastError> {
        self.require_owner(caller)?;
        if self.state.enabled {
            return Err(BallastError::Enabled);
        }
        let old_pool = self.state.total_rewards_pool;
        self.state.total_rewards_pool = old_pool.checked_sub(amount).ok_or_else(|| {
            BallastError::Underflow(format!(
                "withdrawal of {} exceeds rewards pool {}",
                amount, old_pool
            ))
        })?;

        match self.reward_transport.transfer(caller, amount) {
            Ok(true) => Ok(()),
            outcome => {
                self.state.total_rewards_pool = old_pool;
                Err(transfer_failure("rewards pool drain", outcome))
            }
        }
    }

    // -----------------------------------------------------------------
    // Receiver hooks (the only way in for NFTs)
    // -----------------------------------------------------------------

    /// Receiver hook for a single-token transfer into the vault.
    ///
    /// `sender` is the identity of the calling transport and must match the
    /// whitelisted NFT transport. An error refuses the deposit.
    pub fn on_single_received(
        &mut self,
        sender: Address,
        _operator: Address,
        from: Address,
        id: TokenId,
        value: u64,
        _data: &[u8],
    ) -> Result<[u8; 4], BallastError> {
        self.require_whitelisted(sender)?;
        self.stake_tokens(from, &[(id, value)])?;
        Ok(SINGLE_RECEIPT)
    }

    /// Receiver hook for a batch transfer into the vault. Each id is
    /// validated independently; the batch lands atomically.
    pub fn on_batch_received(
        &mut self,
        sender: Address,
        _operator: Address,
        from: Address,
        ids: &[TokenId],
        values: &[u64],
        _data: &[u8],
    ) -> Result<[u8; 4], BallastError> {
        self.require_whitelisted(sender)?;
        if ids.len() != values.len() {
            return Err(BallastError::BadRange(format!(
                "batch arity mismatch: {} ids, {} values",
                ids.len(),
                values.len()
            )));
        }
        if !ids.is_empty() {
            let items: Vec<(TokenId, u64)> = ids
                .iter()
                .copied()
                .zip(values.iter().copied())
                .collect();
            self.stake_tokens(from, &items)?;
        }
        Ok(BATCH_RECEIPT)
    }

    fn stake_tokens(
        &mut self,
        owner: Address,
        items: &[(TokenId, u64)],
    ) -> Result<(), BallastError> {
        if !self.state.enabled {
            return Err(BallastError::Disabled);
        }
        let current_cycle = self.current_cycle()?;
        let current_period = timegrid::period_of(current_cycle, self.config.period_cycles)?;

        // Validate every token before mutating anything.
        let mut weights = Vec::with_capacity(items.len());
        let mut total_weight: u64 = 0;
        for (id, value) in items {
            if *value != 1 {
                return Err(BallastError::BadRange(format!(
                    "staking transfers carry a value of exactly 1, got {}",
                    value
                )));
            }
            let weight = self.weight_policy.validate_and_weight(*id)?;
            if let Some(info) = self.state.registry.get(id) {
                if info.withdraw_cycle == current_cycle {
                    return Err(BallastError::Cooldown(format!(
                        "token {} was unstaked in cycle {} and cannot re-stake until the next",
                        id, current_cycle
                    )));
                }
            }
            total_weight = total_weight.checked_add(weight).ok_or_else(|| {
                BallastError::Overflow("batch weight exceeds u64".to_string())
            })?;
            weights.push(weight);
        }

        self.state
            .global_history
            .update(i128::from(total_weight), current_cycle)?;
        let staker_history = self.state.staker_histories.entry(owner).or_default();
        staker_history.update(i128::from(total_weight), current_cycle)?;
        let staker_stake = staker_history.last().map(|s| s.stake).unwrap_or(0);
        let global_stake = self
            .state
            .global_history
            .last()
            .map(|s| s.stake)
            .unwrap_or(0);

        let cursor = self.state.cursors.get(&owner).copied().unwrap_or_default();
        if !cursor.is_initialized() {
            self.state.cursors.insert(
                owner,
                NextClaim {
                    period: current_period,
                    global_idx: (self.state.global_history.len() - 1) as u64,
                    staker_idx: 0,
                },
            );
        }

        for ((id, _), weight) in items.iter().zip(weights) {
            self.state
                .registry
                .record_deposit(*id, owner, weight, current_cycle);
            tracing::info!(
                "Staked token {} for {} at cycle {} with weight {}",
                id,
                owner,
                current_cycle,
                weight
            );
            self.events.push(VaultEvent::NftStaked {
                staker: owner,
                cycle: current_cycle,
                token_id: *id,
                weight,
            });
        }
        self.events.push(VaultEvent::HistoriesUpdated {
            staker: owner,
            start_cycle: current_cycle,
            staker_stake,
            global_stake,
        });
        Ok(())
    }

    // -----------------------------------------------------------------
    // Unstake
    // -----------------------------------------------------------------

    /// Withdraw a staked NFT back to its staker.
    ///
    /// While the vault is enabled this requires two full cycles to have
    /// elapsed since the deposit and records the weight decrease in both
    /// histories. When disabled, all accounting is skipped and the token is
    /// simply returned (emergency exit).
    pub fn unstake(&mut self, caller: Address, id: TokenId) -> Result<(), BallastError> {
        let info = *self.state.registry.get(&id).ok_or_else(|| {
            BallastError::Unauthorized(format!("token {} is not staked", id))
        })?;
        if info.owner != Some(caller) {
            return Err(BallastError::Unauthorized(format!(
                "{} does not own staked token {}",
                caller, id
            )));
        }

        if !self.state.enabled {
            return self.return_nft(caller, id);
        }

        let current_cycle = self.current_cycle()?;
        if u32::from(current_cycle) < u32::from(info.deposit_cycle) + 2 {
            return Err(BallastError::Frozen(format!(
                "token {} deposited in cycle {} cannot unstake before cycle {}",
                id,
                info.deposit_cycle,
                u32::from(info.deposit_cycle) + 2
            )));
        }

        let global_saved = self.state.global_history.tail_state();
        self.state
            .global_history
            .update(-i128::from(info.weight), current_cycle)?;
        let staker_history = self
            .state
            .staker_histories
            .get_mut(&caller)
            .ok_or(BallastError::EmptyHistory)?;
        let staker_saved = staker_history.tail_state();
        staker_history.update(-i128::from(info.weight), current_cycle)?;
        let staker_stake = staker_history.last().map(|s| s.stake).unwrap_or(0);
        let global_stake = self
            .state
            .global_history
            .last()
            .map(|s| s.stake)
            .unwrap_or(0);
        self.state.registry.record_withdrawal(&id, current_cycle);

        if let Err(e) = self.return_nft(caller, id) {
            self.state.global_history.restore_tail(global_saved);
            if let Some(history) = self.state.staker_histories.get_mut(&caller) {
                history.restore_tail(staker_saved);
            }
            self.state.registry.restore(id, info);
            return Err(e);
        }

        tracing::info!(
            "Unstaked token {} for {} at cycle {} with weight {}",
            id,
            caller,
            current_cycle,
            info.weight
        );
        self.events.push(VaultEvent::NftUnstaked {
            staker: caller,
            cycle: current_cycle,
            token_id: id,
            weight: info.weight,
        });
        self.events.push(VaultEvent::HistoriesUpdated {
            staker: caller,
            start_cycle: current_cycle,
            staker_stake,
            global_stake,
        });
        Ok(())
    }

    fn return_nft(&self, to: Address, id: TokenId) -> Result<(), BallastError> {
        match self
            .nft_transport
            .safe_transfer_from(self.config.vault_address, to, id, 1, &[])
        {
            Ok(()) => Ok(()),
            Err(safe_err) => {
                tracing::warn!(
                    "Safe transfer of token {} failed ({}), retrying unchecked",
                    id,
                    safe_err
                );
                self.nft_transport
                    .transfer_from(self.config.vault_address, to, id)
                    .map_err(|e| {
                        BallastError::TransferFailed(format!(
                            "both transfer modes failed for token {}: {}",
                            id, e
                        ))
                    })
            }
        }
    }

    // -----------------------------------------------------------------
    // Claims
    // -----------------------------------------------------------------

    /// Compute the claimable reward over up to `max_periods` completed
    /// periods without mutating anything.
    pub fn estimate_rewards(
        &self,
        caller: Address,
        max_periods: u16,
    ) -> Result<ComputedClaim, BallastError> {
        if !self.state.enabled {
            return Err(BallastError::Disabled);
        }
        let current_period = self.current_period()?;
        let cursor = self.state.cursors.get(&caller).copied().unwrap_or_default();
        let empty = StakeHistory::new();
        let staker_history = self.state.staker_histories.get(&caller).unwrap_or(&empty);
        let (computed, _) = compute_claim(
            &self.state.global_history,
            staker_history,
            &self.state.schedule,
            cursor,
            current_period,
            self.config.period_cycles,
            max_periods,
        )?;
        Ok(computed)
    }

    /// Claim the reward over up to `max_periods` completed periods: advance
    /// (or re-initialize) the cursor, debit the pool, and pay out.
    ///
    /// A zero-period result is a no-op. A failed payout rolls the cursor and
    /// pool back.
    pub fn claim_rewards(
        &mut self,
        caller: Address,
        max_periods: u16,
    ) -> Result<ComputedClaim, BallastError> {
        if !self.state.enabled {
            return Err(BallastError::Disabled);
        }
        let current_cycle = self.current_cycle()?;
        let current_period = timegrid::period_of(current_cycle, self.config.period_cycles)?;
        let cursor = self.state.cursors.get(&caller).copied().unwrap_or_default();

        let empty = StakeHistory::new();
        let (computed, new_cursor) = compute_claim(
            &self.state.global_history,
            self.state.staker_histories.get(&caller).unwrap_or(&empty),
            &self.state.schedule,
            cursor,
            current_period,
            self.config.period_cycles,
            max_periods,
        )?;
        if computed.periods == 0 {
            return Ok(computed);
        }

        // A staker who consumed their whole history and holds nothing gets a
        // fresh cursor on their next stake instead of a stale resume point.
        let staker_tail = self
            .state
            .staker_histories
            .get(&caller)
            .and_then(|h| h.last().copied());
        let last_claimed_cycle = (u32::from(computed.start_period) + u32::from(computed.periods)
            - 1)
            * u32::from(self.config.period_cycles);
        let delete_cursor = matches!(
            staker_tail,
            Some(tail) if last_claimed_cycle >= u32::from(tail.start_cycle) && tail.stake == 0
        );

        let old_pool = self.state.total_rewards_pool;
        self.state.total_rewards_pool = old_pool.checked_sub(computed.amount).ok_or_else(|| {
            BallastError::Underflow(format!(
                "claim of {} exceeds rewards pool {}",
                computed.amount, old_pool
            ))
        })?;
        let old_cursor_entry = self.state.cursors.get(&caller).copied();
        if delete_cursor {
            self.state.cursors.remove(&caller);
        } else {
            self.state.cursors.insert(caller, new_cursor);
        }

        if !computed.amount.is_zero() {
            match self.reward_transport.transfer(caller, computed.amount) {
                Ok(true) => {}
                outcome => {
                    self.state.total_rewards_pool = old_pool;
                    match old_cursor_entry {
                        Some(previous) => {
                            self.state.cursors.insert(caller, previous);
                        }
                        None => {
                            self.state.cursors.remove(&caller);
                        }
                    }
                    return Err(transfer_failure("reward payout", outcome));
                }
            }
        }

        // Reclaim the staker-history prefix the cursor has passed.
        if let Some(history) = self.state.staker_histories.get_mut(&caller) {
            for idx in cursor.staker_idx..new_cursor.staker_idx {
                history.zero_entry(idx as usize);
            }
        }

        tracing::info!(
            "Claimed {} over {} periods from period {} for {}",
            computed.amount,
            computed.periods,
            computed.start_period,
            caller
        );
        self.events.push(VaultEvent::RewardsClaimed {
            staker: caller,
            cycle: current_cycle,
            start_period: computed.start_period,
            periods: computed.periods,
            amount: computed.amount,
        });
        Ok(computed)
    }

    // -----------------------------------------------------------------
    // Read surface
    // -----------------------------------------------------------------

    /// Cycle index at the current clock reading.
    pub fn current_cycle(&self) -> Result<Cycle, BallastError> {
        timegrid::cycle_at(
            self.clock.unix_now(),
            self.state.start_timestamp,
            self.config.cycle_seconds,
        )
    }

    /// Period index at the current clock reading.
    pub fn current_period(&self) -> Result<Period, BallastError> {
        timegrid::period_of(self.current_cycle()?, self.config.period_cycles)
    }

    /// Index of the newest global snapshot.
    pub fn last_global_snapshot_index(&self) -> Result<u64, BallastError> {
        Ok(self.state.global_history.last_index()? as u64)
    }

    /// Index of the newest snapshot in a staker's history.
    pub fn last_staker_snapshot_index(&self, staker: Address) -> Result<u64, BallastError> {
        let history = self
            .state
            .staker_histories
            .get(&staker)
            .ok_or(BallastError::EmptyHistory)?;
        Ok(history.last_index()? as u64)
    }

    /// Indexed read of the global history.
    pub fn global_snapshot(&self, idx: u64) -> Option<Snapshot> {
        self.state.global_history.get(idx as usize).copied()
    }

    /// Indexed read of a staker's history.
    pub fn staker_snapshot(&self, staker: Address, idx: u64) -> Option<Snapshot> {
        self.state
            .staker_histories
            .get(&staker)
            .and_then(|h| h.get(idx as usize))
            .copied()
    }

    /// Registry record for a token, if ever staked.
    pub fn token_info(&self, id: TokenId) -> Option<TokenInfo> {
        self.state.registry.get(&id).copied()
    }

    /// A staker's claim cursor; `period == 0` when uninitialized.
    pub fn next_claim(&self, staker: Address) -> NextClaim {
        self.state.cursors.get(&staker).copied().unwrap_or_default()
    }

    /// Per-cycle reward budget of a period.
    pub fn rewards_for_period(&self, period: Period) -> U256 {
        self.state.schedule.rewards_for(period)
    }

    /// Undistributed remainder of the scheduled budget.
    pub fn total_rewards_pool(&self) -> U256 {
        self.state.total_rewards_pool
    }

    /// Whether the vault is still enabled.
    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    /// Whether `start` has been called.
    pub fn is_started(&self) -> bool {
        self.state.start_timestamp != 0
    }

    /// Unix timestamp of cycle 1, or 0 before start.
    pub fn start_timestamp(&self) -> u64 {
        self.state.start_timestamp
    }

    /// The administrative owner.
    pub fn owner(&self) -> Address {
        self.config.owner
    }

    /// The vault configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The full mutable state (persistence snapshot).
    pub fn state(&self) -> &VaultState {
        &self.state
    }

    /// Drain the recorded events in emission order.
    pub fn drain_events(&mut self) -> Vec<VaultEvent> {
        std::mem::take(&mut self.events)
    }

    /// Events recorded since the last drain.
    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    // -----------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------

    fn require_owner(&self, caller: Address) -> Result<(), BallastError> {
        if caller != self.config.owner {
            return Err(BallastError::Unauthorized(format!(
                "{} is not the vault owner",
                caller
            )));
        }
        Ok(())
    }

    fn require_whitelisted(&self, sender: Address) -> Result<(), BallastError> {
        if sender != self.config.nft_transport_address {
            return Err(BallastError::NotWhitelisted(sender.to_string()));
        }
        Ok(())
    }
}

fn transfer_failure(what: &str, outcome: Result<bool, BallastError>) -> BallastError {
    match outcome {
        Ok(_) => BallastError::TransferFailed(format!("{} was refused by the token", what)),
        Err(e) => BallastError::TransferFailed(format!("{}: {}", what, e)),
    }
}
