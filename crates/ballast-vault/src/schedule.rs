// crates/ballast-vault/src/schedule.rs
//
// Per-period reward budgets.
//
// Each period p has a rewards_per_cycle budget paid out pro rata over the
// period's cycles. Budgets are monotonically additive: administrative writes
// only ever add to a period, and committed (past) periods are never edited.

use std::collections::BTreeMap;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use ballast_core::error::BallastError;
use ballast_core::types::Period;

/// Period → rewards_per_cycle mapping. Absent periods pay zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSchedule {
    rewards: BTreeMap<Period, U256>,
}

impl RewardSchedule {
    /// Create an empty schedule.
    pub fn new() -> Self {
        Self {
            rewards: BTreeMap::new(),
        }
    }

    /// The per-cycle budget of a period, zero if never funded.
    pub fn rewards_for(&self, period: Period) -> U256 {
        self.rewards.get(&period).copied().unwrap_or(U256::ZERO)
    }

    /// Add `rewards_per_cycle` to every period in `[start_period, end_period]`.
    ///
    /// Applied atomically: all additions are checked before any is written.
    ///
    /// # Errors
    /// - `BadRange` when `start_period` is 0 or `end_period < start_period`.
    /// - `Overflow` when any period's accumulated budget exceeds `U256`.
    pub fn add(
        &mut self,
        start_period: Period,
        end_period: Period,
        rewards_per_cycle: U256,
    ) -> Result<(), BallastError> {
        if start_period == 0 || end_period < start_period {
            return Err(BallastError::BadRange(format!(
                "invalid period range [{}, {}]",
                start_period, end_period
            )));
        }

        let mut updated = Vec::with_capacity(usize::from(end_period - start_period) + 1);
        for period in start_period..=end_period {
            let new_budget = self
                .rewards_for(period)
                .checked_add(rewards_per_cycle)
                .ok_or_else(|| {
                    BallastError::Overflow(format!("rewards budget for period {} exceeds U256", period))
                })?;
            updated.push((period, new_budget));
        }
        for (period, budget) in updated {
            self.rewards.insert(period, budget);
        }
        Ok(())
    }

    /// Undo a successful `add` with the same arguments (operation rollback).
    pub(crate) fn subtract(
        &mut self,
        start_period: Period,
        end_period: Period,
        rewards_per_cycle: U256,
    ) {
        for period in start_period..=end_period {
            if let Some(budget) = self.rewards.get_mut(&period) {
                *budget = budget.saturating_sub(rewards_per_cycle);
            }
        }
    }

    /// All funded periods, in order (persistence).
    pub fn iter(&self) -> impl Iterator<Item = (&Period, &U256)> {
        self.rewards.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfunded_period_pays_zero() {
        let schedule = RewardSchedule::new();
        assert_eq!(schedule.rewards_for(1), U256::ZERO);
    }

    #[test]
    fn test_add_range() {
        let mut schedule = RewardSchedule::new();
        schedule.add(2, 4, U256::from(1000u64)).unwrap();
        assert_eq!(schedule.rewards_for(1), U256::ZERO);
        assert_eq!(schedule.rewards_for(2), U256::from(1000u64));
        assert_eq!(schedule.rewards_for(4), U256::from(1000u64));
        assert_eq!(schedule.rewards_for(5), U256::ZERO);
    }

    #[test]
    fn test_add_is_additive() {
        let mut schedule = RewardSchedule::new();
        schedule.add(1, 2, U256::from(1000u64)).unwrap();
        schedule.add(2, 3, U256::from(500u64)).unwrap();
        assert_eq!(schedule.rewards_for(1), U256::from(1000u64));
        assert_eq!(schedule.rewards_for(2), U256::from(1500u64));
        assert_eq!(schedule.rewards_for(3), U256::from(500u64));
    }

    #[test]
    fn test_add_rejects_bad_ranges() {
        let mut schedule = RewardSchedule::new();
        assert!(matches!(
            schedule.add(0, 1, U256::from(1u64)),
            Err(BallastError::BadRange(_))
        ));
        assert!(matches!(
            schedule.add(3, 2, U256::from(1u64)),
            Err(BallastError::BadRange(_))
        ));
    }

    #[test]
    fn test_add_overflow_leaves_schedule_untouched() {
        let mut schedule = RewardSchedule::new();
        schedule.add(1, 2, U256::MAX).unwrap();
        assert!(matches!(
            schedule.add(1, 2, U256::from(1u64)),
            Err(BallastError::Overflow(_))
        ));
        assert_eq!(schedule.rewards_for(1), U256::MAX);
        assert_eq!(schedule.rewards_for(2), U256::MAX);
    }

    #[test]
    fn test_subtract_reverts_add() {
        let mut schedule = RewardSchedule::new();
        schedule.add(1, 3, U256::from(700u64)).unwrap();
        schedule.subtract(1, 3, U256::from(700u64));
        for period in 1..=3 {
            assert_eq!(schedule.rewards_for(period), U256::ZERO);
        }
    }
}
