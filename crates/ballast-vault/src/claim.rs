// crates/ballast-vault/src/claim.rs
//
// The claim engine: a period-by-period, segment-by-segment walk over the
// global and per-staker stake histories.
//
// Over any half-open cycle interval the global stake, the staker's stake,
// and the per-cycle reward are each piecewise-constant. The inner loop
// advances `start` to the earliest cycle where all three pieces overlap and
// `end` to the earliest boundary any of them crosses, so
// (end - start) * rewards_per_cycle * staker_stake / global_stake is the
// exact contribution of that sub-interval. `end` strictly increases and is
// bounded by the period's exclusive end, so the walk terminates.

use alloy_primitives::U256;

use ballast_core::error::BallastError;
use ballast_core::timegrid::{first_cycle_of, period_end_exclusive};
use ballast_core::types::{ComputedClaim, NextClaim, Period, Snapshot};

use crate::history::StakeHistory;
use crate::schedule::RewardSchedule;

/// Compute the reward owed to one staker over up to `max_periods` completed
/// periods, resuming from `cursor`.
///
/// Pure: reads the histories and schedule, mutates nothing. Returns the
/// computed claim and the advanced cursor; when nothing is claimable
/// (`max_periods` 0, empty global history, uninitialized cursor, or the
/// cursor already at the current period) the result has `periods == 0` and
/// the cursor is returned unchanged.
pub fn compute_claim(
    global: &StakeHistory,
    staker: &StakeHistory,
    schedule: &RewardSchedule,
    cursor: NextClaim,
    current_period: Period,
    period_cycles: u16,
    max_periods: u16,
) -> Result<(ComputedClaim, NextClaim), BallastError> {
    if max_periods == 0
        || global.is_empty()
        || !cursor.is_initialized()
        || cursor.period >= current_period
    {
        return Ok((ComputedClaim::empty(cursor.period), cursor));
    }

    let periods_to_claim = max_periods.min(current_period - cursor.period);
    let end_period = cursor.period + periods_to_claim;

    let mut global_idx = usize::try_from(cursor.global_idx)
        .map_err(|_| BallastError::BadRange("global snapshot index exceeds usize".to_string()))?;
    let mut staker_idx = usize::try_from(cursor.staker_idx)
        .map_err(|_| BallastError::BadRange("staker snapshot index exceeds usize".to_string()))?;

    let mut g = *global.get(global_idx).ok_or_else(|| {
        BallastError::BadRange(format!("global snapshot index {} out of range", global_idx))
    })?;
    let mut s = *staker.get(staker_idx).ok_or_else(|| {
        BallastError::BadRange(format!("staker snapshot index {} out of range", staker_idx))
    })?;
    let mut g_next = next_or_sentinel(global, global_idx);
    let mut s_next = next_or_sentinel(staker, staker_idx);

    let mut amount = U256::ZERO;

    for period in cursor.period..end_period {
        let next_period_start = period_end_exclusive(period, period_cycles);
        let reward_per_cycle = schedule.rewards_for(period);
        let mut start = first_cycle_of(period, period_cycles);
        let mut end: u32 = 0;

        while end != next_period_start {
            // First cycle at which the global segment, the staker segment,
            // and the current period all overlap.
            start = start
                .max(u32::from(g.start_cycle))
                .max(u32::from(s.start_cycle));

            // Earliest boundary any of the three pieces crosses. A sentinel
            // start_cycle of 0 means "no next segment".
            end = next_period_start;
            let g_boundary = u32::from(g_next.start_cycle);
            if g_boundary != 0 && g_boundary < end {
                end = g_boundary;
            }
            let s_boundary = u32::from(s_next.start_cycle);
            if s_boundary != 0 && s_boundary < end {
                end = s_boundary;
            }

            if end > start && g.stake != 0 && s.stake != 0 && !reward_per_cycle.is_zero() {
                let contribution = U256::from(end - start)
                    .checked_mul(reward_per_cycle)
                    .and_then(|v| v.checked_mul(U256::from(s.stake)))
                    .ok_or_else(|| {
                        BallastError::Overflow(
                            "claim numerator exceeds 256 bits".to_string(),
                        )
                    })?
                    / U256::from(g.stake);
                amount = amount.checked_add(contribution).ok_or_else(|| {
                    BallastError::Overflow("claim amount exceeds U256".to_string())
                })?;
            }

            if u32::from(g_next.start_cycle) == end {
                global_idx += 1;
                g = g_next;
                g_next = next_or_sentinel(global, global_idx);
            }
            if u32::from(s_next.start_cycle) == end {
                staker_idx += 1;
                s = s_next;
                s_next = next_or_sentinel(staker, staker_idx);
            }
        }
    }

    let computed = ComputedClaim {
        start_period: cursor.period,
        periods: periods_to_claim,
        amount,
    };
    let new_cursor = NextClaim {
        period: end_period,
        global_idx: global_idx as u64,
        staker_idx: staker_idx as u64,
    };
    Ok((computed, new_cursor))
}

fn next_or_sentinel(history: &StakeHistory, idx: usize) -> Snapshot {
    history.get(idx + 1).copied().unwrap_or(Snapshot::ZERO)
}
