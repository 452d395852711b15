// crates/ballast-core/src/timegrid.rs
//
// Pure time-grid arithmetic: wall-clock timestamps map to 1-based cycle
// indices, cycles map to 1-based period indices.
//
// Cycle 1 begins at start_timestamp and every cycle is cycle_seconds wide.
// A period is a run of period_cycles consecutive cycles; the first cycle of
// period p is (p - 1) * period_cycles + 1.

use crate::error::BallastError;
use crate::types::{Cycle, Period};

/// Map a unix timestamp to its cycle index.
///
/// # Errors
/// - `NotStarted` if `start_timestamp` is 0.
/// - `PreStart` if `ts` precedes `start_timestamp`.
/// - `Overflow` if the cycle index exceeds `u16`.
pub fn cycle_at(ts: u64, start_timestamp: u64, cycle_seconds: u32) -> Result<Cycle, BallastError> {
    if start_timestamp == 0 {
        return Err(BallastError::NotStarted);
    }
    if ts < start_timestamp {
        return Err(BallastError::PreStart(format!(
            "timestamp {} precedes start timestamp {}",
            ts, start_timestamp
        )));
    }
    let cycle = (ts - start_timestamp) / u64::from(cycle_seconds) + 1;
    Cycle::try_from(cycle)
        .map_err(|_| BallastError::Overflow(format!("cycle index {} exceeds u16", cycle)))
}

/// Map a cycle index to its period index.
///
/// # Errors
/// Returns `BadRange` for cycle 0 (cycles are 1-based).
pub fn period_of(cycle: Cycle, period_cycles: u16) -> Result<Period, BallastError> {
    if cycle == 0 {
        return Err(BallastError::BadRange("cycle 0 has no period".to_string()));
    }
    Ok((cycle - 1) / period_cycles + 1)
}

/// First cycle of the given period, in `u32` so period boundaries near the
/// top of the `u16` cycle range stay representable.
pub fn first_cycle_of(period: Period, period_cycles: u16) -> u32 {
    (u32::from(period) - 1) * u32::from(period_cycles) + 1
}

/// First cycle of the period after the given one, i.e. the exclusive end
/// bound used by the claim walker.
pub fn period_end_exclusive(period: Period, period_cycles: u16) -> u32 {
    u32::from(period) * u32::from(period_cycles) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: u64 = 1_700_000_000;
    const CYCLE_SECONDS: u32 = 60;
    const PERIOD_CYCLES: u16 = 7;

    #[test]
    fn test_cycle_at_start_is_one() {
        assert_eq!(cycle_at(START, START, CYCLE_SECONDS).unwrap(), 1);
    }

    #[test]
    fn test_cycle_at_boundaries() {
        // Last second of cycle 1, first second of cycle 2.
        assert_eq!(cycle_at(START + 59, START, CYCLE_SECONDS).unwrap(), 1);
        assert_eq!(cycle_at(START + 60, START, CYCLE_SECONDS).unwrap(), 2);
    }

    #[test]
    fn test_cycle_at_not_started() {
        assert!(matches!(
            cycle_at(START, 0, CYCLE_SECONDS),
            Err(BallastError::NotStarted)
        ));
    }

    #[test]
    fn test_cycle_at_pre_start() {
        assert!(matches!(
            cycle_at(START - 1, START, CYCLE_SECONDS),
            Err(BallastError::PreStart(_))
        ));
    }

    #[test]
    fn test_cycle_at_overflow() {
        let far = START + u64::from(CYCLE_SECONDS) * 70_000;
        assert!(matches!(
            cycle_at(far, START, CYCLE_SECONDS),
            Err(BallastError::Overflow(_))
        ));
    }

    #[test]
    fn test_period_of_boundaries() {
        assert_eq!(period_of(1, PERIOD_CYCLES).unwrap(), 1);
        assert_eq!(period_of(PERIOD_CYCLES, PERIOD_CYCLES).unwrap(), 1);
        assert_eq!(period_of(PERIOD_CYCLES + 1, PERIOD_CYCLES).unwrap(), 2);
    }

    #[test]
    fn test_period_of_cycle_zero() {
        assert!(matches!(
            period_of(0, PERIOD_CYCLES),
            Err(BallastError::BadRange(_))
        ));
    }

    #[test]
    fn test_period_bounds() {
        assert_eq!(first_cycle_of(1, PERIOD_CYCLES), 1);
        assert_eq!(first_cycle_of(3, PERIOD_CYCLES), 15);
        assert_eq!(period_end_exclusive(1, PERIOD_CYCLES), 8);
        assert_eq!(period_end_exclusive(2, PERIOD_CYCLES), 15);
    }
}
