// crates/ballast-vault/src/history.rs
//
// Append-only piecewise-constant stake histories.
//
// A history is a sequence of snapshots with strictly increasing start_cycle.
// The only permitted mutations are appending a new tail, coalescing into the
// tail when it already starts at the current cycle, and zeroing entries the
// claim cursor has passed (storage reclaim; the claim walker never re-reads
// them).

use serde::{Deserialize, Serialize};

use ballast_core::error::BallastError;
use ballast_core::types::{Cycle, Snapshot};

/// One stake history: the global total or a single staker's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeHistory {
    snapshots: Vec<Snapshot>,
}

impl StakeHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self {
            snapshots: Vec::new(),
        }
    }

    /// Apply a signed stake delta at the given cycle.
    ///
    /// On an empty history the delta must be positive and seeds the first
    /// snapshot. Otherwise the tail stake is adjusted exactly: the result
    /// overwrites the tail when `tail.start_cycle == current_cycle`, and is
    /// appended as a new tail otherwise. Returns the index written.
    ///
    /// # Errors
    /// - `Underflow` when the delta would take the total below zero, or when
    ///   the history is empty and the delta is not positive.
    /// - `Overflow` when the new total exceeds `u128`.
    pub fn update(&mut self, delta: i128, current_cycle: Cycle) -> Result<usize, BallastError> {
        match self.snapshots.last_mut() {
            None => {
                if delta <= 0 {
                    return Err(BallastError::Underflow(format!(
                        "first stake delta must be positive, got {}",
                        delta
                    )));
                }
                self.snapshots.push(Snapshot {
                    stake: delta as u128,
                    start_cycle: current_cycle,
                });
                Ok(0)
            }
            Some(tail) => {
                let new_stake = apply_delta(tail.stake, delta)?;
                if tail.start_cycle == current_cycle {
                    tail.stake = new_stake;
                    Ok(self.snapshots.len() - 1)
                } else {
                    self.snapshots.push(Snapshot {
                        stake: new_stake,
                        start_cycle: current_cycle,
                    });
                    Ok(self.snapshots.len() - 1)
                }
            }
        }
    }

    /// Number of snapshots, including any zeroed reclaimed entries.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the history has no snapshots at all.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshot at the given index.
    pub fn get(&self, idx: usize) -> Option<&Snapshot> {
        self.snapshots.get(idx)
    }

    /// The tail snapshot.
    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Index of the tail snapshot.
    ///
    /// # Errors
    /// Returns `EmptyHistory` when the history has no snapshots.
    pub fn last_index(&self) -> Result<usize, BallastError> {
        if self.snapshots.is_empty() {
            Err(BallastError::EmptyHistory)
        } else {
            Ok(self.snapshots.len() - 1)
        }
    }

    /// All snapshots, in order.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Piecewise-constant lookup: the stake in effect at `cycle`, 0 before
    /// the first snapshot. Reclaimed (zeroed) entries read as stake 0.
    pub fn stake_at(&self, cycle: Cycle) -> u128 {
        self.snapshots
            .iter()
            .rev()
            .find(|s| s.start_cycle <= cycle)
            .map(|s| s.stake)
            .unwrap_or(0)
    }

    /// Overwrite a consumed entry with zeros. Reclaim only; callers must
    /// have advanced every cursor past `idx`.
    pub(crate) fn zero_entry(&mut self, idx: usize) {
        if let Some(entry) = self.snapshots.get_mut(idx) {
            *entry = Snapshot::ZERO;
        }
    }

    /// Capture the tail so an in-flight operation can be rolled back.
    pub(crate) fn tail_state(&self) -> (usize, Option<Snapshot>) {
        (self.snapshots.len(), self.snapshots.last().copied())
    }

    /// Undo a single `update` by restoring a captured tail state.
    pub(crate) fn restore_tail(&mut self, saved: (usize, Option<Snapshot>)) {
        let (len, tail) = saved;
        self.snapshots.truncate(len);
        if let (Some(current), Some(saved_tail)) = (self.snapshots.last_mut(), tail) {
            *current = saved_tail;
        }
    }
}

fn apply_delta(stake: u128, delta: i128) -> Result<u128, BallastError> {
    if delta >= 0 {
        stake.checked_add(delta as u128).ok_or_else(|| {
            BallastError::Overflow(format!("stake {} + {} exceeds u128", stake, delta))
        })
    } else {
        stake.checked_sub(delta.unsigned_abs()).ok_or_else(|| {
            BallastError::Underflow(format!("stake {} - {} is negative", stake, delta.unsigned_abs()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_update_seeds_history() {
        let mut history = StakeHistory::new();
        let idx = history.update(5, 3).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(
            history.last(),
            Some(&Snapshot {
                stake: 5,
                start_cycle: 3
            })
        );
    }

    #[test]
    fn test_first_update_must_be_positive() {
        let mut history = StakeHistory::new();
        assert!(matches!(
            history.update(0, 1),
            Err(BallastError::Underflow(_))
        ));
        assert!(matches!(
            history.update(-1, 1),
            Err(BallastError::Underflow(_))
        ));
    }

    #[test]
    fn test_same_cycle_coalesces_into_tail() {
        let mut history = StakeHistory::new();
        history.update(5, 3).unwrap();
        let idx = history.update(2, 3).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().unwrap().stake, 7);
    }

    #[test]
    fn test_new_cycle_appends() {
        let mut history = StakeHistory::new();
        history.update(5, 3).unwrap();
        let idx = history.update(-2, 4).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(history.len(), 2);
        assert_eq!(
            history.last(),
            Some(&Snapshot {
                stake: 3,
                start_cycle: 4
            })
        );
    }

    #[test]
    fn test_underflow_rejected() {
        let mut history = StakeHistory::new();
        history.update(5, 3).unwrap();
        assert!(matches!(
            history.update(-6, 4),
            Err(BallastError::Underflow(_))
        ));
        // Failed update leaves the history untouched.
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().unwrap().stake, 5);
    }

    #[test]
    fn test_overflow_rejected() {
        let mut history = StakeHistory::new();
        history.update(i128::MAX, 1).unwrap();
        assert!(matches!(
            history.update(i128::MAX, 2),
            Err(BallastError::Overflow(_))
        ));
    }

    #[test]
    fn test_last_index() {
        let mut history = StakeHistory::new();
        assert!(matches!(
            history.last_index(),
            Err(BallastError::EmptyHistory)
        ));
        history.update(1, 1).unwrap();
        history.update(1, 5).unwrap();
        assert_eq!(history.last_index().unwrap(), 1);
    }

    #[test]
    fn test_stake_at() {
        let mut history = StakeHistory::new();
        history.update(5, 3).unwrap();
        history.update(2, 6).unwrap();
        assert_eq!(history.stake_at(1), 0);
        assert_eq!(history.stake_at(3), 5);
        assert_eq!(history.stake_at(5), 5);
        assert_eq!(history.stake_at(6), 7);
        assert_eq!(history.stake_at(100), 7);
    }

    #[test]
    fn test_restore_tail_after_append() {
        let mut history = StakeHistory::new();
        history.update(5, 3).unwrap();
        let saved = history.tail_state();
        history.update(-5, 7).unwrap();
        history.restore_tail(saved);
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().unwrap().stake, 5);
    }

    #[test]
    fn test_restore_tail_after_coalesce() {
        let mut history = StakeHistory::new();
        history.update(5, 3).unwrap();
        let saved = history.tail_state();
        history.update(4, 3).unwrap();
        history.restore_tail(saved);
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().unwrap().stake, 5);
    }
}
