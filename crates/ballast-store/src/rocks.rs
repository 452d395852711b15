// crates/ballast-store/src/rocks.rs
//
// RocksDB-backed persistence of the vault state.
//
// Key format, one JSON record per key:
//   - `meta`                   -> scalar state (enabled, start, pool)
//   - `history:global`         -> global stake history
//   - `history:staker:{addr}`  -> one staker's stake history
//   - `cursor:{addr}`          -> one staker's claim cursor
//   - `token:{id}`             -> one token's registry record
//   - `schedule`               -> the full reward schedule
//
// `save` rewrites the whole keyspace so removed cursors do not linger as
// stale keys; vault state is modest and operations are serial.

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use rocksdb::{DBWithThreadMode, IteratorMode, MultiThreaded, Options};
use serde::{Deserialize, Serialize};

use ballast_core::error::BallastError;
use ballast_core::types::{NextClaim, TokenInfo};
use ballast_vault::{StakeHistory, VaultState};

const META_KEY: &str = "meta";
const GLOBAL_HISTORY_KEY: &str = "history:global";
const SCHEDULE_KEY: &str = "schedule";
const STAKER_HISTORY_PREFIX: &str = "history:staker:";
const CURSOR_PREFIX: &str = "cursor:";
const TOKEN_PREFIX: &str = "token:";

/// Scalar portion of the vault state.
#[derive(Debug, Serialize, Deserialize)]
struct MetaRecord {
    enabled: bool,
    start_timestamp: u64,
    total_rewards_pool: U256,
}

/// Durable key/value store for vault state.
#[derive(Debug)]
pub struct VaultStore {
    db: DBWithThreadMode<MultiThreaded>,
}

impl VaultStore {
    /// Open (or create) a store at the given filesystem path.
    pub fn open(path: &str) -> Result<Self, BallastError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DBWithThreadMode::<MultiThreaded>::open(&opts, path).map_err(|e| {
            BallastError::Storage(format!("failed to open RocksDB at {}: {}", path, e))
        })?;

        Ok(Self { db })
    }

    /// Persist the complete vault state.
    pub fn save(&self, state: &VaultState) -> Result<(), BallastError> {
        self.clear()?;

        let meta = MetaRecord {
            enabled: state.enabled,
            start_timestamp: state.start_timestamp,
            total_rewards_pool: state.total_rewards_pool,
        };
        self.put_json(META_KEY.as_bytes(), &meta)?;
        self.put_json(GLOBAL_HISTORY_KEY.as_bytes(), &state.global_history)?;
        self.put_json(SCHEDULE_KEY.as_bytes(), &state.schedule)?;

        for (staker, history) in &state.staker_histories {
            let key = format!("{}{}", STAKER_HISTORY_PREFIX, staker);
            self.put_json(key.as_bytes(), history)?;
        }
        for (staker, cursor) in &state.cursors {
            let key = format!("{}{}", CURSOR_PREFIX, staker);
            self.put_json(key.as_bytes(), cursor)?;
        }
        for (id, info) in state.registry.iter() {
            let key = format!("{}{}", TOKEN_PREFIX, id);
            self.put_json(key.as_bytes(), info)?;
        }
        Ok(())
    }

    /// Load the complete vault state, or `None` if the store has never been
    /// saved to.
    pub fn load(&self) -> Result<Option<VaultState>, BallastError> {
        let meta: MetaRecord = match self.get_json(META_KEY.as_bytes())? {
            Some(meta) => meta,
            None => return Ok(None),
        };

        let mut state = VaultState::new();
        state.enabled = meta.enabled;
        state.start_timestamp = meta.start_timestamp;
        state.total_rewards_pool = meta.total_rewards_pool;
        if let Some(history) = self.get_json(GLOBAL_HISTORY_KEY.as_bytes())? {
            state.global_history = history;
        }
        if let Some(schedule) = self.get_json(SCHEDULE_KEY.as_bytes())? {
            state.schedule = schedule;
        }

        for entry in self.db.iterator(IteratorMode::Start) {
            let (key, value) =
                entry.map_err(|e| BallastError::Storage(format!("RocksDB scan failed: {}", e)))?;
            let key = String::from_utf8_lossy(&key).to_string();

            if let Some(addr) = key.strip_prefix(STAKER_HISTORY_PREFIX) {
                let history: StakeHistory = serde_json::from_slice(&value)?;
                state
                    .staker_histories
                    .insert(parse_address(addr)?, history);
            } else if let Some(addr) = key.strip_prefix(CURSOR_PREFIX) {
                let cursor: NextClaim = serde_json::from_slice(&value)?;
                state.cursors.insert(parse_address(addr)?, cursor);
            } else if let Some(id) = key.strip_prefix(TOKEN_PREFIX) {
                let info: TokenInfo = serde_json::from_slice(&value)?;
                let id = U256::from_str(id).map_err(|e| {
                    BallastError::Storage(format!("malformed token key {}: {}", key, e))
                })?;
                state.registry.insert(id, info);
            }
        }

        Ok(Some(state))
    }

    /// Delete every key in the store.
    fn clear(&self) -> Result<(), BallastError> {
        let keys: Vec<Box<[u8]>> = self
            .db
            .iterator(IteratorMode::Start)
            .map(|entry| entry.map(|(key, _)| key))
            .collect::<Result<_, _>>()
            .map_err(|e| BallastError::Storage(format!("RocksDB scan failed: {}", e)))?;
        for key in keys {
            self.db
                .delete(&key)
                .map_err(|e| BallastError::Storage(format!("RocksDB delete failed: {}", e)))?;
        }
        Ok(())
    }

    fn put_json<T: Serialize>(&self, key: &[u8], value: &T) -> Result<(), BallastError> {
        let json = serde_json::to_vec(value)?;
        self.db
            .put(key, json)
            .map_err(|e| BallastError::Storage(format!("RocksDB put failed: {}", e)))
    }

    fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        key: &[u8],
    ) -> Result<Option<T>, BallastError> {
        let bytes = self
            .db
            .get(key)
            .map_err(|e| BallastError::Storage(format!("RocksDB get failed: {}", e)))?;
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn parse_address(s: &str) -> Result<Address, BallastError> {
    Address::from_str(s)
        .map_err(|e| BallastError::Storage(format!("malformed address key {}: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Temporary database path, uuid-suffixed to avoid collisions.
    fn temp_db_path(label: &str) -> String {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("ballast_test_{}_{}", label, Uuid::now_v7()));
        path.to_string_lossy().to_string()
    }

    fn sample_state() -> VaultState {
        let staker = Address::repeat_byte(0x11);
        let mut state = VaultState::new();
        state.start_timestamp = 1_700_000_000;
        state.total_rewards_pool = U256::from(14_000u64);
        state.global_history.update(4, 1).unwrap();
        state.global_history.update(-1, 9).unwrap();

        let mut history = StakeHistory::new();
        history.update(1, 1).unwrap();
        state.staker_histories.insert(staker, history);
        state.cursors.insert(
            staker,
            NextClaim {
                period: 2,
                global_idx: 1,
                staker_idx: 0,
            },
        );
        state.registry.insert(
            U256::from(42u64),
            TokenInfo {
                owner: Some(staker),
                weight: 1,
                deposit_cycle: 1,
                withdraw_cycle: 0,
            },
        );
        state.schedule.add(1, 2, U256::from(1000u64)).unwrap();
        state
    }

    #[test]
    fn test_load_of_fresh_store_is_none() {
        let store = VaultStore::open(&temp_db_path("fresh")).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = VaultStore::open(&temp_db_path("round_trip")).unwrap();
        let state = sample_state();
        store.save(&state).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_save_drops_stale_keys() {
        let store = VaultStore::open(&temp_db_path("stale")).unwrap();
        let mut state = sample_state();
        store.save(&state).unwrap();

        // A claim re-initialization removes the cursor; a later save must
        // not resurrect it.
        state.cursors.clear();
        store.save(&state).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert!(loaded.cursors.is_empty());
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_reopen_preserves_state() {
        let path = temp_db_path("reopen");
        let state = sample_state();
        {
            let store = VaultStore::open(&path).unwrap();
            store.save(&state).unwrap();
        }
        let store = VaultStore::open(&path).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, state);
    }
}
