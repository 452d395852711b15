// crates/ballast-vault/src/lib.rs
//
// ballast-vault: the staking vault itself: snapshot histories, token
// registry, reward schedule, claim engine, and the controller facade.
//
// Depositors accrue a weight-proportional share of a period-budgeted reward
// stream; the claim engine walks the piecewise-constant global and
// per-staker stake histories to compute exact rewards over completed
// periods, resuming from a per-staker cursor.

pub mod claim;
pub mod config;
pub mod events;
pub mod history;
pub mod registry;
pub mod schedule;
pub mod vault;
pub mod weight;

// Re-export key types for ergonomic access from downstream crates.
pub use claim::compute_claim;
pub use config::{VaultConfig, MIN_CYCLE_SECONDS, MIN_PERIOD_CYCLES};
pub use events::VaultEvent;
pub use history::StakeHistory;
pub use registry::TokenRegistry;
pub use schedule::RewardSchedule;
pub use vault::{NftVault, VaultState, BATCH_RECEIPT, SINGLE_RECEIPT};
pub use weight::{TypedAttributeWeights, STAKEABLE_TOKEN_TYPE};
