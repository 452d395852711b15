// crates/ballast-core/src/lib.rs
//
// ballast-core: canonical types, error enum, time-grid arithmetic, and
// capability traits for the Ballast staking engine.
//
// This is the leaf crate the rest of the workspace depends on.

pub mod error;
pub mod timegrid;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic access from downstream crates.
pub use error::BallastError;
pub use traits::{Clock, ManualClock, NftTransport, RewardTransport, SystemClock, WeightPolicy};
pub use types::{ComputedClaim, Cycle, NextClaim, Period, Snapshot, TokenId, TokenInfo, Weight};
