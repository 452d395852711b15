// crates/ballast-store/src/lib.rs
//
// ballast-store: RocksDB-backed durable key/value persistence of the vault
// state. The embedder saves after each operation boundary and restores with
// `NftVault::from_state` on startup.

pub mod rocks;

pub use rocks::VaultStore;
