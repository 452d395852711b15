use thiserror::Error;

/// Error types shared across the Ballast workspace.
///
/// Every operation is all-or-nothing: any of these aborts the operation
/// with no observable state change.
#[derive(Debug, Error)]
pub enum BallastError {
    /// Operation requires staking to have started.
    #[error("staking has not started")]
    NotStarted,

    /// `start` called a second time.
    #[error("staking has already started")]
    AlreadyStarted,

    /// Operation requires the vault to be enabled.
    #[error("the vault has been disabled")]
    Disabled,

    /// Operation requires the vault to be disabled.
    #[error("the vault is still enabled")]
    Enabled,

    /// Caller is not allowed to perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A period or index argument is out of range.
    #[error("bad range: {0}")]
    BadRange(String),

    /// Unstake attempted before two full cycles elapsed since deposit.
    #[error("frozen: {0}")]
    Frozen(String),

    /// Re-stake attempted in the same cycle as the previous unstake.
    #[error("cooldown: {0}")]
    Cooldown(String),

    /// An underlying token transfer failed or returned false.
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    /// NFT receiver hook invoked by a sender other than the whitelisted transport.
    #[error("sender is not the whitelisted NFT transport: {0}")]
    NotWhitelisted(String),

    /// A last-snapshot index was requested of an empty history.
    #[error("snapshot history is empty")]
    EmptyHistory,

    /// A cycle was requested for a timestamp preceding the start timestamp.
    #[error("timestamp predates the staking start: {0}")]
    PreStart(String),

    /// Checked arithmetic overflowed.
    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    /// Checked arithmetic underflowed.
    #[error("arithmetic underflow: {0}")]
    Underflow(String),

    /// The weight policy rejected a token id.
    #[error("unsupported token: {0}")]
    UnsupportedToken(String),

    /// Constructor-time configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Storage layer error (RocksDB).
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BallastError {
    fn from(e: serde_json::Error) -> Self {
        BallastError::Serialization(e.to_string())
    }
}
