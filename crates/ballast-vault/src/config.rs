// crates/ballast-vault/src/config.rs
//
// Immutable vault configuration, fixed at construction.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use ballast_core::error::BallastError;

/// Smallest permitted cycle width, in seconds.
pub const MIN_CYCLE_SECONDS: u32 = 60;

/// Smallest permitted period length, in cycles.
pub const MIN_PERIOD_CYCLES: u16 = 2;

/// Immutable configuration of one vault instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Width of one reward-accrual cycle, in seconds.
    pub cycle_seconds: u32,
    /// Number of cycles per reward period.
    pub period_cycles: u16,
    /// Identity of the vault itself, used as the custody address in NFT
    /// transfers and as the recipient of scheduled reward funding.
    pub vault_address: Address,
    /// Administrative owner: may start, disable, schedule rewards, and drain
    /// the pool once disabled.
    pub owner: Address,
    /// The only sender the NFT receiver hooks accept.
    pub nft_transport_address: Address,
}

impl VaultConfig {
    /// Validate the immutable parameters.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when `cycle_seconds < 60` or
    /// `period_cycles < 2`.
    pub fn validate(&self) -> Result<(), BallastError> {
        if self.cycle_seconds < MIN_CYCLE_SECONDS {
            return Err(BallastError::InvalidConfig(format!(
                "cycle_seconds must be at least {}, got {}",
                MIN_CYCLE_SECONDS, self.cycle_seconds
            )));
        }
        if self.period_cycles < MIN_PERIOD_CYCLES {
            return Err(BallastError::InvalidConfig(format!(
                "period_cycles must be at least {}, got {}",
                MIN_PERIOD_CYCLES, self.period_cycles
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> VaultConfig {
        VaultConfig {
            cycle_seconds: 60,
            period_cycles: 7,
            vault_address: Address::repeat_byte(0x01),
            owner: Address::repeat_byte(0x02),
            nft_transport_address: Address::repeat_byte(0x03),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_cycle_seconds_too_small() {
        let mut config = base_config();
        config.cycle_seconds = 59;
        assert!(matches!(
            config.validate(),
            Err(BallastError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_period_cycles_too_small() {
        let mut config = base_config();
        config.period_cycles = 1;
        assert!(matches!(
            config.validate(),
            Err(BallastError::InvalidConfig(_))
        ));
    }
}
