// crates/ballast-vault/src/registry.rs
//
// Registry of every NFT the vault has ever custodied.
//
// Records are created on first deposit and mutated in place; they are never
// deleted, because withdraw_cycle must survive owner clearing to enforce the
// re-stake cooldown.

use std::collections::HashMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use ballast_core::types::{Cycle, TokenId, TokenInfo, Weight};

/// TokenId → TokenInfo mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRegistry {
    tokens: HashMap<TokenId, TokenInfo>,
}

impl TokenRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }

    /// Record for a token, if the vault has ever seen it.
    pub fn get(&self, id: &TokenId) -> Option<&TokenInfo> {
        self.tokens.get(id)
    }

    /// Record a deposit: sets owner, weight, and deposit cycle, and clears
    /// the withdraw cycle.
    pub fn record_deposit(&mut self, id: TokenId, owner: Address, weight: Weight, cycle: Cycle) {
        self.tokens.insert(
            id,
            TokenInfo {
                owner: Some(owner),
                weight,
                deposit_cycle: cycle,
                withdraw_cycle: 0,
            },
        );
    }

    /// Record a withdrawal: clears the owner and stamps the withdraw cycle.
    /// No-op for unknown tokens.
    pub fn record_withdrawal(&mut self, id: &TokenId, cycle: Cycle) {
        if let Some(info) = self.tokens.get_mut(id) {
            info.owner = None;
            info.withdraw_cycle = cycle;
        }
    }

    /// Restore a previously captured record (operation rollback).
    pub fn restore(&mut self, id: TokenId, info: TokenInfo) {
        self.tokens.insert(id, info);
    }

    /// Iterate all records (persistence).
    pub fn iter(&self) -> impl Iterator<Item = (&TokenId, &TokenInfo)> {
        self.tokens.iter()
    }

    /// Insert a record verbatim (persistence restore).
    pub fn insert(&mut self, id: TokenId, info: TokenInfo) {
        self.tokens.insert(id, info);
    }

    /// Number of tokens ever custodied.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the registry has no records.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn staker() -> Address {
        Address::repeat_byte(0x11)
    }

    #[test]
    fn test_deposit_then_withdrawal() {
        let mut registry = TokenRegistry::new();
        let id = U256::from(42u64);

        registry.record_deposit(id, staker(), 10, 3);
        let info = *registry.get(&id).unwrap();
        assert_eq!(info.owner, Some(staker()));
        assert_eq!(info.weight, 10);
        assert_eq!(info.deposit_cycle, 3);
        assert_eq!(info.withdraw_cycle, 0);

        registry.record_withdrawal(&id, 9);
        let info = *registry.get(&id).unwrap();
        assert_eq!(info.owner, None);
        assert_eq!(info.withdraw_cycle, 9);
        // Weight survives owner clearing.
        assert_eq!(info.weight, 10);
    }

    #[test]
    fn test_redeposit_clears_withdraw_cycle() {
        let mut registry = TokenRegistry::new();
        let id = U256::from(42u64);

        registry.record_deposit(id, staker(), 10, 3);
        registry.record_withdrawal(&id, 9);
        registry.record_deposit(id, staker(), 10, 10);

        let info = *registry.get(&id).unwrap();
        assert_eq!(info.owner, Some(staker()));
        assert_eq!(info.deposit_cycle, 10);
        assert_eq!(info.withdraw_cycle, 0);
    }

    #[test]
    fn test_withdrawal_of_unknown_token_is_noop() {
        let mut registry = TokenRegistry::new();
        registry.record_withdrawal(&U256::from(7u64), 5);
        assert!(registry.is_empty());
    }
}
