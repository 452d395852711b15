// crates/ballast-vault/src/weight.rs
//
// Weight-derivation policy over structured token ids.
//
// Token id layout (big-endian): byte 0 is the token type, byte 1 is the
// attribute byte, the remainder is the serial. Only type 1 tokens are
// stakeable; the attribute byte selects the weight through a configured
// table.

use std::collections::BTreeMap;

use ballast_core::error::BallastError;
use ballast_core::traits::WeightPolicy;
use ballast_core::types::{TokenId, Weight};

/// The token type accepted for staking.
pub const STAKEABLE_TOKEN_TYPE: u8 = 1;

/// Attribute-table weight policy.
#[derive(Debug, Clone)]
pub struct TypedAttributeWeights {
    weights: BTreeMap<u8, Weight>,
}

impl TypedAttributeWeights {
    /// Create a policy from an attribute-byte → weight table.
    pub fn new(weights: BTreeMap<u8, Weight>) -> Self {
        Self { weights }
    }
}

impl WeightPolicy for TypedAttributeWeights {
    fn validate_and_weight(&self, id: TokenId) -> Result<Weight, BallastError> {
        let bytes = id.to_be_bytes::<32>();
        let token_type = bytes[0];
        if token_type != STAKEABLE_TOKEN_TYPE {
            return Err(BallastError::UnsupportedToken(format!(
                "token type {} is not stakeable",
                token_type
            )));
        }
        let attribute = bytes[1];
        self.weights.get(&attribute).copied().ok_or_else(|| {
            BallastError::UnsupportedToken(format!(
                "no weight configured for attribute {}",
                attribute
            ))
        })
    }
}
