use crate::knox::bn::BigNumber;
use crate::CredxResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bit length of a nonce
pub const NONCE_BITS: usize = 80;

/// A random freshness value, carried as a decimal string
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Nonce(BigNumber);

impl Nonce {
    /// Generate a new random nonce
    pub fn new() -> Self {
        Self(BigNumber::random(NONCE_BITS))
    }

    /// Parse a decimal nonce
    pub fn from_dec(value: &str) -> CredxResult<Self> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err_msg!("Invalid nonce: {:?}", value));
        }
        Ok(Self(BigNumber::from_dec(value)?))
    }

    pub(crate) fn as_native(&self) -> &BigNumber {
        &self.0
    }
}

impl Default for Nonce {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generate a nonce for a credential offer or presentation request
pub fn generate_nonce() -> Nonce {
    Nonce::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_round_trip() {
        let nonce = generate_nonce();
        assert!(nonce.as_native().bits() <= NONCE_BITS as u64);
        let json = serde_json::to_string(&nonce).unwrap();
        assert!(json.starts_with('"'));
        let back: Nonce = serde_json::from_str(&json).unwrap();
        assert_eq!(nonce, back);
        assert!(Nonce::from_dec("12a").is_err());
        assert!(Nonce::from_dec("-1").is_err());
        assert_eq!(Nonce::from_dec("1234").unwrap().to_string(), "1234");
    }
}
