use crate::knox::bn::BigNumber;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Formatter};

/// The issuer's primary signing key. `p` and `q` are the Sophie Germain
/// primes behind the safe primes of the modulus so `p * q` is the order
/// of the quadratic residue group.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialPrimaryPrivateKey {
    pub(crate) p: BigNumber,
    pub(crate) q: BigNumber,
}

impl Debug for CredentialPrimaryPrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialPrimaryPrivateKey(<hidden>)")
    }
}

impl CredentialPrimaryPrivateKey {
    /// The order of the group of quadratic residues
    pub(crate) fn order(&self) -> BigNumber {
        &self.p * &self.q
    }
}
