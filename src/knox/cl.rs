mod blind_signature_context;
mod key_correctness;
mod pok_signature;
mod pok_signature_proof;
mod predicate;
mod public_key;
mod secret_key;
mod signature;

pub use blind_signature_context::*;
pub use key_correctness::*;
pub use pok_signature::*;
pub use pok_signature_proof::*;
pub use predicate::*;
pub use public_key::*;
pub use secret_key::*;
pub use signature::*;

use super::bn::BigNumber;
use crate::CredxResult;

/// Bit length of the master secret
pub const LARGE_MASTER_SECRET: usize = 256;
/// Signature exponents e are primes in [2^LARGE_E_START, 2^LARGE_E_START + 2^LARGE_E_END_RANGE]
pub const LARGE_E_START: usize = 596;
/// See [`LARGE_E_START`]
pub const LARGE_E_END_RANGE: usize = 119;
/// Bit length of the prover's blinding factor v'
pub const LARGE_VPRIME: usize = 2128;
/// Bit length of the issuer's blinding factor v''
pub const LARGE_VPRIME_PRIME: usize = 2724;
/// Randomizer length for attribute values
pub const LARGE_MVECT: usize = 592;
/// Randomizer length for e'
pub const LARGE_ETILDE: usize = 456;
/// Randomizer length for v
pub const LARGE_VTILDE: usize = 3060;
/// Randomizer length for v' and other 2128-bit secrets
pub const LARGE_VPRIME_TILDE: usize = 2464;
/// Randomizer length for the four square components
pub const LARGE_UTILDE: usize = 592;
/// Randomizer length for the predicate alpha
pub const LARGE_ALPHATILDE: usize = 2787;
/// Extra bits added to a secret's length for statistical hiding
pub const HIDING_SLACK: usize = 336;
/// Number of squares in a predicate decomposition
pub const ITERATION: usize = 4;
/// Reserved attribute name for the holder's master secret
pub const MASTER_SECRET: &str = "master_secret";

/// Random exponent in [2, p*q - 1]
pub(crate) fn gen_x(p: &BigNumber, q: &BigNumber) -> CredxResult<BigNumber> {
    let max = p * q - BigNumber::from(3u32);
    Ok(BigNumber::random_in_range(&max)? + BigNumber::from(2u32))
}

/// Random quadratic residue modulo n
pub(crate) fn random_qr(n: &BigNumber) -> CredxResult<BigNumber> {
    let x = BigNumber::random_in_range(n)?;
    Ok(x.mod_mul(&x, n))
}

/// Product of base_i^exp_i mod n
pub(crate) fn multi_exp(
    pairs: &[(&BigNumber, &BigNumber)],
    n: &BigNumber,
) -> CredxResult<BigNumber> {
    let mut acc = BigNumber::one();
    for (base, exp) in pairs {
        acc = acc.mod_mul(&base.mod_exp(exp, n)?, n);
    }
    Ok(acc)
}
