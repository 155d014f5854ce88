/// Accumulator value and tails
mod accumulator;
/// Revocation and accumulator keys
mod key;
/// Proofs of non-revocation
mod proof;
/// Non-revocation signatures
mod signature;
/// Membership witnesses
mod witness;

pub use accumulator::*;
pub use key::*;
pub use proof::*;
pub use signature::*;
pub use witness::*;

use blsful::inner_types::{Field, G1Projective, G2Projective, Gt, Scalar};
use rand_core::{CryptoRng, RngCore};
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256,
};

const SALT: &[u8] = b"CKS-ACC-KEYGEN-SALT-";

/// Sample a uniform field element by expanding fresh entropy
fn generate_fr(salt: &[u8], mut rng: impl RngCore + CryptoRng) -> Scalar {
    let mut hasher = Shake256::default();
    hasher.update(salt);
    let mut arr = [0u8; 32];
    rng.fill_bytes(&mut arr);
    hasher.update(&arr);
    let mut okm = [0u8; 64];
    let mut xof = hasher.finalize_xof();
    xof.read(&mut okm);
    Scalar::from_bytes_wide(&okm)
}

/// A random non-zero scalar
pub(crate) fn random_scalar() -> Scalar {
    loop {
        let s = generate_fr(SALT, rand_core::OsRng);
        if s != Scalar::ZERO {
            return s;
        }
    }
}

/// base^exp in the scalar field
pub(crate) fn scalar_pow(base: &Scalar, exp: u64) -> Scalar {
    <Scalar as Field>::pow_vartime(base, [exp])
}

fn random_g1() -> G1Projective {
    G1Projective::GENERATOR * random_scalar()
}

fn random_g2() -> G2Projective {
    G2Projective::GENERATOR * random_scalar()
}

/// Hex serialization of target group elements
pub(crate) mod gt_hex {
    use super::Gt;
    use blsful::inner_types::GroupEncoding;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const GT_BYTES: usize = 576;

    pub fn serialize<S: Serializer>(gt: &Gt, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(gt.to_bytes().as_ref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Gt, D::Error> {
        let s = String::deserialize(d)?;
        let bytes = hex::decode(s).map_err(|e| D::Error::custom(e.to_string()))?;
        if bytes.len() != GT_BYTES {
            return Err(D::Error::custom("invalid Gt length"));
        }
        let mut repr = <Gt as GroupEncoding>::Repr::default();
        repr.as_mut().copy_from_slice(&bytes);
        Option::<Gt>::from(Gt::from_bytes(&repr))
            .ok_or_else(|| D::Error::custom("invalid Gt encoding"))
    }
}
