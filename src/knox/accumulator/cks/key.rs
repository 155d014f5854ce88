use super::{gt_hex, random_g1, random_g2, random_scalar, scalar_pow};
use blsful::inner_types::*;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Formatter};
use zeroize::Zeroize;

/// Public parameters for non-revocation signatures and proofs
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialRevocationPublicKey {
    pub(crate) g: G1Projective,
    pub(crate) g_dash: G2Projective,
    pub(crate) h: G1Projective,
    pub(crate) h0: G1Projective,
    pub(crate) h1: G1Projective,
    pub(crate) h2: G1Projective,
    pub(crate) htilde: G1Projective,
    pub(crate) h_cap: G2Projective,
    pub(crate) u: G2Projective,
    pub(crate) pk: G1Projective,
    pub(crate) y: G2Projective,
}

/// The issuer's non-revocation signing key
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize, Zeroize)]
#[zeroize(drop)]
pub struct CredentialRevocationPrivateKey {
    pub(crate) x: Scalar,
    pub(crate) sk: Scalar,
}

impl Debug for CredentialRevocationPrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialRevocationPrivateKey(<hidden>)")
    }
}

impl CredentialRevocationPublicKey {
    /// Create a fresh revocation key pair
    pub fn generate() -> (Self, CredentialRevocationPrivateKey) {
        let g = random_g1();
        let g_dash = random_g2();
        let h_cap = random_g2();
        let x = random_scalar();
        let sk = random_scalar();
        let public = Self {
            g,
            g_dash,
            h: random_g1(),
            h0: random_g1(),
            h1: random_g1(),
            h2: random_g1(),
            htilde: random_g1(),
            h_cap,
            u: random_g2(),
            pk: g * sk,
            y: h_cap * x,
        };
        (public, CredentialRevocationPrivateKey { x, sk })
    }
}

/// The accumulator's public value z = e(g, g')^(gamma^(L+1))
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RevocationKeyPublic {
    #[serde(with = "gt_hex")]
    pub(crate) z: Gt,
}

/// The accumulator trapdoor gamma
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize, Zeroize)]
#[zeroize(drop)]
pub struct RevocationKeyPrivate {
    pub(crate) gamma: Scalar,
}

impl Debug for RevocationKeyPrivate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("RevocationKeyPrivate(<hidden>)")
    }
}

impl RevocationKeyPublic {
    /// Create accumulator keys for a registry of `max_cred_num` entries
    pub fn generate(
        pk: &CredentialRevocationPublicKey,
        max_cred_num: u32,
    ) -> (Self, RevocationKeyPrivate) {
        let gamma = random_scalar();
        let exp = scalar_pow(&gamma, u64::from(max_cred_num) + 1);
        let z = pairing(&pk.g.to_affine(), &pk.g_dash.to_affine()) * exp;
        (Self { z }, RevocationKeyPrivate { gamma })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_serde() {
        let (pk, sk) = CredentialRevocationPublicKey::generate();
        let (rpk, _) = RevocationKeyPublic::generate(&pk, 10);
        let s = serde_json::to_string(&rpk).unwrap();
        let back: RevocationKeyPublic = serde_json::from_str(&s).unwrap();
        assert_eq!(rpk, back);
        let s = serde_json::to_string(&pk).unwrap();
        let back: CredentialRevocationPublicKey = serde_json::from_str(&s).unwrap();
        assert_eq!(pk, back);
        assert_eq!(format!("{:?}", sk), "CredentialRevocationPrivateKey(<hidden>)");
    }
}
