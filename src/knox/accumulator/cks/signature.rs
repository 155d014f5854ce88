use super::{
    random_scalar, scalar_pow, Accumulator, CredentialRevocationPrivateKey,
    CredentialRevocationPublicKey, RevocationKeyPrivate, RevocationKeyPublic, Witness,
};
use crate::CredxResult;
use blsful::inner_types::*;
use serde::{Deserialize, Serialize};

/// The issuer's signature on g_i, proving the index belongs to the registry
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct WitnessSignature {
    pub(crate) sigma_i: G2Projective,
    pub(crate) u_i: G2Projective,
    pub(crate) g_i: G1Projective,
}

/// A signature binding the credential context to a registry index
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NonRevocationCredentialSignature {
    pub(crate) sigma: G1Projective,
    pub(crate) c: Scalar,
    pub(crate) vr_prime_prime: Scalar,
    pub(crate) witness_signature: WitnessSignature,
    pub(crate) g_i: G1Projective,
    pub(crate) i: u32,
    pub(crate) m2: Scalar,
}

impl NonRevocationCredentialSignature {
    /// Sign index `rev_idx` for the holder's blinded commitment `ur`
    pub fn new(
        pk: &CredentialRevocationPublicKey,
        sk: &CredentialRevocationPrivateKey,
        key: &RevocationKeyPrivate,
        rev_idx: u32,
        m2: Scalar,
        ur: &G1Projective,
    ) -> CredxResult<Self> {
        let vr_prime_prime = random_scalar();
        let c = random_scalar();
        let gamma_i = scalar_pow(&key.gamma, u64::from(rev_idx));
        let g_i = pk.g * gamma_i;

        let x_plus_c = Option::<Scalar>::from((sk.x + c).invert())
            .ok_or_else(|| err_msg!(Unexpected, "Signature exponent is not invertible"))?;
        let sigma = (pk.h0 + pk.h1 * m2 + ur + g_i + pk.h2 * vr_prime_prime) * x_plus_c;

        let sk_plus_gamma = Option::<Scalar>::from((sk.sk + gamma_i).invert())
            .ok_or_else(|| err_msg!(Unexpected, "Witness exponent is not invertible"))?;

        Ok(Self {
            sigma,
            c,
            vr_prime_prime,
            witness_signature: WitnessSignature {
                sigma_i: pk.g_dash * sk_plus_gamma,
                u_i: pk.u * gamma_i,
                g_i,
            },
            g_i,
            i: rev_idx,
            m2,
        })
    }

    /// The registry index this signature is bound to
    pub fn index(&self) -> u32 {
        self.i
    }

    /// Holder side: fold in the revocation blinding factor
    pub(crate) fn unblind(&mut self, vr_prime: &Scalar) {
        self.vr_prime_prime += vr_prime;
    }

    /// Check both pairing equations of an unblinded signature
    pub fn verify(&self, pk: &CredentialRevocationPublicKey) -> CredxResult<()> {
        let lhs = pairing(
            &(pk.pk + self.g_i).to_affine(),
            &self.witness_signature.sigma_i.to_affine(),
        );
        if lhs != pairing(&pk.g.to_affine(), &pk.g_dash.to_affine()) {
            return Err(err_msg!(InvalidState, "Invalid witness signature"));
        }

        let lhs = pairing(&self.sigma.to_affine(), &(pk.y + pk.h_cap * self.c).to_affine());
        let rhs = pairing(
            &(pk.h0 + pk.h1 * self.m2 + pk.h2 * self.vr_prime_prime + self.g_i).to_affine(),
            &pk.h_cap.to_affine(),
        );
        if lhs != rhs {
            return Err(err_msg!(InvalidState, "Invalid non-revocation signature"));
        }
        Ok(())
    }

    /// Check e(g_i, acc) - e(g, w) == z
    pub fn verify_witness(
        &self,
        pk: &CredentialRevocationPublicKey,
        key: &RevocationKeyPublic,
        accumulator: &Accumulator,
        witness: &Witness,
    ) -> bool {
        let lhs = pairing(&self.g_i.to_affine(), &accumulator.0.to_affine())
            - pairing(&pk.g.to_affine(), &witness.omega.to_affine());
        lhs == key.z
    }
}
