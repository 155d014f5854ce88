use super::{
    multi_exp, CredentialPrimaryPublicKey, LARGE_MVECT, LARGE_VPRIME, LARGE_VPRIME_TILDE,
    MASTER_SECRET,
};
use crate::knox::{accumulator::cks::CredentialRevocationPublicKey, bn::BigNumber, Knox};
use crate::CredxResult;
use blsful::inner_types::{Curve, Field, G1Projective, Scalar};
use merlin::Transcript;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};

/// The holder's master secret committed under the issuer's keys
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct BlindedCredentialSecrets {
    pub(crate) u: BigNumber,
    pub(crate) ur: Option<G1Projective>,
}

/// Randomness used to blind the secrets. Needed again to unblind
/// the issued signature.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialSecretsBlindingFactors {
    pub(crate) v_prime: BigNumber,
    pub(crate) vr_prime: Option<Scalar>,
}

impl Debug for CredentialSecretsBlindingFactors {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialSecretsBlindingFactors(<hidden>)")
    }
}

/// Proof of knowledge of the master secret and v' inside `u`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct BlindedCredentialSecretsCorrectnessProof {
    pub(crate) c: BigNumber,
    pub(crate) v_dash_cap: BigNumber,
    pub(crate) m_caps: BTreeMap<String, BigNumber>,
}

impl BlindedCredentialSecrets {
    /// Commit to the master secret for an issuer
    pub fn new(
        pk: &CredentialPrimaryPublicKey,
        r_pk: Option<&CredentialRevocationPublicKey>,
        master_secret: &BigNumber,
        nonce: &BigNumber,
    ) -> CredxResult<(
        Self,
        CredentialSecretsBlindingFactors,
        BlindedCredentialSecretsCorrectnessProof,
    )> {
        let rms = pk.r_for(MASTER_SECRET)?;
        let v_prime = BigNumber::random(LARGE_VPRIME);
        let u = multi_exp(&[(&pk.s, &v_prime), (rms, master_secret)], &pk.n)?;

        let (ur, vr_prime) = match r_pk {
            Some(r_pk) => {
                let vr_prime = Scalar::random(rand::thread_rng());
                (Some(r_pk.h2 * vr_prime), Some(vr_prime))
            }
            None => (None, None),
        };

        let v_tilde = BigNumber::random(LARGE_VPRIME_TILDE);
        let m_tilde = BigNumber::random(LARGE_MVECT);
        let u_tilde = multi_exp(&[(&pk.s, &v_tilde), (rms, &m_tilde)], &pk.n)?;

        let c = Self::challenge(&u, ur.as_ref(), &u_tilde, nonce);
        let v_dash_cap = &c * &v_prime + v_tilde;
        let mut m_caps = BTreeMap::new();
        m_caps.insert(MASTER_SECRET.to_string(), &c * master_secret + m_tilde);

        log::trace!("blinded credential secrets, revocation = {}", ur.is_some());

        Ok((
            Self { u, ur },
            CredentialSecretsBlindingFactors { v_prime, vr_prime },
            BlindedCredentialSecretsCorrectnessProof {
                c,
                v_dash_cap,
                m_caps,
            },
        ))
    }

    fn challenge(
        u: &BigNumber,
        ur: Option<&G1Projective>,
        u_tilde: &BigNumber,
        nonce: &BigNumber,
    ) -> BigNumber {
        let mut transcript = Transcript::new(b"blinded credential secrets");
        Knox::append_bignumbers(&mut transcript, b"u", &[u]);
        if let Some(ur) = ur {
            transcript.append_message(b"ur", ur.to_affine().to_compressed().as_ref());
        }
        Knox::append_bignumbers(&mut transcript, b"u_tilde", &[u_tilde]);
        Knox::append_bignumbers(&mut transcript, b"nonce", &[nonce]);
        Knox::challenge(&mut transcript)
    }
}

impl BlindedCredentialSecretsCorrectnessProof {
    /// Check the holder knows the secrets inside `blinded`
    pub fn verify(
        &self,
        blinded: &BlindedCredentialSecrets,
        pk: &CredentialPrimaryPublicKey,
        nonce: &BigNumber,
    ) -> CredxResult<()> {
        let m_cap = self
            .m_caps
            .get(MASTER_SECRET)
            .ok_or_else(|| err_msg!("Blinded secrets proof is missing the master secret"))?;
        if self.m_caps.len() != 1 {
            return Err(err_msg!("Blinded secrets proof has unexpected attributes"));
        }
        let rms = pk.r_for(MASTER_SECRET)?;
        let u_cap = multi_exp(
            &[
                (&blinded.u, &-&self.c),
                (&pk.s, &self.v_dash_cap),
                (rms, m_cap),
            ],
            &pk.n,
        )?;
        let c = BlindedCredentialSecrets::challenge(&blinded.u, blinded.ur.as_ref(), &u_cap, nonce);
        if c != self.c {
            return Err(err_msg!("Invalid blinded credential secrets correctness proof"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blinded_secrets_proof() {
        let names = vec!["name".to_string()];
        let (pk, _, _) = CredentialPrimaryPublicKey::generate(&names, 512).unwrap();
        let ms = BigNumber::random(256);
        let nonce = BigNumber::random(80);
        let (blinded, factors, proof) = BlindedCredentialSecrets::new(&pk, None, &ms, &nonce).unwrap();
        assert!(factors.vr_prime.is_none());
        assert!(proof.verify(&blinded, &pk, &nonce).is_ok());
        assert!(proof
            .verify(&blinded, &pk, &(&nonce + &BigNumber::one()))
            .is_err());
    }
}
