use super::{multi_exp, CredentialPrimaryPublicKey, HIDING_SLACK};
use crate::knox::{bn::BigNumber, Knox};
use crate::CredxResult;
use merlin::Transcript;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Proves the issuer knows the discrete logs of `z`, every `r` and `rctxt`
/// with respect to `s`, so all bases live in the same subgroup.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialKeyCorrectnessProof {
    pub(crate) c: BigNumber,
    pub(crate) xz_cap: BigNumber,
    pub(crate) xr_cap: BTreeMap<String, BigNumber>,
    pub(crate) xrctxt_cap: BigNumber,
}

impl CredentialKeyCorrectnessProof {
    pub(crate) fn new(
        pk: &CredentialPrimaryPublicKey,
        xz: &BigNumber,
        xr: &BTreeMap<String, BigNumber>,
        xrctxt: &BigNumber,
    ) -> CredxResult<Self> {
        let bits = pk.n.bits() as usize + HIDING_SLACK;

        let xz_tilde = BigNumber::random(bits);
        let z_tilde = pk.s.mod_exp(&xz_tilde, &pk.n)?;

        let mut xr_tilde = BTreeMap::new();
        let mut r_tilde = BTreeMap::new();
        for name in xr.keys() {
            let t = BigNumber::random(bits);
            r_tilde.insert(name.clone(), pk.s.mod_exp(&t, &pk.n)?);
            xr_tilde.insert(name.clone(), t);
        }

        let xrctxt_tilde = BigNumber::random(bits);
        let rctxt_tilde = pk.s.mod_exp(&xrctxt_tilde, &pk.n)?;

        let c = Self::challenge(pk, &z_tilde, &r_tilde, &rctxt_tilde);

        let xz_cap = &c * xz + xz_tilde;
        let mut xr_cap = BTreeMap::new();
        for (name, x) in xr {
            let tilde = xr_tilde
                .get(name)
                .ok_or_else(|| err_msg!(Unexpected, "Missing randomizer for {}", name))?;
            xr_cap.insert(name.clone(), &c * x + tilde);
        }
        let xrctxt_cap = &c * xrctxt + xrctxt_tilde;

        Ok(Self {
            c,
            xz_cap,
            xr_cap,
            xrctxt_cap,
        })
    }

    /// Check the proof against a public key
    pub fn verify(&self, pk: &CredentialPrimaryPublicKey) -> CredxResult<()> {
        if !self.xr_cap.keys().eq(pk.r.keys()) {
            return Err(err_msg!(
                "Key correctness proof does not cover the public key attributes"
            ));
        }
        let minus_c = -&self.c;

        let z_cap = multi_exp(&[(&pk.z, &minus_c), (&pk.s, &self.xz_cap)], &pk.n)?;

        let mut r_cap = BTreeMap::new();
        for (name, cap) in &self.xr_cap {
            let r = pk.r_for(name)?;
            r_cap.insert(
                name.clone(),
                multi_exp(&[(r, &minus_c), (&pk.s, cap)], &pk.n)?,
            );
        }

        let rctxt_cap = multi_exp(&[(&pk.rctxt, &minus_c), (&pk.s, &self.xrctxt_cap)], &pk.n)?;

        let c = Self::challenge(pk, &z_cap, &r_cap, &rctxt_cap);
        if c != self.c {
            return Err(err_msg!("Invalid credential key correctness proof"));
        }
        Ok(())
    }

    fn challenge(
        pk: &CredentialPrimaryPublicKey,
        z_cap: &BigNumber,
        r_cap: &BTreeMap<String, BigNumber>,
        rctxt_cap: &BigNumber,
    ) -> BigNumber {
        let mut transcript = Transcript::new(b"credential key correctness proof");
        Knox::append_bignumbers(&mut transcript, b"n", &[&pk.n]);
        Knox::append_bignumbers(&mut transcript, b"s", &[&pk.s]);
        Knox::append_bignumbers(&mut transcript, b"z", &[&pk.z]);
        for (name, r) in &pk.r {
            transcript.append_message(b"attribute", name.as_bytes());
            Knox::append_bignumbers(&mut transcript, b"r", &[r]);
        }
        Knox::append_bignumbers(&mut transcript, b"rctxt", &[&pk.rctxt]);
        Knox::append_bignumbers(&mut transcript, b"z_cap", &[z_cap]);
        for r in r_cap.values() {
            Knox::append_bignumbers(&mut transcript, b"r_cap", &[r]);
        }
        Knox::append_bignumbers(&mut transcript, b"rctxt_cap", &[rctxt_cap]);
        Knox::challenge(&mut transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_correctness_proof_verifies() {
        let names = vec!["name".to_string(), "age".to_string()];
        let (pk, _sk, proof) = CredentialPrimaryPublicKey::generate(&names, 512).unwrap();
        assert!(proof.verify(&pk).is_ok());

        let mut bad = proof.clone();
        bad.xz_cap = &bad.xz_cap + &BigNumber::one();
        assert!(bad.verify(&pk).is_err());

        let mut other = pk.clone();
        other.r.remove("age");
        assert!(proof.verify(&other).is_err());
    }
}
