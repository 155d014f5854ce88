use super::{
    CredentialPrimaryPublicKey, PrimaryCredentialSignature, PrimaryEqualProof, LARGE_ETILDE,
    LARGE_E_START, LARGE_MVECT, LARGE_VPRIME, LARGE_VTILDE,
};
use crate::knox::bn::BigNumber;
use crate::CredxResult;
use std::collections::{BTreeMap, BTreeSet};

/// The prover's committed state for proving knowledge of a CL signature
/// while revealing a subset of the attributes.
///
/// Randomizers for hidden attributes can be supplied by the caller so the
/// same value can be linked across credentials (the master secret) or
/// into predicate proofs.
pub struct PokSignature {
    a_prime: BigNumber,
    t: BigNumber,
    e_prime: BigNumber,
    e_tilde: BigNumber,
    v_prime: BigNumber,
    v_tilde: BigNumber,
    m: BTreeMap<String, BigNumber>,
    m_tilde: BTreeMap<String, BigNumber>,
    m2: BigNumber,
    m2_tilde: BigNumber,
    revealed: BTreeMap<String, BigNumber>,
}

impl PokSignature {
    /// Randomize the signature and commit to the hidden values.
    ///
    /// `values` must hold every signed value including the master secret.
    pub fn commit(
        pk: &CredentialPrimaryPublicKey,
        signature: &PrimaryCredentialSignature,
        values: &BTreeMap<String, BigNumber>,
        revealed: &BTreeSet<String>,
        common_tildes: &BTreeMap<String, BigNumber>,
        m2_tilde: BigNumber,
    ) -> CredxResult<Self> {
        let mut m = BTreeMap::new();
        let mut m_tilde = BTreeMap::new();
        let mut revealed_values = BTreeMap::new();
        for name in pk.r.keys() {
            let value = values
                .get(name)
                .ok_or_else(|| err_msg!("Missing value for attribute {}", name))?;
            if revealed.contains(name) {
                revealed_values.insert(name.clone(), value.clone());
            } else {
                let tilde = common_tildes
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| BigNumber::random(LARGE_MVECT));
                m.insert(name.clone(), value.clone());
                m_tilde.insert(name.clone(), tilde);
            }
        }
        if let Some(name) = revealed.iter().find(|n| !pk.r.contains_key(n.as_str())) {
            return Err(err_msg!("Cannot reveal unknown attribute {}", name));
        }

        let r = BigNumber::random(LARGE_VPRIME);
        let a_prime = signature
            .a
            .mod_mul(&pk.s.mod_exp(&r, &pk.n)?, &pk.n);
        let v_prime = &signature.v - &(&signature.e * &r);
        let e_prime = &signature.e - &BigNumber::pow2(LARGE_E_START);

        let e_tilde = BigNumber::random(LARGE_ETILDE);
        let v_tilde = BigNumber::random(LARGE_VTILDE);

        let mut t = a_prime.mod_exp(&e_tilde, &pk.n)?;
        t = t.mod_mul(&pk.s.mod_exp(&v_tilde, &pk.n)?, &pk.n);
        for (name, tilde) in &m_tilde {
            t = t.mod_mul(&pk.r_for(name)?.mod_exp(tilde, &pk.n)?, &pk.n);
        }
        t = t.mod_mul(&pk.rctxt.mod_exp(&m2_tilde, &pk.n)?, &pk.n);

        Ok(Self {
            a_prime,
            t,
            e_prime,
            e_tilde,
            v_prime,
            v_tilde,
            m,
            m_tilde,
            m2: signature.m_2.clone(),
            m2_tilde,
            revealed: revealed_values,
        })
    }

    /// Values that feed the Fiat-Shamir tau list
    pub fn tau_list(&self) -> Vec<BigNumber> {
        vec![self.t.clone()]
    }

    /// Values that feed the Fiat-Shamir commitment list
    pub fn c_list(&self) -> Vec<BigNumber> {
        vec![self.a_prime.clone()]
    }

    /// The randomizer used for a hidden attribute
    pub fn m_tilde(&self, name: &str) -> Option<&BigNumber> {
        self.m_tilde.get(name)
    }

    /// Compute the Schnorr responses for challenge `c`
    pub fn finalize(self, c: &BigNumber) -> PrimaryEqualProof {
        let e = c * &self.e_prime + &self.e_tilde;
        let v = c * &self.v_prime + &self.v_tilde;
        let m = self
            .m
            .iter()
            .filter_map(|(name, value)| {
                self.m_tilde
                    .get(name)
                    .map(|tilde| (name.clone(), c * value + tilde))
            })
            .collect();
        let m2 = c * &self.m2 + &self.m2_tilde;
        PrimaryEqualProof {
            revealed_attrs: self.revealed,
            a_prime: self.a_prime,
            e,
            v,
            m,
            m2,
        }
    }
}
