use super::{CredentialPrimaryPublicKey, LARGE_E_START};
use crate::knox::bn::BigNumber;
use crate::CredxResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Proof of knowledge of a CL signature with some attributes disclosed
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrimaryEqualProof {
    pub(crate) revealed_attrs: BTreeMap<String, BigNumber>,
    pub(crate) a_prime: BigNumber,
    pub(crate) e: BigNumber,
    pub(crate) v: BigNumber,
    pub(crate) m: BTreeMap<String, BigNumber>,
    pub(crate) m2: BigNumber,
}

impl PrimaryEqualProof {
    /// The commitment list entry for this proof
    pub fn c_list(&self) -> Vec<BigNumber> {
        vec![self.a_prime.clone()]
    }

    /// The response for a hidden attribute
    pub fn m_cap(&self, name: &str) -> Option<&BigNumber> {
        self.m.get(name)
    }

    /// The disclosed encoded value of an attribute
    pub fn revealed(&self, name: &str) -> Option<&BigNumber> {
        self.revealed_attrs.get(name)
    }

    /// The response for the credential context
    pub fn m2_cap(&self) -> &BigNumber {
        &self.m2
    }

    /// Recompute the prover's `t` from the responses and challenge
    pub fn calc_tau(&self, pk: &CredentialPrimaryPublicKey, c: &BigNumber) -> CredxResult<BigNumber> {
        for name in pk.r.keys() {
            if self.m.contains_key(name) == self.revealed_attrs.contains_key(name) {
                return Err(err_msg!(
                    "Attribute {} must be either revealed or hidden",
                    name
                ));
            }
        }
        if self.m.len() + self.revealed_attrs.len() != pk.r.len() {
            return Err(err_msg!("Proof contains attributes unknown to the public key"));
        }

        let mut t1 = self.a_prime.mod_exp(&self.e, &pk.n)?;
        t1 = t1.mod_mul(&pk.s.mod_exp(&self.v, &pk.n)?, &pk.n);
        for (name, m_cap) in &self.m {
            t1 = t1.mod_mul(&pk.r_for(name)?.mod_exp(m_cap, &pk.n)?, &pk.n);
        }
        t1 = t1.mod_mul(&pk.rctxt.mod_exp(&self.m2, &pk.n)?, &pk.n);

        let mut rar = self
            .a_prime
            .mod_exp(&BigNumber::pow2(LARGE_E_START), &pk.n)?;
        for (name, value) in &self.revealed_attrs {
            rar = rar.mod_mul(&pk.r_for(name)?.mod_exp(value, &pk.n)?, &pk.n);
        }

        let z_over_rar = pk.z.mod_div(&rar, &pk.n)?;
        let t2 = z_over_rar.mod_exp(&-c, &pk.n)?;
        Ok(t1.mod_mul(&t2, &pk.n))
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        BlindedCredentialSecrets, PokSignature, PrimaryCredentialSignature, MASTER_SECRET,
    };
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn signature_proof_of_knowledge() {
        let names = vec!["age".to_string(), "name".to_string()];
        let (pk, sk, _) = CredentialPrimaryPublicKey::generate(&names, 512).unwrap();
        let ms = BigNumber::random(256);
        let nonce = BigNumber::random(80);
        let (blinded, factors, _) = BlindedCredentialSecrets::new(&pk, None, &ms, &nonce).unwrap();

        let mut values = BTreeMap::new();
        values.insert("age".to_string(), BigNumber::from(28u32));
        values.insert("name".to_string(), BigNumber::from(12345u32));
        let m2 = BigNumber::random(256);
        let (mut sig, proof) =
            PrimaryCredentialSignature::new(&pk, &sk, &m2, &values, &blinded.u, &nonce).unwrap();
        sig.unblind(&factors.v_prime);
        values.insert(MASTER_SECRET.to_string(), ms);
        sig.verify(&proof, &pk, &values, &nonce).unwrap();

        let mut revealed = BTreeSet::new();
        revealed.insert("name".to_string());
        let pok = PokSignature::commit(
            &pk,
            &sig,
            &values,
            &revealed,
            &BTreeMap::new(),
            BigNumber::random(592),
        )
        .unwrap();
        let t = pok.tau_list().remove(0);
        let c = BigNumber::random(256);
        let eq = pok.finalize(&c);
        assert_eq!(eq.calc_tau(&pk, &c).unwrap(), t);
        assert_eq!(eq.revealed("name"), Some(&BigNumber::from(12345u32)));

        let mut tampered = eq.clone();
        tampered
            .revealed_attrs
            .insert("name".to_string(), BigNumber::from(1u32));
        assert_ne!(tampered.calc_tau(&pk, &c).unwrap(), t);
    }
}
