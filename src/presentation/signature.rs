use super::{ChallengeContribution, PresentationBuilder, PrimaryProof};
use crate::knox::{
    bn::BigNumber,
    cl::{
        CredentialPrimaryPublicKey, PokPredicate, PokSignature, Predicate,
        PrimaryCredentialSignature,
    },
};
use crate::CredxResult;
use std::collections::{BTreeMap, BTreeSet};

/// Builds the CL part of a sub-proof: signature knowledge plus one
/// inequality proof per predicate
pub(crate) struct SignatureBuilder {
    pok_sig: PokSignature,
    predicates: Vec<(String, PokPredicate)>,
}

impl SignatureBuilder {
    /// Commit to the signature and every predicate
    pub fn commit(
        pk: &CredentialPrimaryPublicKey,
        signature: &PrimaryCredentialSignature,
        values: &BTreeMap<String, BigNumber>,
        revealed: &BTreeSet<String>,
        predicates: &[Predicate],
        common_tildes: &BTreeMap<String, BigNumber>,
        m2_tilde: BigNumber,
    ) -> CredxResult<Self> {
        let pok_sig = PokSignature::commit(pk, signature, values, revealed, common_tildes, m2_tilde)?;
        let mut pok_predicates = Vec::with_capacity(predicates.len());
        for predicate in predicates {
            let name = &predicate.attr_name;
            let value = values
                .get(name)
                .ok_or_else(|| err_msg!("Credential has no attribute {} for a predicate", name))?;
            let m_tilde = pok_sig.m_tilde(name).ok_or_else(|| {
                err_msg!("Attribute {} cannot be both revealed and used in a predicate", name)
            })?;
            pok_predicates.push((name.clone(), PokPredicate::commit(pk, predicate, value, m_tilde)?));
        }
        Ok(Self {
            pok_sig,
            predicates: pok_predicates,
        })
    }
}

impl PresentationBuilder for SignatureBuilder {
    type Proof = PrimaryProof;

    fn add_challenge_contribution(&self, contribution: &mut ChallengeContribution) {
        contribution.add_taus(self.pok_sig.tau_list().iter().map(BigNumber::to_bytes));
        contribution.add_commitments(self.pok_sig.c_list().iter().map(BigNumber::to_bytes));
        for (_, predicate) in &self.predicates {
            contribution.add_taus(predicate.tau_list().iter().map(BigNumber::to_bytes));
            contribution.add_commitments(predicate.c_list().iter().map(BigNumber::to_bytes));
        }
    }

    fn gen_proof(self, challenge: &BigNumber) -> CredxResult<PrimaryProof> {
        let eq_proof = self.pok_sig.finalize(challenge);
        let mut ge_proofs = Vec::with_capacity(self.predicates.len());
        for (name, predicate) in self.predicates {
            let m_cap = eq_proof
                .m_cap(&name)
                .ok_or_else(|| err_msg!(Unexpected, "No response for predicate attribute {}", name))?;
            ge_proofs.push(predicate.finalize(challenge, m_cap));
        }
        Ok(PrimaryProof {
            eq_proof,
            ge_proofs,
        })
    }
}
