use crate::knox::{bn::BigNumber, cl::CredentialPrimaryPublicKey};
use crate::presentation::{ChallengeContribution, PrimaryProof};
use crate::verifier::ProofVerifier;
use crate::CredxResult;

/// Checks the CL part of a sub-proof
pub struct SignatureVerifier<'a> {
    pk: &'a CredentialPrimaryPublicKey,
    proof: &'a PrimaryProof,
}

impl<'a> SignatureVerifier<'a> {
    pub fn new(pk: &'a CredentialPrimaryPublicKey, proof: &'a PrimaryProof) -> Self {
        Self { pk, proof }
    }
}

impl<'a> ProofVerifier for SignatureVerifier<'a> {
    fn add_challenge_contribution(
        &self,
        challenge: &BigNumber,
        contribution: &mut ChallengeContribution,
    ) -> CredxResult<()> {
        let tau = self.proof.eq_proof.calc_tau(self.pk, challenge)?;
        contribution.add_taus([tau.to_bytes()]);
        for ge in &self.proof.ge_proofs {
            let taus = ge.calc_tau(self.pk, challenge)?;
            contribution.add_taus(taus.iter().map(BigNumber::to_bytes));
        }
        Ok(())
    }

    /// Each predicate must be bound to the hidden attribute's response
    fn verify(&self) -> bool {
        self.proof.ge_proofs.iter().all(|ge| {
            self.proof
                .eq_proof
                .m_cap(&ge.predicate().attr_name)
                .map_or(false, |m_cap| m_cap == ge.m_cap())
        })
    }
}
