use crate::knox::{
    accumulator::cks::{
        Accumulator, CredentialRevocationPublicKey, NonRevocProof, RevocationKeyPublic,
    },
    bn::BigNumber,
};
use crate::presentation::ChallengeContribution;
use crate::verifier::ProofVerifier;
use crate::CredxResult;

/// Checks accumulator membership against the registry in effect at the
/// sub-proof's timestamp
pub struct RevocationVerifier<'a> {
    pk: &'a CredentialRevocationPublicKey,
    accum_key: &'a RevocationKeyPublic,
    accum: &'a Accumulator,
    proof: &'a NonRevocProof,
    m2_cap: &'a BigNumber,
}

impl<'a> RevocationVerifier<'a> {
    pub fn new(
        pk: &'a CredentialRevocationPublicKey,
        accum_key: &'a RevocationKeyPublic,
        accum: &'a Accumulator,
        proof: &'a NonRevocProof,
        m2_cap: &'a BigNumber,
    ) -> Self {
        Self {
            pk,
            accum_key,
            accum,
            proof,
            m2_cap,
        }
    }
}

impl<'a> ProofVerifier for RevocationVerifier<'a> {
    fn add_challenge_contribution(
        &self,
        challenge: &BigNumber,
        contribution: &mut ChallengeContribution,
    ) -> CredxResult<()> {
        let taus = self
            .proof
            .calc_tau(self.pk, self.accum_key, self.accum, &challenge.to_scalar()?)?;
        contribution.add_taus(taus);
        Ok(())
    }

    /// The credential context response must agree with the CL proof
    fn verify(&self) -> bool {
        self.m2_cap
            .to_scalar()
            .map_or(false, |m2| m2 == *self.proof.m2())
    }
}
