use super::{ChallengeContribution, PresentationBuilder};
use crate::knox::{
    accumulator::cks::{
        CredentialRevocationPublicKey, NonRevocProof, NonRevocationCredentialSignature,
        PokNonRevocation,
    },
    bn::BigNumber,
};
use crate::revocation_registry::CredentialRevocationState;
use crate::CredxResult;
use blsful::inner_types::Scalar;

/// Builds the accumulator membership part of a sub-proof
pub(crate) struct RevocationBuilder {
    pok: PokNonRevocation,
}

impl RevocationBuilder {
    /// Commit to the witness in `rev_state`. `m2_tilde` is shared with
    /// the signature proof.
    pub fn commit(
        pk: &CredentialRevocationPublicKey,
        rev_state: &CredentialRevocationState,
        signature: &NonRevocationCredentialSignature,
        m2_tilde: Scalar,
    ) -> CredxResult<Self> {
        if rev_state.rev_reg.accum.is_empty() {
            return Err(err_msg!(
                CredentialRevoked,
                "Revocation state has an empty accumulator"
            ));
        }
        Ok(Self {
            pok: PokNonRevocation::commit(
                pk,
                &rev_state.rev_reg.accum,
                signature,
                &rev_state.witness,
                m2_tilde,
            ),
        })
    }
}

impl PresentationBuilder for RevocationBuilder {
    type Proof = NonRevocProof;

    fn add_challenge_contribution(&self, contribution: &mut ChallengeContribution) {
        contribution.add_taus(self.pok.tau_list());
        contribution.add_commitments(self.pok.c_list());
    }

    fn gen_proof(self, challenge: &BigNumber) -> CredxResult<NonRevocProof> {
        Ok(self.pok.finalize(&challenge.to_scalar()?))
    }
}
