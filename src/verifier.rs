mod revocation;
mod signature;

pub(crate) use revocation::*;
pub(crate) use signature::*;

use crate::credential::{CredentialDefinition, Schema};
use crate::identifiers::{CredentialDefinitionId, RevocationRegistryId, SchemaId};
use crate::knox::bn::BigNumber;
use crate::presentation::{ChallengeContribution, Presentation, PresentationRequest};
use crate::revocation_registry::{RevocationRegistry, RevocationRegistryDefinition};
use crate::CredxResult;
use std::collections::HashMap;

/// A trait for indication of proof verifier logic
pub(crate) trait ProofVerifier {
    /// Recompute the tau values for the challenge
    fn add_challenge_contribution(
        &self,
        challenge: &BigNumber,
        contribution: &mut ChallengeContribution,
    ) -> CredxResult<()>;
    /// Check proof relations outside of the challenge
    fn verify(&self) -> bool;
}

pub(crate) enum ProofVerifiers<'a> {
    Signature(SignatureVerifier<'a>),
    Revocation(RevocationVerifier<'a>),
}

impl<'a> ProofVerifiers<'a> {
    pub fn add_challenge_contribution(
        &self,
        challenge: &BigNumber,
        contribution: &mut ChallengeContribution,
    ) -> CredxResult<()> {
        match self {
            Self::Signature(s) => s.add_challenge_contribution(challenge, contribution),
            Self::Revocation(r) => r.add_challenge_contribution(challenge, contribution),
        }
    }

    pub fn verify(&self) -> bool {
        match self {
            Self::Signature(s) => s.verify(),
            Self::Revocation(r) => r.verify(),
        }
    }
}

impl<'a> From<SignatureVerifier<'a>> for ProofVerifiers<'a> {
    fn from(v: SignatureVerifier<'a>) -> Self {
        Self::Signature(v)
    }
}

impl<'a> From<RevocationVerifier<'a>> for ProofVerifiers<'a> {
    fn from(v: RevocationVerifier<'a>) -> Self {
        Self::Revocation(v)
    }
}

/// Verify a presentation against its request.
///
/// `Ok(false)` means the proof is well formed but does not hold. Missing
/// objects and malformed input are errors, as are answers that do not
/// satisfy the request's restrictions or non-revocation intervals.
pub fn verify_presentation(
    presentation: &Presentation,
    pres_req: &PresentationRequest,
    schemas: &HashMap<SchemaId, &Schema>,
    cred_defs: &HashMap<CredentialDefinitionId, &CredentialDefinition>,
    rev_reg_defs: Option<&HashMap<RevocationRegistryId, &RevocationRegistryDefinition>>,
    rev_regs: Option<&HashMap<RevocationRegistryId, HashMap<u64, &RevocationRegistry>>>,
) -> CredxResult<bool> {
    presentation.verify(pres_req, schemas, cred_defs, rev_reg_defs, rev_regs)
}
