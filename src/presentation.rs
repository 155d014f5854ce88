mod create;
mod present_credentials;
mod proof;
mod query;
mod request;
mod requested_proof;
mod revocation;
mod signature;
mod verify;

pub use present_credentials::*;
pub use proof::*;
pub use query::*;
pub use request::*;
pub use requested_proof::*;
pub(crate) use revocation::*;
pub(crate) use signature::*;

use crate::credential::Schema;
use crate::identifiers::{CredentialDefinitionId, RevocationRegistryId};
use crate::knox::{bn::BigNumber, Knox};
use crate::CredxResult;
use merlin::Transcript;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Implementers can build proofs for presentations
pub(crate) trait PresentationBuilder {
    /// The finished proof
    type Proof;
    /// Add the tau and commitment values to the challenge
    fn add_challenge_contribution(&self, contribution: &mut ChallengeContribution);
    /// Finalize proofs
    fn gen_proof(self, challenge: &BigNumber) -> CredxResult<Self::Proof>;
}

/// Collects the tau and commitment values of every sub-proof for the
/// Fiat-Shamir challenge
#[derive(Debug, Default)]
pub(crate) struct ChallengeContribution {
    tau_list: Vec<Vec<u8>>,
    c_list: Vec<Vec<u8>>,
}

impl ChallengeContribution {
    pub fn add_taus<I: IntoIterator<Item = Vec<u8>>>(&mut self, taus: I) {
        self.tau_list.extend(taus);
    }

    pub fn add_commitments<I: IntoIterator<Item = Vec<u8>>>(&mut self, c_list: I) {
        self.c_list.extend(c_list);
    }

    pub fn into_c_list(self) -> Vec<Vec<u8>> {
        self.c_list
    }

    /// The challenge over every tau, then every commitment, then the nonce
    pub fn challenge(&self, nonce: &BigNumber) -> BigNumber {
        let mut transcript = Transcript::new(b"credx-cl presentation");
        for tau in &self.tau_list {
            transcript.append_message(b"tau", tau);
        }
        for c in &self.c_list {
            transcript.append_message(b"commitment", c);
        }
        Knox::append_bignumbers(&mut transcript, b"nonce", &[nonce]);
        Knox::challenge(&mut transcript)
    }
}

/// A presentation answering a [`PresentationRequest`]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Presentation {
    /// The sub-proofs and shared challenge
    pub proof: Proof,
    /// Which sub-proof answers which referent
    pub requested_proof: RequestedProof,
    /// The public objects each sub-proof was made against
    pub identifiers: Vec<Identifier>,
}

/// Tags a restriction query is evaluated against.
/// `attrs` yields normalized attribute names with their raw value when known.
pub(crate) fn restriction_tags<'a>(
    schema: &Schema,
    cred_def_id: &CredentialDefinitionId,
    rev_reg_id: Option<&RevocationRegistryId>,
    attrs: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    tags.insert("schema_id".to_string(), schema.id.to_string());
    tags.insert("schema_name".to_string(), schema.name.clone());
    tags.insert("schema_version".to_string(), schema.version.clone());
    if let Some((did, _, _)) = schema.id.parts() {
        tags.insert("schema_issuer_did".to_string(), did.to_string());
    }
    tags.insert("cred_def_id".to_string(), cred_def_id.to_string());
    if let Some(did) = cred_def_id.issuer_did() {
        tags.insert("issuer_did".to_string(), did.to_string());
    }
    if let Some(id) = rev_reg_id {
        tags.insert("rev_reg_id".to_string(), id.to_string());
    }
    for (name, raw) in attrs {
        tags.insert(format!("attr::{}::marker", name), "1".to_string());
        if let Some(raw) = raw {
            tags.insert(format!("attr::{}::value", name), raw.to_string());
        }
    }
    tags
}
