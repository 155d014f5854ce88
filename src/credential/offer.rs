use crate::identifiers::{CredentialDefinitionId, SchemaId};
use crate::knox::cl::CredentialKeyCorrectnessProof;
use crate::nonce::Nonce;
use serde::{Deserialize, Serialize};

/// A credential offer from the issuer to the holder
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialOffer {
    /// The schema of the offered credential
    pub schema_id: SchemaId,
    /// The credential definition that will sign it
    pub cred_def_id: CredentialDefinitionId,
    /// Proof the definition's primary key is well formed
    pub key_correctness_proof: CredentialKeyCorrectnessProof,
    /// Freshness value the request must prove against
    pub nonce: Nonce,
}
