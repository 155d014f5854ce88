use crate::identifiers::{CredentialDefinitionId, DidValue};
use crate::knox::cl::{
    BlindedCredentialSecrets, BlindedCredentialSecretsCorrectnessProof,
    CredentialSecretsBlindingFactors,
};
use crate::nonce::Nonce;
use serde::{Deserialize, Serialize};

/// A holder's request for a credential, sent to the issuer
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialRequest {
    /// The holder's identifier, bound into the credential context
    pub prover_did: DidValue,
    /// The definition the holder wants signed
    pub cred_def_id: CredentialDefinitionId,
    /// The committed master secret
    pub blinded_ms: BlindedCredentialSecrets,
    /// Proof of knowledge of the committed values
    pub blinded_ms_correctness_proof: BlindedCredentialSecretsCorrectnessProof,
    /// Freshness value for the issuer's signature correctness proof
    pub nonce: Nonce,
}

/// What the holder keeps to unblind the issued credential
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CredentialRequestMetadata {
    /// Blinding factors of the request
    pub master_secret_blinding_data: CredentialSecretsBlindingFactors,
    /// The request nonce
    pub nonce: Nonce,
    /// The holder's name for the master secret used
    pub master_secret_name: String,
}
