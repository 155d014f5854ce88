use crate::identifiers::{CredentialDefinitionId, RevocationRegistryId, SchemaId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps each referent of the request to the sub-proof that answers it
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestedProof {
    /// Single revealed attributes
    #[serde(default)]
    pub revealed_attrs: BTreeMap<String, RevealedAttributeInfo>,
    /// Revealed attribute groups
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub revealed_attr_groups: BTreeMap<String, RevealedAttributeGroupInfo>,
    /// Plain claims with no cryptographic backing
    #[serde(default)]
    pub self_attested_attrs: BTreeMap<String, String>,
    /// Attributes proven but not revealed
    #[serde(default)]
    pub unrevealed_attrs: BTreeMap<String, SubProofReferent>,
    /// Predicates
    #[serde(default)]
    pub predicates: BTreeMap<String, SubProofReferent>,
}

/// Points at a sub-proof
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubProofReferent {
    /// Index into the presentation's sub-proofs
    pub sub_proof_index: u32,
}

/// A revealed attribute
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RevealedAttributeInfo {
    /// Index into the presentation's sub-proofs
    pub sub_proof_index: u32,
    /// The raw value
    pub raw: String,
    /// The encoded value the proof discloses
    pub encoded: String,
}

/// A revealed group of attributes from one credential
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RevealedAttributeGroupInfo {
    /// Index into the presentation's sub-proofs
    pub sub_proof_index: u32,
    /// Values by requested name
    pub values: BTreeMap<String, AttributeValue>,
}

/// The raw and encoded value of a revealed attribute
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttributeValue {
    /// The raw value
    pub raw: String,
    /// The encoded value
    pub encoded: String,
}

/// The public objects a sub-proof was made against
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identifier {
    /// Schema of the credential
    pub schema_id: SchemaId,
    /// Definition of the credential
    pub cred_def_id: CredentialDefinitionId,
    /// Registry, when non-revocation is proven
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<RevocationRegistryId>,
    /// Registry timestamp, when non-revocation is proven
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}
