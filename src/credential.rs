mod definition;
mod master_secret;
mod offer;
mod request;
mod schema;
mod values;

pub use definition::*;
pub use master_secret::*;
pub use offer::*;
pub use request::*;
pub use schema::*;
pub use values::*;

use crate::identifiers::{CredentialDefinitionId, RevocationRegistryId, SchemaId};
use crate::knox::{
    accumulator::cks::NonRevocationCredentialSignature,
    cl::{PrimaryCredentialSignature, SignatureCorrectnessProof},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The issuer's signatures over a credential
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialSignature {
    /// CL signature on the attributes, master secret and context
    pub p_credential: PrimaryCredentialSignature,
    /// Signature on the registry index, present for revocable credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_credential: Option<NonRevocationCredentialSignature>,
}

/// A credential
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credential {
    /// The schema this credential follows
    pub schema_id: SchemaId,
    /// The definition that signed it
    pub cred_def_id: CredentialDefinitionId,
    /// The registry it can be revoked from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<RevocationRegistryId>,
    /// The signed attribute values
    pub values: CredentialValues,
    /// The signatures
    pub signature: CredentialSignature,
    /// The issuer's proof that the primary signature was correctly formed
    pub signature_correctness_proof: SignatureCorrectnessProof,
}

impl Credential {
    /// The registry index, for revocable credentials
    pub fn rev_reg_index(&self) -> Option<u32> {
        self.signature.r_credential.as_ref().map(|r| r.index())
    }

    /// Read a supported attribute
    pub fn get_attribute(&self, attribute: CredentialAttribute) -> Option<String> {
        match attribute {
            CredentialAttribute::SchemaId => Some(self.schema_id.to_string()),
            CredentialAttribute::CredDefId => Some(self.cred_def_id.to_string()),
            CredentialAttribute::RevRegId => self.rev_reg_id.as_ref().map(|id| id.to_string()),
            CredentialAttribute::RevRegIndex => self.rev_reg_index().map(|i| i.to_string()),
        }
    }
}

/// Attributes readable from a [`Credential`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CredentialAttribute {
    /// The schema id
    SchemaId,
    /// The credential definition id
    CredDefId,
    /// The revocation registry id
    RevRegId,
    /// The revocation registry index
    RevRegIndex,
}

impl FromStr for CredentialAttribute {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "schema_id" => Ok(Self::SchemaId),
            "cred_def_id" => Ok(Self::CredDefId),
            "rev_reg_id" => Ok(Self::RevRegId),
            "rev_reg_index" => Ok(Self::RevRegIndex),
            "" => Err(err_msg!("Attribute name is empty")),
            _ => Err(err_msg!("Unsupported credential attribute {:?}", s)),
        }
    }
}
