use crate::identifiers::{CredentialDefinitionId, SchemaId};
use crate::knox::{
    accumulator::cks::{CredentialRevocationPrivateKey, CredentialRevocationPublicKey},
    cl::{CredentialPrimaryPrivateKey, CredentialPrimaryPublicKey},
};
use crate::CredxResult;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default RSA modulus size for new credential definitions
pub const DEFAULT_PRIMARY_MODULUS_BITS: usize = 2048;

/// The signature scheme of a credential definition
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum SignatureType {
    /// Camenisch-Lysyanskaya
    #[default]
    CL,
}

impl SignatureType {
    /// The wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CL => "CL",
        }
    }
}

impl FromStr for SignatureType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CL" => Ok(Self::CL),
            _ => Err(err_msg!("Unsupported signature type {:?}", s)),
        }
    }
}

/// Options for creating a credential definition
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialDefinitionConfig {
    /// Generate revocation keys
    #[serde(default)]
    pub support_revocation: bool,
    /// RSA modulus size, defaults to [`DEFAULT_PRIMARY_MODULUS_BITS`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_modulus_bits: Option<usize>,
}

impl CredentialDefinitionConfig {
    /// Create a config
    pub fn new(support_revocation: bool) -> Self {
        Self {
            support_revocation,
            primary_modulus_bits: None,
        }
    }

    /// Override the modulus size
    pub fn with_modulus_bits(mut self, bits: usize) -> Self {
        self.primary_modulus_bits = Some(bits);
        self
    }

    pub(crate) fn modulus_bits(&self) -> CredxResult<usize> {
        let bits = self
            .primary_modulus_bits
            .unwrap_or(DEFAULT_PRIMARY_MODULUS_BITS);
        if bits < 512 || bits % 2 != 0 {
            return Err(err_msg!("Invalid primary modulus size {}", bits));
        }
        Ok(bits)
    }
}

/// The public keys of a credential definition
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialDefinitionData {
    /// CL signature key
    pub primary: CredentialPrimaryPublicKey,
    /// Non-revocation signature key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation: Option<CredentialRevocationPublicKey>,
}

/// A published credential definition
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDefinition {
    /// Format version
    pub ver: String,
    /// `{did}:3:CL:{schema ref}:{tag}`
    pub id: CredentialDefinitionId,
    /// The schema this definition signs
    pub schema_id: SchemaId,
    /// Signature scheme
    #[serde(rename = "type")]
    pub signature_type: SignatureType,
    /// Issuer chosen tag
    pub tag: String,
    /// Public keys
    pub value: CredentialDefinitionData,
}

impl CredentialDefinition {
    /// The primary public key
    pub fn primary_key(&self) -> &CredentialPrimaryPublicKey {
        &self.value.primary
    }

    /// The revocation public key, when revocation is supported
    pub fn revocation_key(&self) -> Option<&CredentialRevocationPublicKey> {
        self.value.revocation.as_ref()
    }

    /// Read a supported attribute
    pub fn get_attribute(&self, attribute: CredentialDefinitionAttribute) -> Option<String> {
        match attribute {
            CredentialDefinitionAttribute::Id => Some(self.id.to_string()),
            CredentialDefinitionAttribute::SchemaId => Some(self.schema_id.to_string()),
        }
    }
}

/// The private keys of a credential definition
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CredentialDefinitionPrivateData {
    /// CL signing key
    pub p_key: CredentialPrimaryPrivateKey,
    /// Non-revocation signing key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_key: Option<CredentialRevocationPrivateKey>,
}

/// The issuer's secret half of a credential definition
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CredentialDefinitionPrivate {
    /// Private keys
    pub value: CredentialDefinitionPrivateData,
}

/// Attributes readable from a [`CredentialDefinition`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CredentialDefinitionAttribute {
    /// The definition id
    Id,
    /// The schema id
    SchemaId,
}

impl FromStr for CredentialDefinitionAttribute {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "schema_id" => Ok(Self::SchemaId),
            _ => Err(err_msg!("Unsupported credential definition attribute {:?}", s)),
        }
    }
}
