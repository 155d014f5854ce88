use crate::CredxResult;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::OnceLock};

const DID_PATTERN: &str =
    "did:[a-z0-9]+:[^:]+|[1-9A-HJ-NP-Za-km-z]{21,22}|[1-9A-HJ-NP-Za-km-z]{44}";

fn did_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^(?:{})$", DID_PATTERN)).expect("valid regex"))
}

fn schema_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^({}):2:(.+):([^:]+)$", DID_PATTERN)).expect("valid regex")
    })
}

fn cred_def_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^({}):3:(CL):(.+):([^:]+)$", DID_PATTERN)).expect("valid regex")
    })
}

fn rev_reg_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^({}):4:(.+):(CL_ACCUM):([^:]+)$", DID_PATTERN))
            .expect("valid regex")
    })
}

macro_rules! impl_id {
    ($(#[$meta:meta])* $name:ident, $regex:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a string without validating it
            pub fn new_unchecked(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Wrap and validate a string
            pub fn new(s: impl Into<String>) -> CredxResult<Self> {
                let id = Self(s.into());
                id.validate()?;
                Ok(id)
            }

            /// Check the identifier is well formed
            pub fn validate(&self) -> CredxResult<()> {
                if self.0.is_empty() {
                    return Err(err_msg!("Empty {}", stringify!($name)));
                }
                if !$regex.is_match(&self.0) {
                    return Err(err_msg!("Invalid {}: {}", stringify!($name), self.0));
                }
                Ok(())
            }

            /// The identifier string
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }
    };
}

impl_id!(
    /// An issuer or holder DID, unqualified base58 or `did:` qualified
    DidValue,
    did_regex()
);
impl_id!(
    /// `{did}:2:{name}:{version}`
    SchemaId,
    schema_id_regex()
);
impl_id!(
    /// `{did}:3:CL:{schema ref}:{tag}`
    CredentialDefinitionId,
    cred_def_id_regex()
);
impl_id!(
    /// `{did}:4:{cred def id}:CL_ACCUM:{tag}`
    RevocationRegistryId,
    rev_reg_id_regex()
);

impl SchemaId {
    /// Build the id of a schema
    pub fn from_parts(did: &DidValue, name: &str, version: &str) -> Self {
        Self(format!("{}:2:{}:{}", did, name, version))
    }

    /// Split into (issuer did, name, version)
    pub fn parts(&self) -> Option<(DidValue, String, String)> {
        let caps = schema_id_regex().captures(&self.0)?;
        Some((
            DidValue(caps[1].to_string()),
            caps[2].to_string(),
            caps[3].to_string(),
        ))
    }
}

impl CredentialDefinitionId {
    /// Build the id of a credential definition. `schema_ref` is the schema's
    /// sequence number when published, otherwise its id.
    pub fn from_parts(did: &DidValue, schema_ref: &str, tag: &str) -> Self {
        Self(format!("{}:3:CL:{}:{}", did, schema_ref, tag))
    }

    /// Split into (issuer did, signature type, schema ref, tag)
    pub fn parts(&self) -> Option<(DidValue, String, String, String)> {
        let caps = cred_def_id_regex().captures(&self.0)?;
        Some((
            DidValue(caps[1].to_string()),
            caps[2].to_string(),
            caps[3].to_string(),
            caps[4].to_string(),
        ))
    }

    /// The issuer part of the id
    pub fn issuer_did(&self) -> Option<DidValue> {
        self.parts().map(|p| p.0)
    }
}

impl RevocationRegistryId {
    /// Build the id of a revocation registry
    pub fn from_parts(did: &DidValue, cred_def_id: &CredentialDefinitionId, tag: &str) -> Self {
        Self(format!("{}:4:{}:CL_ACCUM:{}", did, cred_def_id, tag))
    }

    /// Split into (issuer did, cred def id, registry type, tag)
    pub fn parts(&self) -> Option<(DidValue, CredentialDefinitionId, String, String)> {
        let caps = rev_reg_id_regex().captures(&self.0)?;
        Some((
            DidValue(caps[1].to_string()),
            CredentialDefinitionId(caps[2].to_string()),
            caps[3].to_string(),
            caps[4].to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DID: &str = "NcYxiDXkpYi6ov5FcYDi1e";

    #[test]
    fn did_validation() {
        assert!(DidValue::new(DID).is_ok());
        assert!(DidValue::new("did:sov:NcYxiDXkpYi6ov5FcYDi1e").is_ok());
        assert!(DidValue::new("").is_err());
        assert!(DidValue::new("NcYxiDXkpYi6ov5FcYDi1").is_ok());
        assert!(DidValue::new("short").is_err());
        assert!(DidValue::new("NcYxiDXkpYi6ov5FcYDi1O").is_err());
    }

    #[test]
    fn id_parts() {
        let did = DidValue::new(DID).unwrap();
        let schema_id = SchemaId::from_parts(&did, "gvt", "1.0");
        assert_eq!(schema_id.as_str(), "NcYxiDXkpYi6ov5FcYDi1e:2:gvt:1.0");
        assert_eq!(
            schema_id.parts(),
            Some((did.clone(), "gvt".to_string(), "1.0".to_string()))
        );
        schema_id.validate().unwrap();

        let cred_def_id = CredentialDefinitionId::from_parts(&did, schema_id.as_str(), "tag");
        assert_eq!(
            cred_def_id.as_str(),
            "NcYxiDXkpYi6ov5FcYDi1e:3:CL:NcYxiDXkpYi6ov5FcYDi1e:2:gvt:1.0:tag"
        );
        let (issuer, sig_type, schema_ref, tag) = cred_def_id.parts().unwrap();
        assert_eq!(issuer, did);
        assert_eq!(sig_type, "CL");
        assert_eq!(schema_ref, schema_id.as_str());
        assert_eq!(tag, "tag");

        let rev_reg_id = RevocationRegistryId::from_parts(&did, &cred_def_id, "r1");
        let (_, cd, reg_type, tag) = rev_reg_id.parts().unwrap();
        assert_eq!(cd, cred_def_id);
        assert_eq!(reg_type, "CL_ACCUM");
        assert_eq!(tag, "r1");

        assert!(SchemaId::new("not an id").is_err());
        assert!(SchemaId::new("").is_err());
    }
}
