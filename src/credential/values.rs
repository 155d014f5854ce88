use crate::knox::{bn::BigNumber, cl::MASTER_SECRET};
use crate::utils::{attr_common_view, encode_credential_attribute};
use crate::CredxResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The raw and encoded forms of one attribute
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttributeValues {
    /// The value as issued
    pub raw: String,
    /// The decimal integer signed in its place
    pub encoded: String,
}

/// Attribute values of a credential keyed by normalized attribute name
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CredentialValues(pub(crate) BTreeMap<String, AttributeValues>);

impl CredentialValues {
    /// Look up a value by any spelling of the attribute name
    pub fn get(&self, name: &str) -> Option<&AttributeValues> {
        self.0.get(&attr_common_view(name))
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no attributes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over normalized names and values
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValues)> {
        self.0.iter()
    }

    /// The encoded integers to sign
    pub(crate) fn encoded(&self) -> CredxResult<BTreeMap<String, BigNumber>> {
        self.0
            .iter()
            .map(|(name, value)| {
                BigNumber::from_dec(&value.encoded)
                    .map(|n| (name.clone(), n))
                    .map_err(|_| {
                        err_msg!("Attribute {} has a non numeric encoded value", name)
                    })
            })
            .collect()
    }

    /// The encoded integers plus the holder's master secret
    pub(crate) fn encoded_with_master_secret(
        &self,
        master_secret: &BigNumber,
    ) -> CredxResult<BTreeMap<String, BigNumber>> {
        let mut values = self.encoded()?;
        values.insert(MASTER_SECRET.to_string(), master_secret.clone());
        Ok(values)
    }
}

/// Builds [`CredentialValues`] one attribute at a time
#[derive(Clone, Debug, Default)]
pub struct MakeCredentialValues(CredentialValues);

impl MakeCredentialValues {
    /// Start with no values
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw value, encoding it with [`encode_credential_attribute`]
    pub fn add_raw(&mut self, name: impl AsRef<str>, raw: impl Into<String>) -> CredxResult<()> {
        let raw = raw.into();
        let encoded = encode_credential_attribute(&raw);
        self.add_encoded(name, raw, encoded)
    }

    /// Add a value with an encoding chosen by the caller
    pub fn add_encoded(
        &mut self,
        name: impl AsRef<str>,
        raw: impl Into<String>,
        encoded: impl Into<String>,
    ) -> CredxResult<()> {
        let name = attr_common_view(name.as_ref());
        if name.is_empty() {
            return Err(err_msg!("Attribute name is empty"));
        }
        let encoded = encoded.into();
        BigNumber::from_dec(&encoded)
            .map_err(|_| err_msg!("Encoded value for {} is not a decimal integer", name))?;
        if self.0 .0.contains_key(&name) {
            return Err(err_msg!("Duplicate attribute {}", name));
        }
        self.0 .0.insert(
            name,
            AttributeValues {
                raw: raw.into(),
                encoded,
            },
        );
        Ok(())
    }

    /// Build from parallel lists of names, raw values and optional encodings.
    /// The lists must have the same length.
    pub fn from_lists<N, R, E>(names: &[N], raw: &[R], encoded: Option<&[E]>) -> CredxResult<Self>
    where
        N: AsRef<str>,
        R: AsRef<str>,
        E: AsRef<str>,
    {
        if names.len() != raw.len() || encoded.map_or(false, |e| e.len() != names.len()) {
            return Err(err_msg!(
                "Attribute names, raw values and encoded values must have the same length"
            ));
        }
        if names.is_empty() {
            return Err(err_msg!("No attribute values were provided"));
        }
        let mut values = Self::new();
        for (i, name) in names.iter().enumerate() {
            match encoded {
                Some(encoded) => {
                    values.add_encoded(name, raw[i].as_ref(), encoded[i].as_ref())?
                }
                None => values.add_raw(name, raw[i].as_ref())?,
            }
        }
        Ok(values)
    }
}

impl From<MakeCredentialValues> for CredentialValues {
    fn from(m: MakeCredentialValues) -> Self {
        m.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_normalizes_and_encodes() {
        let mut values = MakeCredentialValues::new();
        values.add_raw("First Name", "Alex").unwrap();
        values.add_raw("age", "20").unwrap();
        assert!(values.add_raw("firstname", "Bob").is_err());
        let values = CredentialValues::from(values);
        assert_eq!(values.get("firstname").unwrap().raw, "Alex");
        assert_eq!(values.get("AGE").unwrap().encoded, "20");
        assert_eq!(
            values.encoded().unwrap()["age"],
            BigNumber::from(20u32)
        );
    }

    #[test]
    fn list_cardinality() {
        let err = MakeCredentialValues::from_lists(
            &["name", "age", "sex"],
            &["Alex", "20"],
            None::<&[&str]>,
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Input);
        let err = MakeCredentialValues::from_lists(
            &["name", "age"],
            &["Alex", "20"],
            Some(&["1"][..]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Input);
        assert!(MakeCredentialValues::from_lists(
            &["name", "age"],
            &["Alex", "20"],
            Some(&["1", "20"][..]),
        )
        .is_ok());
        assert!(
            MakeCredentialValues::from_lists(&["age"], &["20"], Some(&["twenty"][..])).is_err()
        );
    }
}
