use crate::identifiers::{DidValue, SchemaId};
use crate::knox::cl::MASTER_SECRET;
use crate::utils::{attr_common_view, deserialize_indexset, serialize_indexset};
use crate::CredxResult;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// The most attributes a schema can define
pub const MAX_ATTRIBUTES_COUNT: usize = 125;

/// A credential schema, the ordered set of attribute names for a credential type
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Format version
    pub ver: String,
    /// `{did}:2:{name}:{version}`
    pub id: SchemaId,
    /// Schema name
    pub name: String,
    /// Schema version
    pub version: String,
    /// Attribute names in definition order
    #[serde(
        serialize_with = "serialize_indexset",
        deserialize_with = "deserialize_indexset"
    )]
    pub attr_names: IndexSet<String>,
    /// Ledger sequence number once published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_no: Option<u32>,
}

impl Schema {
    /// Create a schema owned by `origin_did`
    pub fn new<I, S>(origin_did: &DidValue, name: &str, version: &str, attr_names: I) -> CredxResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        origin_did.validate()?;
        let attr_names = attr_names.into_iter().map(Into::into).collect::<IndexSet<String>>();
        let schema = Self {
            ver: "1.0".to_string(),
            id: SchemaId::from_parts(origin_did, name, version),
            name: name.to_string(),
            version: version.to_string(),
            attr_names,
            seq_no: None,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Check the schema is usable for a credential definition
    pub fn validate(&self) -> CredxResult<()> {
        self.id.validate()?;
        if self.name.is_empty() || self.version.is_empty() {
            return Err(err_msg!("Schema name and version are required"));
        }
        if self.attr_names.is_empty() {
            return Err(err_msg!("Empty list of schema attributes has been passed"));
        }
        if self.attr_names.len() > MAX_ATTRIBUTES_COUNT {
            return Err(err_msg!(
                "The number of schema attributes cannot be greater than {}",
                MAX_ATTRIBUTES_COUNT
            ));
        }
        let mut seen = HashSet::with_capacity(self.attr_names.len());
        for name in &self.attr_names {
            let common = attr_common_view(name);
            if common.is_empty() {
                return Err(err_msg!("Empty attribute name"));
            }
            if common == MASTER_SECRET {
                return Err(err_msg!("Attribute name {} is reserved", MASTER_SECRET));
            }
            if !seen.insert(common) {
                return Err(err_msg!("Duplicate attribute name {:?}", name));
            }
        }
        Ok(())
    }

    /// The normalized attribute names
    pub fn common_attr_names(&self) -> Vec<String> {
        self.attr_names.iter().map(|a| attr_common_view(a)).collect()
    }

    /// Read a supported attribute
    pub fn get_attribute(&self, attribute: SchemaAttribute) -> Option<String> {
        match attribute {
            SchemaAttribute::Id => Some(self.id.to_string()),
        }
    }
}

/// Attributes readable from a [`Schema`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchemaAttribute {
    /// The schema id
    Id,
}

impl FromStr for SchemaAttribute {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            _ => Err(err_msg!("Unsupported schema attribute {:?}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn did() -> DidValue {
        DidValue::new("NcYxiDXkpYi6ov5FcYDi1e").unwrap()
    }

    #[test]
    fn schema_json() {
        let schema = Schema::new(&did(), "gvt", "1.0", ["name", "age", "sex"]).unwrap();
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["id"], "NcYxiDXkpYi6ov5FcYDi1e:2:gvt:1.0");
        assert_eq!(json["attrNames"], serde_json::json!(["name", "age", "sex"]));
        assert!(json.get("seqNo").is_none());
        let back: Schema = serde_json::from_value(json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn schema_validation() {
        assert!(Schema::new(&did(), "gvt", "1.0", Vec::<String>::new()).is_err());
        assert!(Schema::new(&did(), "gvt", "1.0", ["Name", "name "]).is_err());
        assert!(Schema::new(&did(), "gvt", "1.0", ["master_secret"]).is_err());
        assert!(Schema::new(&DidValue::new_unchecked(""), "gvt", "1.0", ["name"]).is_err());
        let many = (0..=MAX_ATTRIBUTES_COUNT).map(|i| format!("a{}", i));
        assert!(Schema::new(&did(), "gvt", "1.0", many).is_err());
    }

    #[test]
    fn schema_accessor() {
        let schema = Schema::new(&did(), "gvt", "1.0", ["name"]).unwrap();
        let attr = "id".parse::<SchemaAttribute>().unwrap();
        assert_eq!(schema.get_attribute(attr), Some(schema.id.to_string()));
        let err = "version".parse::<SchemaAttribute>().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Input);
    }
}
