use crate::CredxResult;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const SIMPLE_TAGS: [&str; 7] = [
    "schema_id",
    "schema_issuer_did",
    "schema_name",
    "schema_version",
    "issuer_did",
    "cred_def_id",
    "rev_reg_id",
];

/// A restriction on the credentials allowed to answer a referent,
/// in wallet query language.
///
/// An object with several keys parses as [`Query::And`] of one query per
/// key and serializes back in the explicit `{"$and": [...]}` form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// All subqueries hold
    And(Vec<Query>),
    /// Any subquery holds
    Or(Vec<Query>),
    /// The subquery does not hold
    Not(Box<Query>),
    /// The tag equals the value
    Eq(String, String),
    /// The tag differs from the value
    Neq(String, String),
    /// The tag equals one of the values
    In(String, Vec<String>),
}

impl Query {
    /// Evaluate against the tags of a credential.
    ///
    /// An unknown tag name is an error; a known tag with no value never
    /// matches `Eq` or `In`.
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> CredxResult<bool> {
        Ok(match self {
            Self::And(qs) => {
                for q in qs {
                    if !q.matches(tags)? {
                        return Ok(false);
                    }
                }
                true
            }
            Self::Or(qs) => {
                for q in qs {
                    if q.matches(tags)? {
                        return Ok(true);
                    }
                }
                false
            }
            Self::Not(q) => !q.matches(tags)?,
            Self::Eq(tag, value) => {
                check_tag(tag)?;
                tags.get(tag) == Some(value)
            }
            Self::Neq(tag, value) => {
                check_tag(tag)?;
                tags.get(tag) != Some(value)
            }
            Self::In(tag, values) => {
                check_tag(tag)?;
                tags.get(tag).map_or(false, |t| values.contains(t))
            }
        })
    }

    fn from_value(value: Value) -> CredxResult<Self> {
        let map = match value {
            Value::Object(map) => map,
            _ => return Err(err_msg!("Restriction must be a JSON object")),
        };
        let mut clauses = map
            .into_iter()
            .map(|(key, value)| Self::clause(key, value))
            .collect::<CredxResult<Vec<_>>>()?;
        Ok(if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            Self::And(clauses)
        })
    }

    fn clause(key: String, value: Value) -> CredxResult<Self> {
        match key.as_str() {
            "$and" | "$or" => {
                let items = match value {
                    Value::Array(items) => items,
                    _ => return Err(err_msg!("{} takes a list of restrictions", key)),
                };
                let qs = items
                    .into_iter()
                    .map(Self::from_value)
                    .collect::<CredxResult<Vec<_>>>()?;
                Ok(if key == "$and" { Self::And(qs) } else { Self::Or(qs) })
            }
            "$not" => Ok(Self::Not(Box::new(Self::from_value(value)?))),
            _ => match value {
                Value::String(s) => Ok(Self::Eq(key, s)),
                Value::Object(op) => {
                    let (name, arg) = op
                        .into_iter()
                        .next()
                        .ok_or_else(|| err_msg!("Empty operator for restriction {}", key))?;
                    match (name.as_str(), arg) {
                        ("$neq", Value::String(s)) => Ok(Self::Neq(key, s)),
                        ("$in", Value::Array(items)) => {
                            let values = items
                                .into_iter()
                                .map(|v| match v {
                                    Value::String(s) => Ok(s),
                                    _ => Err(err_msg!("$in for {} takes strings", key)),
                                })
                                .collect::<CredxResult<Vec<_>>>()?;
                            Ok(Self::In(key, values))
                        }
                        (name, _) => Err(err_msg!("Unsupported operator {} for {}", name, key)),
                    }
                }
                _ => Err(err_msg!("Restriction value for {} must be a string", key)),
            },
        }
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        match self {
            Self::And(qs) => {
                map.insert("$and".into(), Value::Array(qs.iter().map(Self::to_value).collect()));
            }
            Self::Or(qs) => {
                map.insert("$or".into(), Value::Array(qs.iter().map(Self::to_value).collect()));
            }
            Self::Not(q) => {
                map.insert("$not".into(), q.to_value());
            }
            Self::Eq(tag, value) => {
                map.insert(tag.clone(), Value::String(value.clone()));
            }
            Self::Neq(tag, value) => {
                map.insert(tag.clone(), serde_json::json!({ "$neq": value }));
            }
            Self::In(tag, values) => {
                map.insert(tag.clone(), serde_json::json!({ "$in": values }));
            }
        }
        Value::Object(map)
    }
}

fn check_tag(tag: &str) -> CredxResult<()> {
    if SIMPLE_TAGS.contains(&tag) {
        return Ok(());
    }
    let attr = tag
        .strip_prefix("attr::")
        .and_then(|t| t.strip_suffix("::value").or_else(|| t.strip_suffix("::marker")));
    match attr {
        Some(name) if !name.is_empty() => Ok(()),
        _ => Err(err_msg!("Unsupported restriction tag {:?}", tag)),
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    fn tags() -> BTreeMap<String, String> {
        btreemap! {
            "schema_name".to_string() => "gvt".to_string(),
            "issuer_did".to_string() => "NcYxiDXkpYi6ov5FcYDi1e".to_string(),
            "attr::name::marker".to_string() => "1".to_string(),
            "attr::name::value".to_string() => "Alex".to_string(),
        }
    }

    #[test]
    fn parse_and_match() {
        let q: Query = serde_json::from_value(serde_json::json!({
            "$or": [
                {"schema_name": "xyz"},
                {"issuer_did": "NcYxiDXkpYi6ov5FcYDi1e", "attr::name::value": {"$in": ["Alex", "Bob"]}}
            ]
        }))
        .unwrap();
        assert!(q.matches(&tags()).unwrap());

        let q: Query =
            serde_json::from_value(serde_json::json!({"$not": {"schema_name": {"$neq": "gvt"}}}))
                .unwrap();
        assert!(q.matches(&tags()).unwrap());

        let q: Query = serde_json::from_value(serde_json::json!({"attr::age::marker": "1"})).unwrap();
        assert!(!q.matches(&tags()).unwrap());
    }

    #[test]
    fn implicit_and_is_written_explicitly() {
        let q: Query = serde_json::from_str(
            r#"{"schema_name":"gvt","issuer_did":"NcYxiDXkpYi6ov5FcYDi1e"}"#,
        )
        .unwrap();
        assert_eq!(
            q,
            Query::And(vec![
                Query::Eq("issuer_did".into(), "NcYxiDXkpYi6ov5FcYDi1e".into()),
                Query::Eq("schema_name".into(), "gvt".into()),
            ])
        );
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            serde_json::json!({"$and": [
                {"issuer_did": "NcYxiDXkpYi6ov5FcYDi1e"},
                {"schema_name": "gvt"}
            ]})
        );
        let back: Query = serde_json::from_value(serde_json::to_value(&q).unwrap()).unwrap();
        assert_eq!(back, q);
        assert!(back.matches(&tags()).unwrap());
    }

    #[test]
    fn round_trip_and_errors() {
        let q = Query::And(vec![
            Query::Eq("schema_name".into(), "gvt".into()),
            Query::In("cred_def_id".into(), vec!["a".into()]),
        ]);
        let back: Query = serde_json::from_str(&serde_json::to_string(&q).unwrap()).unwrap();
        assert_eq!(back, q);

        assert!(serde_json::from_value::<Query>(serde_json::json!(["x"])).is_err());
        assert!(serde_json::from_value::<Query>(serde_json::json!({"a": {"$gt": "1"}})).is_err());
        let unknown = Query::Eq("colour".into(), "red".into());
        assert_eq!(
            unknown.matches(&tags()).unwrap_err().kind(),
            crate::ErrorKind::Input
        );
    }
}
