use super::Query;
use crate::knox::cl::PredicateType;
use crate::nonce::Nonce;
use crate::utils::attr_common_view;
use crate::CredxResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Presentation request format version
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum PresentationRequestVersion {
    /// Version 1.0
    #[serde(rename = "1.0")]
    V1,
    /// Version 2.0
    #[serde(rename = "2.0")]
    V2,
}

/// What a verifier asks the holder to prove
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PresentationRequest {
    /// Request name
    pub name: String,
    /// Request version
    pub version: String,
    /// Freshness value bound into the presentation challenge
    pub nonce: Nonce,
    /// Attributes to reveal or prove, keyed by referent
    #[serde(default)]
    pub requested_attributes: BTreeMap<String, AttributeInfo>,
    /// Predicates to prove, keyed by referent
    #[serde(default)]
    pub requested_predicates: BTreeMap<String, PredicateInfo>,
    /// Interval in which credentials must be unrevoked, unless a
    /// referent sets its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
    /// Format version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ver: Option<PresentationRequestVersion>,
}

impl PresentationRequest {
    /// Check the request is well formed
    pub fn validate(&self) -> CredxResult<()> {
        if self.requested_attributes.is_empty() && self.requested_predicates.is_empty() {
            return Err(err_msg!(
                "Presentation request must ask for at least one attribute or predicate"
            ));
        }
        for (referent, info) in &self.requested_attributes {
            info.names_checked(referent)?;
        }
        for (referent, info) in &self.requested_predicates {
            if attr_common_view(&info.name).is_empty() {
                return Err(err_msg!("Predicate {} has an empty attribute name", referent));
            }
        }
        if let Some(referent) = self
            .requested_predicates
            .keys()
            .find(|r| self.requested_attributes.contains_key(*r))
        {
            return Err(err_msg!("Referent {} is used for both an attribute and a predicate", referent));
        }
        let intervals = self
            .requested_attributes
            .values()
            .filter_map(|a| a.non_revoked.as_ref())
            .chain(
                self.requested_predicates
                    .values()
                    .filter_map(|p| p.non_revoked.as_ref()),
            )
            .chain(self.non_revoked.as_ref());
        for interval in intervals {
            interval.validate()?;
        }
        Ok(())
    }
}

/// A requested attribute, either a single `name` or a group of `names`
/// that must come from the same credential
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AttributeInfo {
    /// A single attribute name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// A group of attribute names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    /// Which credentials may answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Query>,
    /// Overrides the request's interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

impl AttributeInfo {
    /// Request a single attribute
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Request a group of attributes from one credential
    pub fn group<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Restrict the credentials that may answer
    pub fn with_restrictions(mut self, restrictions: Query) -> Self {
        self.restrictions = Some(restrictions);
        self
    }

    /// Set a local non-revocation interval
    pub fn with_non_revoked(mut self, interval: NonRevokedInterval) -> Self {
        self.non_revoked = Some(interval);
        self
    }

    /// The requested names, normalized
    pub(crate) fn names_checked(&self, referent: &str) -> CredxResult<Vec<String>> {
        let names = match (&self.name, &self.names) {
            (Some(name), None) => vec![attr_common_view(name)],
            (None, Some(names)) if !names.is_empty() => {
                names.iter().map(|n| attr_common_view(n)).collect()
            }
            _ => {
                return Err(err_msg!(
                    "Requested attribute {} must have either name or a non-empty names list",
                    referent
                ))
            }
        };
        if names.iter().any(String::is_empty) {
            return Err(err_msg!("Requested attribute {} has an empty name", referent));
        }
        if names.iter().collect::<HashSet<_>>().len() != names.len() {
            return Err(err_msg!("Requested attribute {} repeats a name", referent));
        }
        Ok(names)
    }
}

/// A requested predicate
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PredicateInfo {
    /// The attribute compared
    pub name: String,
    /// The comparison
    pub p_type: PredicateType,
    /// The bound
    pub p_value: i32,
    /// Which credentials may answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Query>,
    /// Overrides the request's interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

impl PredicateInfo {
    /// Create a predicate request
    pub fn new(name: impl Into<String>, p_type: PredicateType, p_value: i32) -> Self {
        Self {
            name: name.into(),
            p_type,
            p_value,
            restrictions: None,
            non_revoked: None,
        }
    }

    /// Restrict the credentials that may answer
    pub fn with_restrictions(mut self, restrictions: Query) -> Self {
        self.restrictions = Some(restrictions);
        self
    }
}

/// The time window in which a credential must not have been revoked
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NonRevokedInterval {
    /// Earliest acceptable registry timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    /// Latest acceptable registry timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
}

impl NonRevokedInterval {
    /// Create an interval
    pub fn new(from: Option<u64>, to: Option<u64>) -> Self {
        Self { from, to }
    }

    /// The effective interval for a referent: the local one if set,
    /// otherwise the request's
    pub fn get_non_revoc_interval(
        global: Option<&NonRevokedInterval>,
        local: Option<&NonRevokedInterval>,
    ) -> Option<NonRevokedInterval> {
        local.or(global).copied()
    }

    /// Does `timestamp` fall in the interval
    pub fn contains(&self, timestamp: u64) -> bool {
        self.from.map_or(true, |from| timestamp >= from) && self.to.map_or(true, |to| timestamp <= to)
    }

    fn validate(&self) -> CredxResult<()> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(err_msg!(
                "Non-revocation interval starts after it ends ({} > {})",
                from,
                to
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval() -> NonRevokedInterval {
        NonRevokedInterval::new(None, Some(123))
    }

    #[test]
    fn local_interval_overrides_global() {
        let local = NonRevokedInterval::new(Some(5), None);
        assert_eq!(
            NonRevokedInterval::get_non_revoc_interval(Some(&interval()), None),
            Some(interval())
        );
        assert_eq!(
            NonRevokedInterval::get_non_revoc_interval(Some(&interval()), Some(&local)),
            Some(local)
        );
        assert_eq!(NonRevokedInterval::get_non_revoc_interval(None, None), None);
        assert!(interval().contains(123));
        assert!(!interval().contains(124));
        assert!(!local.contains(4));
    }

    #[test]
    fn request_json() {
        let json = serde_json::json!({
            "name": "proof",
            "version": "1.0",
            "nonce": "1234567890",
            "requested_attributes": {
                "attr1_referent": {"name": "Name"},
                "attr2_referent": {"names": ["sex", "age"], "non_revoked": {"to": 10}}
            },
            "requested_predicates": {
                "predicate1_referent": {"name": "age", "p_type": ">=", "p_value": 18}
            },
            "ver": "2.0"
        });
        let req: PresentationRequest = serde_json::from_value(json).unwrap();
        req.validate().unwrap();
        assert_eq!(req.ver, Some(PresentationRequestVersion::V2));
        assert_eq!(
            req.requested_attributes["attr1_referent"]
                .names_checked("attr1_referent")
                .unwrap(),
            vec!["name".to_string()]
        );
        assert_eq!(
            req.requested_predicates["predicate1_referent"].p_type,
            PredicateType::GE
        );
    }

    #[test]
    fn invalid_requests() {
        let mut req = PresentationRequest {
            name: "proof".into(),
            version: "1.0".into(),
            nonce: Nonce::new(),
            requested_attributes: BTreeMap::new(),
            requested_predicates: BTreeMap::new(),
            non_revoked: None,
            ver: None,
        };
        assert!(req.validate().is_err());

        req.requested_attributes
            .insert("a".into(), AttributeInfo::default());
        assert!(req.validate().is_err());

        req.requested_attributes
            .insert("a".into(), AttributeInfo::group(Vec::<String>::new()));
        assert!(req.validate().is_err());

        req.requested_attributes.insert("a".into(), AttributeInfo::single("name"));
        req.non_revoked = Some(NonRevokedInterval::new(Some(10), Some(5)));
        assert!(req.validate().is_err());

        req.non_revoked = None;
        req.requested_predicates
            .insert("a".into(), PredicateInfo::new("age", PredicateType::GE, 18));
        assert!(req.validate().is_err());
    }
}
