use crate::credential::Credential;
use crate::revocation_registry::CredentialRevocationState;
use crate::CredxResult;
use std::collections::{BTreeSet, HashSet};

/// The credentials a holder selects to answer a presentation request
#[derive(Debug, Default)]
pub struct PresentCredentials<'p>(pub(crate) Vec<PresentCredential<'p>>);

#[derive(Debug)]
pub(crate) struct PresentCredential<'p> {
    pub cred: &'p Credential,
    pub timestamp: Option<u64>,
    pub rev_state: Option<&'p CredentialRevocationState>,
    pub requested_attributes: BTreeSet<(String, bool)>,
    pub requested_predicates: BTreeSet<String>,
}

impl PresentCredential<'_> {
    pub fn is_empty(&self) -> bool {
        self.requested_attributes.is_empty() && self.requested_predicates.is_empty()
    }
}

impl<'p> PresentCredentials<'p> {
    /// Nothing selected yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `cred` in the presentation. Pass the revocation state and its
    /// timestamp to prove non-revocation.
    pub fn add_credential(
        &mut self,
        cred: &'p Credential,
        timestamp: Option<u64>,
        rev_state: Option<&'p CredentialRevocationState>,
    ) -> AddCredential<'_, 'p> {
        let idx = self.0.len();
        self.0.push(PresentCredential {
            cred,
            timestamp,
            rev_state,
            requested_attributes: BTreeSet::new(),
            requested_predicates: BTreeSet::new(),
        });
        AddCredential {
            present: self,
            idx,
        }
    }

    /// Number of credentials that answer at least one referent
    pub fn len(&self) -> usize {
        self.0.iter().filter(|c| !c.is_empty()).count()
    }

    /// True when no referent is answered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn validate(&self) -> CredxResult<()> {
        let mut attr_referents = HashSet::new();
        let mut pred_referents = HashSet::new();
        for c in &self.0 {
            if c.rev_state.is_some() != c.timestamp.is_some() {
                return Err(err_msg!(
                    "A revocation state and its timestamp must be provided together"
                ));
            }
            if c.rev_state.is_some() && c.cred.signature.r_credential.is_none() {
                return Err(err_msg!("Revocation state given for a non revocable credential"));
            }
            for (referent, _) in &c.requested_attributes {
                if !attr_referents.insert(referent.as_str()) {
                    return Err(err_msg!("Attribute referent {} is answered twice", referent));
                }
            }
            for referent in &c.requested_predicates {
                if !pred_referents.insert(referent.as_str()) {
                    return Err(err_msg!("Predicate referent {} is answered twice", referent));
                }
            }
        }
        Ok(())
    }
}

/// Attaches referents to a credential added with
/// [`PresentCredentials::add_credential`]
#[derive(Debug)]
pub struct AddCredential<'a, 'p> {
    present: &'a mut PresentCredentials<'p>,
    idx: usize,
}

impl AddCredential<'_, '_> {
    /// Answer an attribute referent, revealing the value or not
    pub fn add_requested_attribute(&mut self, referent: impl Into<String>, reveal: bool) {
        self.present.0[self.idx]
            .requested_attributes
            .insert((referent.into(), reveal));
    }

    /// Answer a predicate referent
    pub fn add_requested_predicate(&mut self, referent: impl Into<String>) {
        self.present.0[self.idx]
            .requested_predicates
            .insert(referent.into());
    }
}
