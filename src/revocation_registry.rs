use crate::identifiers::{CredentialDefinitionId, RevocationRegistryId};
use crate::knox::accumulator::cks::{
    Accumulator, RevocationKeyPrivate, RevocationKeyPublic, Witness,
};
use crate::CredxResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// The accumulator scheme of a registry
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum RegistryType {
    /// Pairing based CKS accumulator
    #[default]
    CL_ACCUM,
}

impl RegistryType {
    /// The wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CL_ACCUM => "CL_ACCUM",
        }
    }
}

impl FromStr for RegistryType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CL_ACCUM" => Ok(Self::CL_ACCUM),
            _ => Err(err_msg!("Unsupported registry type {:?}", s)),
        }
    }
}

/// How registry indices become members of the accumulator
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum IssuanceType {
    /// Every index starts as a member; only revocation changes the accumulator
    #[default]
    ISSUANCE_BY_DEFAULT,
    /// The accumulator starts empty; each issuance adds its index
    ISSUANCE_ON_DEMAND,
}

impl IssuanceType {
    /// True for [`IssuanceType::ISSUANCE_BY_DEFAULT`]
    pub fn by_default(&self) -> bool {
        matches!(self, Self::ISSUANCE_BY_DEFAULT)
    }
}

impl FromStr for IssuanceType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ISSUANCE_BY_DEFAULT" => Ok(Self::ISSUANCE_BY_DEFAULT),
            "ISSUANCE_ON_DEMAND" => Ok(Self::ISSUANCE_ON_DEMAND),
            _ => Err(err_msg!("Unsupported issuance type {:?}", s)),
        }
    }
}

/// Public keys of a registry
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinitionValuePublicKeys {
    /// The accumulator key
    pub accum_key: RevocationKeyPublic,
}

/// The body of a registry definition
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinitionValue {
    /// Initial membership policy
    pub issuance_type: IssuanceType,
    /// Capacity of the registry
    pub max_cred_num: u32,
    /// Public keys
    pub public_keys: RevocationRegistryDefinitionValuePublicKeys,
    /// base58 SHA-256 of the tails file
    pub tails_hash: String,
    /// Where the tails file can be read
    pub tails_location: String,
}

/// A published revocation registry definition
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinition {
    /// Format version
    pub ver: String,
    /// `{did}:4:{cred_def_id}:CL_ACCUM:{tag}`
    pub id: RevocationRegistryId,
    /// Accumulator scheme
    pub revoc_def_type: RegistryType,
    /// Issuer chosen tag
    pub tag: String,
    /// The credential definition this registry serves
    pub cred_def_id: CredentialDefinitionId,
    /// Registry parameters
    pub value: RevocationRegistryDefinitionValue,
}

impl RevocationRegistryDefinition {
    /// Read a supported attribute
    pub fn get_attribute(&self, attribute: RevocationRegistryDefinitionAttribute) -> Option<String> {
        match attribute {
            RevocationRegistryDefinitionAttribute::Id => Some(self.id.to_string()),
            RevocationRegistryDefinitionAttribute::MaxCredNum => {
                Some(self.value.max_cred_num.to_string())
            }
            RevocationRegistryDefinitionAttribute::TailsHash => Some(self.value.tails_hash.clone()),
            RevocationRegistryDefinitionAttribute::TailsLocation => {
                Some(self.value.tails_location.clone())
            }
        }
    }

    /// Fail with `InvalidUserRevocId` unless `idx` is in `1..=max_cred_num`
    pub fn check_index(&self, idx: u32) -> CredxResult<()> {
        if idx == 0 || idx > self.value.max_cred_num {
            return Err(err_msg!(
                InvalidUserRevocId,
                "Index {} is outside the registry capacity {}",
                idx,
                self.value.max_cred_num
            ));
        }
        Ok(())
    }

    pub(crate) fn accum_key(&self) -> &RevocationKeyPublic {
        &self.value.public_keys.accum_key
    }
}

/// Attributes readable from a [`RevocationRegistryDefinition`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevocationRegistryDefinitionAttribute {
    /// The registry id
    Id,
    /// The registry capacity
    MaxCredNum,
    /// The tails file hash
    TailsHash,
    /// The tails file location
    TailsLocation,
}

impl FromStr for RevocationRegistryDefinitionAttribute {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "max_cred_num" => Ok(Self::MaxCredNum),
            "tails_hash" => Ok(Self::TailsHash),
            "tails_location" => Ok(Self::TailsLocation),
            _ => Err(err_msg!("Unsupported revocation registry attribute {:?}", s)),
        }
    }
}

/// The issuer's trapdoor for a registry
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RevocationRegistryDefinitionPrivate {
    /// The accumulator secret
    pub value: RevocationKeyPrivate,
}

/// The current accumulator value of a registry
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RevocationRegistry {
    /// The accumulator
    pub accum: Accumulator,
}

/// A change in registry membership between two accumulator values
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDelta {
    /// The accumulator before the change, absent for a registry's first delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_accum: Option<Accumulator>,
    /// The accumulator after the change
    pub accum: Accumulator,
    /// Indices added
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub issued: BTreeSet<u32>,
    /// Indices removed
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub revoked: BTreeSet<u32>,
}

impl RevocationRegistryDelta {
    /// Create a delta from its parts
    pub fn from_parts(
        prev: Option<&RevocationRegistry>,
        current: &RevocationRegistry,
        issued: &BTreeSet<u32>,
        revoked: &BTreeSet<u32>,
    ) -> Self {
        Self {
            prev_accum: prev.map(|r| r.accum),
            accum: current.accum,
            issued: issued.clone(),
            revoked: revoked.clone(),
        }
    }

    /// Append `other`, which must start where this delta ends
    pub fn merge(&mut self, other: &Self) -> CredxResult<()> {
        if other.prev_accum != Some(self.accum) {
            return Err(err_msg!(
                InvalidState,
                "Revocation registry deltas do not share an accumulator lineage"
            ));
        }

        self.accum = other.accum;

        self.issued
            .extend(other.issued.difference(&self.revoked).copied());
        let issued = &self.issued;
        self.revoked
            .extend(other.revoked.difference(issued).copied());

        for idx in &other.revoked {
            self.issued.remove(idx);
        }
        for idx in &other.issued {
            self.revoked.remove(idx);
        }
        Ok(())
    }

    /// True when nothing changed
    pub fn is_empty(&self) -> bool {
        self.issued.is_empty() && self.revoked.is_empty()
    }

    /// The registry value after this delta
    pub fn registry(&self) -> RevocationRegistry {
        RevocationRegistry { accum: self.accum }
    }
}

/// A holder's membership witness together with the registry value it
/// was computed against
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialRevocationState {
    /// Witness for the credential's index
    pub witness: Witness,
    /// The registry value at `timestamp`
    pub rev_reg: RevocationRegistry,
    /// When the registry held this value
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knox::accumulator::cks::{CredentialRevocationPublicKey, Tail};
    use blsful::inner_types::G2Projective;
    use maplit::btreeset;

    fn registry(seed: u32) -> RevocationRegistry {
        let (pk, _) = CredentialRevocationPublicKey::generate();
        let mut accum = Accumulator::default();
        accum.add(&Tail(pk.g_dash * blsful::inner_types::Scalar::from(u64::from(seed))));
        RevocationRegistry { accum }
    }

    #[test]
    fn merge_nets_out() {
        let r0 = registry(1);
        let r1 = registry(2);
        let r2 = registry(3);
        let mut first = RevocationRegistryDelta::from_parts(
            Some(&r0),
            &r1,
            &btreeset! {2},
            &btreeset! {2},
        );
        let second = RevocationRegistryDelta::from_parts(
            Some(&r1),
            &r2,
            &btreeset! {3},
            &btreeset! {3},
        );
        first.merge(&second).unwrap();
        assert_eq!(first.prev_accum, Some(r0.accum));
        assert_eq!(first.accum, r2.accum);
        assert_eq!(first.revoked, btreeset! {2});
        assert_eq!(first.issued, btreeset! {2});
    }

    #[test]
    fn merge_cancels_issue_then_revoke() {
        let r0 = registry(1);
        let r1 = registry(2);
        let r2 = registry(3);
        let mut first =
            RevocationRegistryDelta::from_parts(Some(&r0), &r1, &btreeset! {4}, &BTreeSet::new());
        let second =
            RevocationRegistryDelta::from_parts(Some(&r1), &r2, &BTreeSet::new(), &btreeset! {4});
        first.merge(&second).unwrap();
        assert!(first.is_empty());
    }

    #[test]
    fn merge_rejects_unrelated_deltas() {
        let r0 = registry(1);
        let r1 = registry(2);
        let mut first =
            RevocationRegistryDelta::from_parts(Some(&r0), &r1, &btreeset! {1}, &BTreeSet::new());
        let unrelated =
            RevocationRegistryDelta::from_parts(Some(&r0), &r1, &btreeset! {2}, &BTreeSet::new());
        let err = first.merge(&unrelated).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidState);
        assert_ne!(r0.accum.0, G2Projective::IDENTITY);
    }

    #[test]
    fn delta_json() {
        let delta = RevocationRegistryDelta::from_parts(
            None,
            &registry(5),
            &btreeset! {1, 2},
            &BTreeSet::new(),
        );
        let json = serde_json::to_value(&delta).unwrap();
        assert!(json.get("prevAccum").is_none());
        assert!(json.get("revoked").is_none());
        assert_eq!(json["issued"], serde_json::json!([1, 2]));
        let back: RevocationRegistryDelta = serde_json::from_value(json).unwrap();
        assert_eq!(back, delta);
    }
}
