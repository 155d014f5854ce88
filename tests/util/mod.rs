#![allow(dead_code)]

use credx_cl::knox::cl::CredentialKeyCorrectnessProof;
use credx_cl::prelude::*;
use lazy_static::lazy_static;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeSet;

pub const ISSUER_DID: &str = "NcYxiDXkpYi6ov5FcYDi1e";
pub const PROVER_DID: &str = "VsKV7grR1BUE29mG2Fm2kX";
pub const MASTER_SECRET_ID: &str = "default";

/// Small moduli keep key generation fast enough for tests
pub const TEST_MODULUS_BITS: usize = 512;

pub struct IssuerKeys {
    pub schema: Schema,
    pub cred_def: CredentialDefinition,
    pub cred_def_private: CredentialDefinitionPrivate,
    pub key_proof: CredentialKeyCorrectnessProof,
}

lazy_static! {
    pub static ref GVT: IssuerKeys = issuer_keys("gvt", &["name", "sex", "height", "age"], false);
    pub static ref GVT_REVOCABLE: IssuerKeys =
        issuer_keys("gvt", &["name", "sex", "height", "age"], true);
    pub static ref XYZ: IssuerKeys = issuer_keys("xyz", &["status", "period"], false);
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn issuer_did() -> DidValue {
    DidValue::new(ISSUER_DID).unwrap()
}

pub fn prover_did() -> DidValue {
    DidValue::new(PROVER_DID).unwrap()
}

pub fn issuer_keys(name: &str, attrs: &[&str], revocable: bool) -> IssuerKeys {
    let schema = issuer::create_schema(&issuer_did(), name, "1.0", attrs.iter().copied()).unwrap();
    let tag = if revocable { "revocable" } else { "default" };
    let (cred_def, cred_def_private, key_proof) = issuer::create_credential_definition(
        &issuer_did(),
        &schema,
        tag,
        SignatureType::CL,
        CredentialDefinitionConfig::new(revocable).with_modulus_bits(TEST_MODULUS_BITS),
    )
    .unwrap();
    IssuerKeys {
        schema,
        cred_def,
        cred_def_private,
        key_proof,
    }
}

pub fn gvt_values() -> CredentialValues {
    let mut values = MakeCredentialValues::new();
    values.add_raw("name", "Alex").unwrap();
    values.add_raw("sex", "male").unwrap();
    values.add_raw("height", "175").unwrap();
    values.add_raw("age", "28").unwrap();
    values.into()
}

pub fn xyz_values() -> CredentialValues {
    let mut values = MakeCredentialValues::new();
    values.add_raw("status", "partial").unwrap();
    values.add_raw("period", "8").unwrap();
    values.into()
}

/// Serialize, parse back and check the JSON is unchanged
pub fn round_trip<T: Serialize + DeserializeOwned>(value: &T) -> T {
    let json = serde_json::to_string(value).unwrap();
    let parsed: T = serde_json::from_str(&json).unwrap();
    assert_eq!(serde_json::to_string(&parsed).unwrap(), json);
    parsed
}

/// A registry with its tails kept in memory
pub struct Registry {
    pub def: RevocationRegistryDefinition,
    pub private: RevocationRegistryDefinitionPrivate,
    pub registry: RevocationRegistry,
    pub delta: RevocationRegistryDelta,
    pub tails: TailsReader,
    pub used: BTreeSet<u32>,
}

pub fn create_registry(keys: &IssuerKeys, issuance_type: IssuanceType, max_cred_num: u32) -> Registry {
    let mut writer = TailsMemoryWriter::new();
    let (def, private, registry, delta) = issuer::create_revocation_registry(
        &issuer_did(),
        &keys.cred_def,
        "default",
        RegistryType::CL_ACCUM,
        issuance_type,
        max_cred_num,
        &mut writer,
    )
    .unwrap();
    Registry {
        def,
        private,
        registry,
        delta,
        tails: writer.reader().into(),
        used: BTreeSet::new(),
    }
}

/// Run offer, request, issuance and processing for one credential
pub fn issue(
    keys: &IssuerKeys,
    master_secret: &MasterSecret,
    values: CredentialValues,
    registry: Option<(&mut Registry, u32)>,
) -> CredxResult<Credential> {
    let offer = issuer::create_credential_offer(&keys.schema.id, &keys.cred_def, &keys.key_proof)?;
    let (request, metadata) = prover::create_credential_request(
        &prover_did(),
        &keys.cred_def,
        master_secret,
        MASTER_SECRET_ID,
        &offer,
    )?;

    let (mut credential, rev_def) = match registry {
        Some((reg, idx)) => {
            let config = issuer::CredentialRevocationConfig {
                reg_def: &reg.def,
                reg_def_private: &reg.private,
                registry: &reg.registry,
                registry_idx: idx,
                registry_used: &reg.used,
            };
            let (credential, new_registry, delta) = issuer::create_credential(
                &keys.cred_def,
                &keys.cred_def_private,
                &offer,
                &request,
                values,
                Some(config),
            )?;
            if let (Some(new_registry), Some(delta)) = (new_registry, delta) {
                reg.registry = new_registry;
                reg.delta.merge(&delta)?;
            }
            reg.used.insert(idx);
            (credential, Some(&*reg))
        }
        None => {
            let (credential, _, _) = issuer::create_credential(
                &keys.cred_def,
                &keys.cred_def_private,
                &offer,
                &request,
                values,
                None,
            )?;
            (credential, None)
        }
    };

    prover::process_credential(
        &mut credential,
        &metadata,
        master_secret,
        &keys.cred_def,
        rev_def.map(|r| &r.def),
    )?;
    Ok(credential)
}
