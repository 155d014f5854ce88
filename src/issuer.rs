use crate::credential::{
    Credential, CredentialDefinition, CredentialDefinitionConfig, CredentialDefinitionData,
    CredentialDefinitionPrivate, CredentialDefinitionPrivateData, CredentialOffer,
    CredentialRequest, CredentialSignature, CredentialValues, Schema, SignatureType,
};
use crate::identifiers::{CredentialDefinitionId, DidValue, RevocationRegistryId, SchemaId};
use crate::knox::{
    accumulator::cks::{
        Accumulator, CredentialRevocationPublicKey, NonRevocationCredentialSignature,
        RevocationKeyPublic, RevocationTailsAccessor, Tail, TailsGenerator,
    },
    bn::BigNumber,
    cl::{CredentialKeyCorrectnessProof, CredentialPrimaryPublicKey, PrimaryCredentialSignature},
    Knox,
};
use crate::nonce::Nonce;
use crate::revocation_registry::{
    IssuanceType, RegistryType, RevocationRegistry, RevocationRegistryDefinition,
    RevocationRegistryDefinitionPrivate, RevocationRegistryDefinitionValue,
    RevocationRegistryDefinitionValuePublicKeys, RevocationRegistryDelta,
};
use crate::tails::TailsWriter;
use crate::CredxResult;
use log::{debug, trace};
use std::collections::BTreeSet;

/// Everything the issuer needs to bind a new credential to a registry index
#[derive(Clone, Copy, Debug)]
pub struct CredentialRevocationConfig<'a> {
    /// The registry definition
    pub reg_def: &'a RevocationRegistryDefinition,
    /// The registry trapdoor
    pub reg_def_private: &'a RevocationRegistryDefinitionPrivate,
    /// The current registry value
    pub registry: &'a RevocationRegistry,
    /// The index to assign
    pub registry_idx: u32,
    /// Indices already assigned
    pub registry_used: &'a BTreeSet<u32>,
}

/// Create a schema owned by `origin_did`
pub fn create_schema<I, S>(
    origin_did: &DidValue,
    name: &str,
    version: &str,
    attr_names: I,
) -> CredxResult<Schema>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let schema = Schema::new(origin_did, name, version, attr_names)?;
    trace!("created schema {}", schema.id);
    Ok(schema)
}

/// Generate the keys of a new credential definition for `schema`
pub fn create_credential_definition(
    origin_did: &DidValue,
    schema: &Schema,
    tag: &str,
    signature_type: SignatureType,
    config: CredentialDefinitionConfig,
) -> CredxResult<(
    CredentialDefinition,
    CredentialDefinitionPrivate,
    CredentialKeyCorrectnessProof,
)> {
    origin_did.validate()?;
    schema.validate()?;
    if tag.is_empty() {
        return Err(err_msg!("Credential definition tag is empty"));
    }
    let modulus_bits = config.modulus_bits()?;

    let attr_names = schema.common_attr_names();
    let (primary, p_key, correctness_proof) =
        CredentialPrimaryPublicKey::generate(attr_names.iter(), modulus_bits)?;
    let (revocation, r_key) = if config.support_revocation {
        let (pk, sk) = CredentialRevocationPublicKey::generate();
        (Some(pk), Some(sk))
    } else {
        (None, None)
    };

    let schema_ref = schema
        .seq_no
        .map(|n| n.to_string())
        .unwrap_or_else(|| schema.id.to_string());
    let cred_def = CredentialDefinition {
        ver: "1.0".to_string(),
        id: CredentialDefinitionId::from_parts(origin_did, &schema_ref, tag),
        schema_id: schema.id.clone(),
        signature_type,
        tag: tag.to_string(),
        value: CredentialDefinitionData {
            primary,
            revocation,
        },
    };
    debug!(
        "created credential definition {}",
        serde_json::to_string_pretty(&cred_def)?
    );
    Ok((
        cred_def,
        CredentialDefinitionPrivate {
            value: CredentialDefinitionPrivateData { p_key, r_key },
        },
        correctness_proof,
    ))
}

/// Offer a credential of `cred_def` to a holder
pub fn create_credential_offer(
    schema_id: &SchemaId,
    cred_def: &CredentialDefinition,
    correctness_proof: &CredentialKeyCorrectnessProof,
) -> CredxResult<CredentialOffer> {
    if *schema_id != cred_def.schema_id {
        return Err(err_msg!(
            "Schema {} is not the schema of credential definition {}",
            schema_id,
            cred_def.id
        ));
    }
    Ok(CredentialOffer {
        schema_id: schema_id.clone(),
        cred_def_id: cred_def.id.clone(),
        key_correctness_proof: correctness_proof.clone(),
        nonce: Nonce::new(),
    })
}

/// The context value `m_2` binding a credential to its holder and
/// registry index
pub(crate) fn credential_context(prover_did: &DidValue, rev_idx: Option<u32>) -> BigNumber {
    let rev_idx = rev_idx.map(i64::from).unwrap_or(-1);
    Knox::hash_to_bignumber(format!("{}:{}", prover_did, rev_idx).as_bytes())
}

/// Sign a credential for the holder's request.
///
/// With a revocation config the credential is bound to `registry_idx`.
/// For [`IssuanceType::ISSUANCE_ON_DEMAND`] registries the index is also
/// added to the accumulator, and the new registry and its delta are
/// returned.
pub fn create_credential(
    cred_def: &CredentialDefinition,
    cred_def_private: &CredentialDefinitionPrivate,
    offer: &CredentialOffer,
    request: &CredentialRequest,
    values: CredentialValues,
    revocation_config: Option<CredentialRevocationConfig<'_>>,
) -> CredxResult<(
    Credential,
    Option<RevocationRegistry>,
    Option<RevocationRegistryDelta>,
)> {
    if offer.cred_def_id != cred_def.id || request.cred_def_id != cred_def.id {
        return Err(err_msg!(
            "Offer and request must both reference credential definition {}",
            cred_def.id
        ));
    }
    let pk = cred_def.primary_key();
    request.blinded_ms_correctness_proof.verify(
        &request.blinded_ms,
        pk,
        offer.nonce.as_native(),
    )?;

    let mut new_registry = None;
    let mut delta = None;
    let rev_reg_id;
    let rev_idx;

    match revocation_config {
        Some(config) => {
            let reg_def = config.reg_def;
            if reg_def.cred_def_id != cred_def.id {
                return Err(err_msg!(
                    "Revocation registry {} does not belong to {}",
                    reg_def.id,
                    cred_def.id
                ));
            }
            reg_def.check_index(config.registry_idx)?;
            if config.registry_used.contains(&config.registry_idx)
                || config.registry_used.len() >= reg_def.value.max_cred_num as usize
            {
                return Err(err_msg!(
                    RevocationRegistryFull,
                    "Index {} of {} is already used",
                    config.registry_idx,
                    reg_def.id
                ));
            }
            if reg_def.value.issuance_type == IssuanceType::ISSUANCE_ON_DEMAND {
                let r_pk = cred_def
                    .revocation_key()
                    .ok_or_else(|| err_msg!("Credential definition does not support revocation"))?;
                let mut registry = *config.registry;
                registry.accum.add(&Tail::new(
                    Accumulator::tail_index(reg_def.value.max_cred_num, config.registry_idx),
                    &r_pk.g_dash,
                    &config.reg_def_private.value.gamma,
                ));
                let mut issued = BTreeSet::new();
                issued.insert(config.registry_idx);
                delta = Some(RevocationRegistryDelta::from_parts(
                    Some(config.registry),
                    &registry,
                    &issued,
                    &BTreeSet::new(),
                ));
                new_registry = Some(registry);
            }
            rev_reg_id = Some(reg_def.id.clone());
            rev_idx = Some(config.registry_idx);
        }
        None => {
            rev_reg_id = None;
            rev_idx = None;
        }
    }

    let m_2 = credential_context(&request.prover_did, rev_idx);
    let (p_credential, signature_correctness_proof) = PrimaryCredentialSignature::new(
        pk,
        &cred_def_private.value.p_key,
        &m_2,
        &values.encoded()?,
        &request.blinded_ms.u,
        request.nonce.as_native(),
    )?;

    let r_credential = match (revocation_config, rev_idx) {
        (Some(config), Some(idx)) => {
            let r_pk = cred_def
                .revocation_key()
                .ok_or_else(|| err_msg!("Credential definition does not support revocation"))?;
            let r_sk = cred_def_private
                .value
                .r_key
                .as_ref()
                .ok_or_else(|| err_msg!("Credential definition private key has no revocation key"))?;
            let ur = request
                .blinded_ms
                .ur
                .as_ref()
                .ok_or_else(|| err_msg!("Credential request is missing the revocation commitment"))?;
            Some(NonRevocationCredentialSignature::new(
                r_pk,
                r_sk,
                &config.reg_def_private.value,
                idx,
                m_2.to_scalar()?,
                ur,
            )?)
        }
        _ => None,
    };

    let credential = Credential {
        schema_id: offer.schema_id.clone(),
        cred_def_id: cred_def.id.clone(),
        rev_reg_id,
        values,
        signature: CredentialSignature {
            p_credential,
            r_credential,
        },
        signature_correctness_proof,
    };
    debug!(
        "issued credential for {} at index {:?}",
        credential.cred_def_id, rev_idx
    );
    Ok((credential, new_registry, delta))
}

/// Create a revocation registry for `cred_def` and write its tails
pub fn create_revocation_registry<TW>(
    origin_did: &DidValue,
    cred_def: &CredentialDefinition,
    tag: &str,
    rev_reg_type: RegistryType,
    issuance_type: IssuanceType,
    max_cred_num: u32,
    tails_writer: &mut TW,
) -> CredxResult<(
    RevocationRegistryDefinition,
    RevocationRegistryDefinitionPrivate,
    RevocationRegistry,
    RevocationRegistryDelta,
)>
where
    TW: TailsWriter,
{
    origin_did.validate()?;
    let r_pk = cred_def
        .revocation_key()
        .ok_or_else(|| err_msg!("Credential definition does not support revocation"))?;
    if max_cred_num == 0 {
        return Err(err_msg!("Revocation registry capacity must be at least 1"));
    }

    let (accum_key, key_private) = RevocationKeyPublic::generate(r_pk, max_cred_num);
    let mut generator = TailsGenerator::new(r_pk.g_dash, &key_private, max_cred_num);
    let (tails_location, tails_hash) = tails_writer.write(&mut generator)?;

    let (accum, issued) = if issuance_type.by_default() {
        (
            Accumulator::full(&r_pk.g_dash, &key_private, max_cred_num),
            (1..=max_cred_num).collect::<BTreeSet<_>>(),
        )
    } else {
        (Accumulator::default(), BTreeSet::new())
    };
    let registry = RevocationRegistry { accum };
    let delta = RevocationRegistryDelta::from_parts(None, &registry, &issued, &BTreeSet::new());

    let reg_def = RevocationRegistryDefinition {
        ver: "1.0".to_string(),
        id: RevocationRegistryId::from_parts(origin_did, &cred_def.id, tag),
        revoc_def_type: rev_reg_type,
        tag: tag.to_string(),
        cred_def_id: cred_def.id.clone(),
        value: RevocationRegistryDefinitionValue {
            issuance_type,
            max_cred_num,
            public_keys: RevocationRegistryDefinitionValuePublicKeys { accum_key },
            tails_hash,
            tails_location,
        },
    };
    debug!(
        "created revocation registry {}",
        serde_json::to_string_pretty(&reg_def)?
    );
    Ok((
        reg_def,
        RevocationRegistryDefinitionPrivate { value: key_private },
        registry,
        delta,
    ))
}

/// Add `issued` and remove `revoked` from the registry's accumulator
pub fn update_revocation_registry(
    rev_reg_def: &RevocationRegistryDefinition,
    rev_reg: &RevocationRegistry,
    issued: BTreeSet<u32>,
    revoked: BTreeSet<u32>,
    tails: &impl RevocationTailsAccessor,
) -> CredxResult<(RevocationRegistry, RevocationRegistryDelta)> {
    let max_cred_num = rev_reg_def.value.max_cred_num;
    let mut registry = *rev_reg;
    for idx in &issued {
        rev_reg_def.check_index(*idx)?;
        registry
            .accum
            .add(&tails.access_tail(Accumulator::tail_index(max_cred_num, *idx))?);
    }
    for idx in &revoked {
        rev_reg_def.check_index(*idx)?;
        registry
            .accum
            .sub(&tails.access_tail(Accumulator::tail_index(max_cred_num, *idx))?);
    }
    let delta = RevocationRegistryDelta::from_parts(Some(rev_reg), &registry, &issued, &revoked);
    debug!(
        "updated revocation registry {}: issued {:?} revoked {:?}",
        rev_reg_def.id, issued, revoked
    );
    Ok((registry, delta))
}

/// Remove one credential index from the registry
pub fn revoke_credential(
    rev_reg_def: &RevocationRegistryDefinition,
    rev_reg: &RevocationRegistry,
    cred_rev_idx: u32,
    tails: &impl RevocationTailsAccessor,
) -> CredxResult<(RevocationRegistry, RevocationRegistryDelta)> {
    let mut revoked = BTreeSet::new();
    revoked.insert(cred_rev_idx);
    update_revocation_registry(rev_reg_def, rev_reg, BTreeSet::new(), revoked, tails)
}

/// Combine two consecutive deltas into one
pub fn merge_revocation_registry_deltas(
    first: &RevocationRegistryDelta,
    second: &RevocationRegistryDelta,
) -> CredxResult<RevocationRegistryDelta> {
    let mut merged = first.clone();
    merged.merge(second)?;
    Ok(merged)
}
