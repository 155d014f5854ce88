use crate::credential::{
    Credential, CredentialDefinition, CredentialOffer, CredentialRequest,
    CredentialRequestMetadata, MasterSecret, Schema,
};
use crate::identifiers::{CredentialDefinitionId, DidValue, SchemaId};
use crate::knox::{
    accumulator::cks::{RevocationTailsAccessor, Witness},
    cl::BlindedCredentialSecrets,
};
use crate::nonce::Nonce;
use crate::presentation::{PresentCredentials, Presentation, PresentationRequest};
use crate::revocation_registry::{
    CredentialRevocationState, RevocationRegistryDefinition, RevocationRegistryDelta,
};
use crate::CredxResult;
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Create a new random master secret
pub fn create_master_secret() -> MasterSecret {
    MasterSecret::new()
}

/// Request a credential for an offer, committing to `master_secret`
pub fn create_credential_request(
    prover_did: &DidValue,
    cred_def: &CredentialDefinition,
    master_secret: &MasterSecret,
    master_secret_id: &str,
    offer: &CredentialOffer,
) -> CredxResult<(CredentialRequest, CredentialRequestMetadata)> {
    prover_did.validate()?;
    if master_secret_id.is_empty() {
        return Err(err_msg!("Master secret id is empty"));
    }
    if offer.cred_def_id != cred_def.id {
        return Err(err_msg!(
            "Offer is for {} but the credential definition is {}",
            offer.cred_def_id,
            cred_def.id
        ));
    }
    let pk = cred_def.primary_key();
    offer
        .key_correctness_proof
        .verify(pk)
        .map_err(|e| err_msg!("Invalid key correctness proof: {}", e))?;

    let (blinded_ms, blinding_factors, blinded_ms_correctness_proof) =
        BlindedCredentialSecrets::new(
            pk,
            cred_def.revocation_key(),
            master_secret.value(),
            offer.nonce.as_native(),
        )?;
    let nonce = Nonce::new();
    trace!("created credential request for {}", cred_def.id);
    Ok((
        CredentialRequest {
            prover_did: prover_did.clone(),
            cred_def_id: cred_def.id.clone(),
            blinded_ms,
            blinded_ms_correctness_proof,
            nonce: nonce.clone(),
        },
        CredentialRequestMetadata {
            master_secret_blinding_data: blinding_factors,
            nonce,
            master_secret_name: master_secret_id.to_string(),
        },
    ))
}

/// Unblind an issued credential and check it against `master_secret`.
///
/// `credential` is only updated when every check passes.
pub fn process_credential(
    credential: &mut Credential,
    metadata: &CredentialRequestMetadata,
    master_secret: &MasterSecret,
    cred_def: &CredentialDefinition,
    rev_reg_def: Option<&RevocationRegistryDefinition>,
) -> CredxResult<()> {
    if credential.cred_def_id != cred_def.id {
        return Err(err_msg!(
            "Credential is for {} but the credential definition is {}",
            credential.cred_def_id,
            cred_def.id
        ));
    }
    let mut processed = credential.clone();
    let signature = &mut processed.signature;
    signature
        .p_credential
        .unblind(&metadata.master_secret_blinding_data.v_prime);

    let values = processed
        .values
        .encoded_with_master_secret(master_secret.value())?;
    signature.p_credential.verify(
        &processed.signature_correctness_proof,
        cred_def.primary_key(),
        &values,
        metadata.nonce.as_native(),
    )?;

    match (&mut signature.r_credential, rev_reg_def) {
        (Some(r_credential), Some(rev_reg_def)) => {
            if processed.rev_reg_id.as_ref() != Some(&rev_reg_def.id) {
                return Err(err_msg!(
                    InvalidState,
                    "Credential was not issued from registry {}",
                    rev_reg_def.id
                ));
            }
            rev_reg_def.check_index(r_credential.index())?;
            let vr_prime = metadata
                .master_secret_blinding_data
                .vr_prime
                .ok_or_else(|| err_msg!(InvalidState, "Request metadata has no revocation blinding"))?;
            r_credential.unblind(&vr_prime);
            let r_pk = cred_def.revocation_key().ok_or_else(|| {
                err_msg!(InvalidState, "Credential definition does not support revocation")
            })?;
            r_credential.verify(r_pk)?;
            if r_credential.m2 != signature.p_credential.m_2.to_scalar()? {
                return Err(err_msg!(
                    InvalidState,
                    "Credential context differs between signatures"
                ));
            }
        }
        (None, None) => {}
        (Some(_), None) => {
            return Err(err_msg!(
                "A revocation registry definition is required for a revocable credential"
            ))
        }
        (None, Some(_)) => {
            return Err(err_msg!(InvalidState, "Credential is not revocable"));
        }
    }

    debug!("processed credential for {}", processed.cred_def_id);
    *credential = processed;
    Ok(())
}

/// Build or refresh the witness for credential `rev_reg_idx`.
///
/// Without `prior` the witness is computed from the registry's initial
/// membership adjusted by `rev_reg_delta`. With `prior`, `rev_reg_delta`
/// must start at the prior state's accumulator and only its changes are
/// applied.
pub fn create_or_update_revocation_state(
    tails: &impl RevocationTailsAccessor,
    rev_reg_def: &RevocationRegistryDefinition,
    rev_reg_delta: &RevocationRegistryDelta,
    rev_reg_idx: u32,
    timestamp: u64,
    prior: Option<&CredentialRevocationState>,
) -> CredxResult<CredentialRevocationState> {
    rev_reg_def.check_index(rev_reg_idx)?;
    let max_cred_num = rev_reg_def.value.max_cred_num;

    let witness = match prior {
        None => {
            // a delta from creation lists every member in `issued`
            let members = if rev_reg_delta.prev_accum.is_none()
                || !rev_reg_def.value.issuance_type.by_default()
            {
                rev_reg_delta
                    .issued
                    .difference(&rev_reg_delta.revoked)
                    .copied()
                    .collect::<BTreeSet<_>>()
            } else {
                (1..=max_cred_num)
                    .filter(|i| !rev_reg_delta.revoked.contains(i))
                    .collect()
            };
            if !members.contains(&rev_reg_idx) {
                return Err(err_msg!(
                    CredentialRevoked,
                    "Index {} is not a member of {}",
                    rev_reg_idx,
                    rev_reg_def.id
                ));
            }
            Witness::new(rev_reg_idx, max_cred_num, &members, tails)?
        }
        Some(prior) => {
            if rev_reg_delta.accum == prior.rev_reg.accum {
                trace!("registry {} unchanged", rev_reg_def.id);
                return Ok(CredentialRevocationState {
                    timestamp,
                    ..*prior
                });
            }
            if rev_reg_delta.prev_accum.as_ref() != Some(&prior.rev_reg.accum) {
                return Err(err_msg!(
                    InvalidState,
                    "Delta does not start at the prior state's accumulator"
                ));
            }
            if rev_reg_delta.revoked.contains(&rev_reg_idx)
                && !rev_reg_delta.issued.contains(&rev_reg_idx)
            {
                return Err(err_msg!(
                    CredentialRevoked,
                    "Index {} was revoked from {}",
                    rev_reg_idx,
                    rev_reg_def.id
                ));
            }
            let mut witness = prior.witness;
            witness.update(
                rev_reg_idx,
                max_cred_num,
                &rev_reg_delta.issued,
                &rev_reg_delta.revoked,
                tails,
            )?;
            witness
        }
    };

    debug!(
        "revocation state for {} index {} at {}",
        rev_reg_def.id, rev_reg_idx, timestamp
    );
    Ok(CredentialRevocationState {
        witness,
        rev_reg: rev_reg_delta.registry(),
        timestamp,
    })
}

/// Create a presentation, see [`Presentation::create`]
pub fn create_presentation(
    pres_req: &PresentationRequest,
    credentials: &PresentCredentials<'_>,
    self_attested: Option<&BTreeMap<String, String>>,
    master_secret: &MasterSecret,
    schemas: &HashMap<SchemaId, &Schema>,
    cred_defs: &HashMap<CredentialDefinitionId, &CredentialDefinition>,
) -> CredxResult<Presentation> {
    Presentation::create(
        pres_req,
        credentials,
        self_attested,
        master_secret,
        schemas,
        cred_defs,
    )
}
