use super::*;
use crate::credential::{CredentialDefinition, MasterSecret};
use crate::identifiers::SchemaId;
use crate::knox::cl::{Predicate, LARGE_MVECT, MASTER_SECRET};
use crate::utils::attr_common_view;
use log::{debug, trace};
use std::collections::{BTreeSet, HashMap};

impl Presentation {
    /// Create a presentation answering `pres_req` with the selected
    /// credentials and self attested values
    pub fn create(
        pres_req: &PresentationRequest,
        credentials: &PresentCredentials<'_>,
        self_attested: Option<&BTreeMap<String, String>>,
        master_secret: &MasterSecret,
        schemas: &HashMap<SchemaId, &Schema>,
        cred_defs: &HashMap<CredentialDefinitionId, &CredentialDefinition>,
    ) -> CredxResult<Self> {
        pres_req.validate()?;
        credentials.validate()?;

        let mut requested_proof = RequestedProof::default();
        if let Some(self_attested) = self_attested {
            for (referent, value) in self_attested {
                if !pres_req.requested_attributes.contains_key(referent) {
                    return Err(err_msg!("Self attested referent {} was not requested", referent));
                }
                requested_proof
                    .self_attested_attrs
                    .insert(referent.clone(), value.clone());
            }
        }
        Self::check_all_answered(pres_req, credentials, &requested_proof)?;

        let mut common_tildes = BTreeMap::new();
        common_tildes.insert(MASTER_SECRET.to_string(), BigNumber::random(LARGE_MVECT));

        let mut contribution = ChallengeContribution::default();
        let mut builders = Vec::new();
        let mut identifiers = Vec::new();

        for present in credentials.0.iter().filter(|c| !c.is_empty()) {
            let sub_proof_index = identifiers.len() as u32;
            let cred = present.cred;
            let schema = schemas
                .get(&cred.schema_id)
                .ok_or_else(|| err_msg!("Schema {} was not provided", cred.schema_id))?;
            let cred_def = cred_defs
                .get(&cred.cred_def_id)
                .ok_or_else(|| err_msg!("Credential definition {} was not provided", cred.cred_def_id))?;
            let tags = restriction_tags(
                schema,
                &cred.cred_def_id,
                cred.rev_reg_id.as_ref(),
                cred.values
                    .iter()
                    .map(|(name, v)| (name.as_str(), Some(v.raw.as_str()))),
            );

            let mut revealed = BTreeSet::new();
            let mut needs_non_revoc = false;
            for (referent, reveal) in &present.requested_attributes {
                let info = pres_req
                    .requested_attributes
                    .get(referent)
                    .ok_or_else(|| err_msg!("Referent {} is not in the request", referent))?;
                let names = info.names_checked(referent)?;
                for name in &names {
                    if cred.values.get(name).is_none() {
                        return Err(err_msg!("Credential has no attribute {} for {}", name, referent));
                    }
                }
                Self::check_credential_restrictions(info.restrictions.as_ref(), &tags, referent)?;
                needs_non_revoc |= NonRevokedInterval::get_non_revoc_interval(
                    pres_req.non_revoked.as_ref(),
                    info.non_revoked.as_ref(),
                )
                .is_some();

                match (&info.name, &info.names) {
                    (Some(name), _) if *reveal => {
                        let value = cred
                            .values
                            .get(name)
                            .ok_or_else(|| err_msg!(Unexpected, "Missing attribute {}", name))?;
                        revealed.insert(attr_common_view(name));
                        requested_proof.revealed_attrs.insert(
                            referent.clone(),
                            RevealedAttributeInfo {
                                sub_proof_index,
                                raw: value.raw.clone(),
                                encoded: value.encoded.clone(),
                            },
                        );
                    }
                    (Some(_), _) => {
                        requested_proof
                            .unrevealed_attrs
                            .insert(referent.clone(), SubProofReferent { sub_proof_index });
                    }
                    (None, Some(group)) => {
                        // groups are always disclosed
                        let mut values = BTreeMap::new();
                        for name in group {
                            let value = cred
                                .values
                                .get(name)
                                .ok_or_else(|| err_msg!(Unexpected, "Missing attribute {}", name))?;
                            revealed.insert(attr_common_view(name));
                            values.insert(
                                name.clone(),
                                AttributeValue {
                                    raw: value.raw.clone(),
                                    encoded: value.encoded.clone(),
                                },
                            );
                        }
                        requested_proof.revealed_attr_groups.insert(
                            referent.clone(),
                            RevealedAttributeGroupInfo {
                                sub_proof_index,
                                values,
                            },
                        );
                    }
                    (None, None) => {
                        return Err(err_msg!(Unexpected, "Referent {} has no names", referent))
                    }
                }
            }

            let mut predicates = Vec::with_capacity(present.requested_predicates.len());
            for referent in &present.requested_predicates {
                let info = pres_req
                    .requested_predicates
                    .get(referent)
                    .ok_or_else(|| err_msg!("Referent {} is not in the request", referent))?;
                let name = attr_common_view(&info.name);
                if cred.values.get(&name).is_none() {
                    return Err(err_msg!("Credential has no attribute {} for {}", name, referent));
                }
                Self::check_credential_restrictions(info.restrictions.as_ref(), &tags, referent)?;
                needs_non_revoc |= NonRevokedInterval::get_non_revoc_interval(
                    pres_req.non_revoked.as_ref(),
                    info.non_revoked.as_ref(),
                )
                .is_some();
                predicates.push(Predicate::new(name, info.p_type, info.p_value));
                requested_proof
                    .predicates
                    .insert(referent.clone(), SubProofReferent { sub_proof_index });
            }

            if needs_non_revoc
                && cred.signature.r_credential.is_some()
                && present.rev_state.is_none()
            {
                return Err(err_msg!(
                    "A revocation state is required to prove non-revocation for {}",
                    cred.cred_def_id
                ));
            }

            let (rev_builder, m2_tilde) = match (present.rev_state, &cred.signature.r_credential) {
                (Some(rev_state), Some(r_credential)) => {
                    let r_pk = cred_def.revocation_key().ok_or_else(|| {
                        err_msg!("Credential definition {} does not support revocation", cred_def.id)
                    })?;
                    // the revocation proof blinds m2 with the same value reduced mod q
                    let m2_tilde = BigNumber::random(LARGE_MVECT);
                    let rev_builder = RevocationBuilder::commit(
                        r_pk,
                        rev_state,
                        r_credential,
                        m2_tilde.to_scalar()?,
                    )?;
                    (Some(rev_builder), m2_tilde)
                }
                _ => (None, BigNumber::random(LARGE_MVECT)),
            };

            let values = cred.values.encoded_with_master_secret(master_secret.value())?;
            let sig_builder = SignatureBuilder::commit(
                cred_def.primary_key(),
                &cred.signature.p_credential,
                &values,
                &revealed,
                &predicates,
                &common_tildes,
                m2_tilde,
            )?;

            if let Some(rev_builder) = &rev_builder {
                rev_builder.add_challenge_contribution(&mut contribution);
            }
            sig_builder.add_challenge_contribution(&mut contribution);

            let proves_non_revoc = rev_builder.is_some();
            builders.push((sig_builder, rev_builder));
            identifiers.push(Identifier {
                schema_id: cred.schema_id.clone(),
                cred_def_id: cred.cred_def_id.clone(),
                rev_reg_id: cred.rev_reg_id.clone().filter(|_| proves_non_revoc),
                timestamp: present.timestamp.filter(|_| proves_non_revoc),
            });
            trace!(
                "sub-proof {} for {}: revealed {:?}",
                sub_proof_index,
                cred.cred_def_id,
                revealed
            );
        }

        let c_hash = contribution.challenge(pres_req.nonce.as_native());
        let mut proofs = Vec::with_capacity(builders.len());
        for (sig_builder, rev_builder) in builders {
            let non_revoc_proof = match rev_builder {
                Some(b) => Some(b.gen_proof(&c_hash)?),
                None => None,
            };
            proofs.push(SubProof {
                primary_proof: sig_builder.gen_proof(&c_hash)?,
                non_revoc_proof,
            });
        }

        debug!(
            "created presentation {} with {} sub-proofs",
            pres_req.name,
            proofs.len()
        );
        Ok(Self {
            proof: Proof {
                proofs,
                aggregated_proof: AggregatedProof {
                    c_hash,
                    c_list: contribution.into_c_list(),
                },
            },
            requested_proof,
            identifiers,
        })
    }

    fn check_all_answered(
        pres_req: &PresentationRequest,
        credentials: &PresentCredentials<'_>,
        requested_proof: &RequestedProof,
    ) -> CredxResult<()> {
        let attrs = credentials
            .0
            .iter()
            .flat_map(|c| c.requested_attributes.iter().map(|(r, _)| r.as_str()))
            .collect::<BTreeSet<_>>();
        let preds = credentials
            .0
            .iter()
            .flat_map(|c| c.requested_predicates.iter().map(String::as_str))
            .collect::<BTreeSet<_>>();
        for referent in pres_req.requested_attributes.keys() {
            let by_cred = attrs.contains(referent.as_str());
            let self_attested = requested_proof.self_attested_attrs.contains_key(referent);
            if by_cred == self_attested {
                return Err(err_msg!(
                    "Referent {} must be answered exactly once",
                    referent
                ));
            }
        }
        if let Some(referent) = pres_req
            .requested_predicates
            .keys()
            .find(|r| !preds.contains(r.as_str()))
        {
            return Err(err_msg!("Predicate referent {} is not answered", referent));
        }
        Ok(())
    }

    fn check_credential_restrictions(
        restrictions: Option<&Query>,
        tags: &BTreeMap<String, String>,
        referent: &str,
    ) -> CredxResult<()> {
        match restrictions {
            Some(query) if !query.matches(tags)? => Err(err_msg!(
                "Credential does not satisfy the restrictions of {}",
                referent
            )),
            _ => Ok(()),
        }
    }
}
