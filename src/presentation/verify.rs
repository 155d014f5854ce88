use super::*;
use crate::credential::CredentialDefinition;
use crate::identifiers::SchemaId;
use crate::knox::cl::{Predicate, MASTER_SECRET};
use crate::revocation_registry::{RevocationRegistry, RevocationRegistryDefinition};
use crate::utils::{attr_common_view, encode_credential_attribute};
use crate::verifier::{ProofVerifiers, RevocationVerifier, SignatureVerifier};
use log::debug;
use std::collections::{BTreeSet, HashMap};

/// Which sub-proof answers a referent and with what
struct Answer<'a> {
    sub_proof_index: usize,
    names: Vec<String>,
    revealed: Vec<(String, &'a str, &'a str)>,
    restrictions: Option<&'a Query>,
    interval: Option<NonRevokedInterval>,
}

impl Presentation {
    /// Verify this presentation against `pres_req`.
    ///
    /// Returns `Ok(false)` when the proofs do not hold.
    pub fn verify(
        &self,
        pres_req: &PresentationRequest,
        schemas: &HashMap<SchemaId, &Schema>,
        cred_defs: &HashMap<CredentialDefinitionId, &CredentialDefinition>,
        rev_reg_defs: Option<&HashMap<RevocationRegistryId, &RevocationRegistryDefinition>>,
        rev_regs: Option<&HashMap<RevocationRegistryId, HashMap<u64, &RevocationRegistry>>>,
    ) -> CredxResult<bool> {
        pres_req.validate()?;
        let proofs = &self.proof.proofs;
        if self.identifiers.len() != proofs.len() {
            return Err(err_msg!(
                "Presentation has {} identifiers for {} sub-proofs",
                self.identifiers.len(),
                proofs.len()
            ));
        }

        let answers = self.collect_answers(pres_req)?;

        for answer in &answers {
            let eq_proof = &proofs[answer.sub_proof_index].primary_proof.eq_proof;
            for (name, _, encoded) in &answer.revealed {
                let encoded = BigNumber::from_dec(encoded)?;
                if eq_proof.revealed(name) != Some(&encoded) {
                    debug!("revealed value of {} does not match the proof", name);
                    return Ok(false);
                }
            }
        }
        for (referent, info) in &pres_req.requested_predicates {
            let index = self.predicate_index(referent)?;
            let expected = Predicate::new(attr_common_view(&info.name), info.p_type, info.p_value);
            if !proofs[index]
                .primary_proof
                .ge_proofs
                .iter()
                .any(|ge| *ge.predicate() == expected)
            {
                debug!("predicate {} is not proven by sub-proof {}", referent, index);
                return Ok(false);
            }
        }

        self.check_restrictions(&answers, schemas)?;
        self.check_non_revoked(&answers, cred_defs)?;

        let mut master_secret_cap = None;
        let mut verifiers = Vec::<ProofVerifiers<'_>>::with_capacity(proofs.len() * 2);
        for (sub_proof, identifier) in proofs.iter().zip(&self.identifiers) {
            let cred_def = cred_defs.get(&identifier.cred_def_id).ok_or_else(|| {
                err_msg!("Credential definition {} was not provided", identifier.cred_def_id)
            })?;
            let eq_proof = &sub_proof.primary_proof.eq_proof;
            match (eq_proof.m_cap(MASTER_SECRET), master_secret_cap) {
                (None, _) => return Ok(false),
                (Some(m), Some(prev)) if m != prev => {
                    debug!("sub-proofs were made with different master secrets");
                    return Ok(false);
                }
                (Some(m), _) => master_secret_cap = Some(m),
            }

            if let Some(non_revoc_proof) = &sub_proof.non_revoc_proof {
                let r_pk = cred_def.revocation_key().ok_or_else(|| {
                    err_msg!("Credential definition {} does not support revocation", cred_def.id)
                })?;
                let (rev_reg_id, timestamp) = match (&identifier.rev_reg_id, identifier.timestamp) {
                    (Some(id), Some(ts)) => (id, ts),
                    _ => {
                        return Err(err_msg!(
                            "Non-revocation proof is missing its registry id or timestamp"
                        ))
                    }
                };
                let rev_reg_def = rev_reg_defs
                    .and_then(|defs| defs.get(rev_reg_id))
                    .ok_or_else(|| {
                        err_msg!("Revocation registry definition {} was not provided", rev_reg_id)
                    })?;
                if rev_reg_def.cred_def_id != identifier.cred_def_id {
                    return Err(err_msg!(
                        "Revocation registry {} belongs to another credential definition",
                        rev_reg_id
                    ));
                }
                let registry = rev_regs
                    .and_then(|regs| regs.get(rev_reg_id))
                    .and_then(|by_ts| by_ts.get(&timestamp))
                    .ok_or_else(|| {
                        err_msg!(
                            "Revocation registry {} was not provided for timestamp {}",
                            rev_reg_id,
                            timestamp
                        )
                    })?;
                verifiers.push(
                    RevocationVerifier::new(
                        r_pk,
                        rev_reg_def.accum_key(),
                        &registry.accum,
                        non_revoc_proof,
                        eq_proof.m2_cap(),
                    )
                    .into(),
                );
            }
            verifiers.push(
                SignatureVerifier::new(cred_def.primary_key(), &sub_proof.primary_proof).into(),
            );
        }

        let c_list = proofs.iter().flat_map(SubProof::c_list).collect::<Vec<_>>();
        if c_list != self.proof.aggregated_proof.c_list {
            debug!("aggregated commitments do not match the sub-proofs");
            return Ok(false);
        }

        let c_hash = &self.proof.aggregated_proof.c_hash;
        let mut contribution = ChallengeContribution::default();
        for verifier in &verifiers {
            verifier.add_challenge_contribution(c_hash, &mut contribution)?;
        }
        contribution.add_commitments(c_list);
        if contribution.challenge(pres_req.nonce.as_native()) != *c_hash {
            debug!("challenge mismatch for presentation {}", pres_req.name);
            return Ok(false);
        }

        Ok(verifiers.iter().all(ProofVerifiers::verify))
    }

    fn sub_proof_index(&self, index: u32) -> CredxResult<usize> {
        let index = index as usize;
        if index >= self.proof.proofs.len() {
            return Err(err_msg!("Sub-proof index {} is out of range", index));
        }
        Ok(index)
    }

    fn predicate_index(&self, referent: &str) -> CredxResult<usize> {
        let referent = self
            .requested_proof
            .predicates
            .get(referent)
            .ok_or_else(|| err_msg!(ProofRejected, "Predicate {} is not answered", referent))?;
        self.sub_proof_index(referent.sub_proof_index)
    }

    fn collect_answers<'a>(&'a self, pres_req: &'a PresentationRequest) -> CredxResult<Vec<Answer<'a>>> {
        let rp = &self.requested_proof;
        let known = rp
            .revealed_attrs
            .keys()
            .chain(rp.revealed_attr_groups.keys())
            .chain(rp.unrevealed_attrs.keys())
            .chain(rp.self_attested_attrs.keys());
        let mut seen = BTreeSet::new();
        for referent in known {
            if !pres_req.requested_attributes.contains_key(referent) {
                return Err(err_msg!("Referent {} was not requested", referent));
            }
            if !seen.insert(referent) {
                return Err(err_msg!("Referent {} is answered more than once", referent));
            }
        }
        if let Some(referent) = rp
            .predicates
            .keys()
            .find(|r| !pres_req.requested_predicates.contains_key(*r))
        {
            return Err(err_msg!("Predicate {} was not requested", referent));
        }

        let mut answers = Vec::new();
        for (referent, info) in &pres_req.requested_attributes {
            let names = info.names_checked(referent)?;
            let interval = NonRevokedInterval::get_non_revoc_interval(
                pres_req.non_revoked.as_ref(),
                info.non_revoked.as_ref(),
            );
            let (index, revealed) = if let Some(attr) = rp.revealed_attrs.get(referent) {
                if info.name.is_none() {
                    return Err(err_msg!("Referent {} requests a group", referent));
                }
                let revealed = vec![(names[0].clone(), attr.raw.as_str(), attr.encoded.as_str())];
                (attr.sub_proof_index, revealed)
            } else if let Some(group) = rp.revealed_attr_groups.get(referent) {
                let mut revealed = Vec::with_capacity(names.len());
                for name in &names {
                    let value = group
                        .values
                        .iter()
                        .find(|(n, _)| attr_common_view(n) == *name)
                        .map(|(_, v)| v)
                        .ok_or_else(|| {
                            err_msg!(ProofRejected, "Group {} does not reveal {}", referent, name)
                        })?;
                    revealed.push((name.clone(), value.raw.as_str(), value.encoded.as_str()));
                }
                (group.sub_proof_index, revealed)
            } else if let Some(unrevealed) = rp.unrevealed_attrs.get(referent) {
                (unrevealed.sub_proof_index, Vec::new())
            } else if rp.self_attested_attrs.contains_key(referent) {
                if info.restrictions.is_some() {
                    return Err(err_msg!(
                        ProofRejected,
                        "Referent {} has restrictions and cannot be self attested",
                        referent
                    ));
                }
                continue;
            } else {
                return Err(err_msg!(ProofRejected, "Referent {} is not answered", referent));
            };
            answers.push(Answer {
                sub_proof_index: self.sub_proof_index(index)?,
                names,
                revealed,
                restrictions: info.restrictions.as_ref(),
                interval,
            });
        }
        for (referent, info) in &pres_req.requested_predicates {
            answers.push(Answer {
                sub_proof_index: self.predicate_index(referent)?,
                names: vec![attr_common_view(&info.name)],
                revealed: Vec::new(),
                restrictions: info.restrictions.as_ref(),
                interval: NonRevokedInterval::get_non_revoc_interval(
                    pres_req.non_revoked.as_ref(),
                    info.non_revoked.as_ref(),
                ),
            });
        }
        Ok(answers)
    }

    fn check_restrictions(
        &self,
        answers: &[Answer<'_>],
        schemas: &HashMap<SchemaId, &Schema>,
    ) -> CredxResult<()> {
        for (index, identifier) in self.identifiers.iter().enumerate() {
            let for_sub_proof = answers
                .iter()
                .filter(|a| a.sub_proof_index == index)
                .collect::<Vec<_>>();
            if for_sub_proof.iter().all(|a| a.restrictions.is_none()) {
                continue;
            }
            let schema = schemas
                .get(&identifier.schema_id)
                .ok_or_else(|| err_msg!("Schema {} was not provided", identifier.schema_id))?;

            let mut attrs = BTreeMap::<&str, Option<&str>>::new();
            for answer in &for_sub_proof {
                for name in &answer.names {
                    attrs.entry(name.as_str()).or_insert(None);
                }
                // a raw value only counts when it encodes to the proven value
                for (name, raw, encoded) in &answer.revealed {
                    if encode_credential_attribute(raw) == *encoded {
                        attrs.insert(name.as_str(), Some(*raw));
                    } else {
                        debug!("raw value of {} does not match its encoding", name);
                    }
                }
            }
            let tags = restriction_tags(
                schema,
                &identifier.cred_def_id,
                identifier.rev_reg_id.as_ref(),
                attrs,
            );
            for answer in &for_sub_proof {
                if let Some(query) = answer.restrictions {
                    if !query.matches(&tags)? {
                        return Err(err_msg!(
                            ProofRejected,
                            "Sub-proof {} does not satisfy the restrictions on {:?}",
                            index,
                            answer.names
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_non_revoked(
        &self,
        answers: &[Answer<'_>],
        cred_defs: &HashMap<CredentialDefinitionId, &CredentialDefinition>,
    ) -> CredxResult<()> {
        for answer in answers {
            let interval = match &answer.interval {
                Some(interval) => interval,
                None => continue,
            };
            let identifier = &self.identifiers[answer.sub_proof_index];
            let cred_def = cred_defs.get(&identifier.cred_def_id).ok_or_else(|| {
                err_msg!("Credential definition {} was not provided", identifier.cred_def_id)
            })?;
            if cred_def.revocation_key().is_none() {
                continue;
            }
            let proven = self.proof.proofs[answer.sub_proof_index]
                .non_revoc_proof
                .is_some();
            match identifier.timestamp {
                Some(ts) if proven => {
                    if !interval.contains(ts) {
                        return Err(err_msg!(
                            ProofRejected,
                            "Timestamp {} is outside of the requested interval",
                            ts
                        ));
                    }
                }
                _ => {
                    return Err(err_msg!(
                        ProofRejected,
                        "Sub-proof {} does not prove non-revocation",
                        answer.sub_proof_index
                    ))
                }
            }
        }
        Ok(())
    }
}
