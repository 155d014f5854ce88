mod util;

use credx_cl::prelude::*;
use maplit::{btreemap, btreeset, hashmap};
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;
use util::*;

fn revocable_request(interval: Option<NonRevokedInterval>) -> PresentationRequest {
    PresentationRequest {
        name: "revocable gvt".to_string(),
        version: "0.1".to_string(),
        nonce: generate_nonce(),
        requested_attributes: btreemap! {
            "attr1_referent".to_string() => AttributeInfo::single("name"),
        },
        requested_predicates: btreemap! {
            "predicate1_referent".to_string() => PredicateInfo::new("age", PredicateType::GE, 18),
        },
        non_revoked: interval,
        ver: Some(PresentationRequestVersion::V1),
    }
}

fn present<'p>(
    credential: &'p Credential,
    rev_state: Option<&'p CredentialRevocationState>,
) -> PresentCredentials<'p> {
    let mut present = PresentCredentials::new();
    let mut entry = present.add_credential(credential, rev_state.map(|s| s.timestamp), rev_state);
    entry.add_requested_attribute("attr1_referent", true);
    entry.add_requested_predicate("predicate1_referent");
    present
}

fn create(
    pres_req: &PresentationRequest,
    credential: &Credential,
    rev_state: Option<&CredentialRevocationState>,
    master_secret: &MasterSecret,
) -> CredxResult<Presentation> {
    let keys = &*GVT_REVOCABLE;
    prover::create_presentation(
        pres_req,
        &present(credential, rev_state),
        None,
        master_secret,
        &hashmap! { keys.schema.id.clone() => &keys.schema },
        &hashmap! { keys.cred_def.id.clone() => &keys.cred_def },
    )
}

fn verify(
    presentation: &Presentation,
    pres_req: &PresentationRequest,
    reg: &Registry,
    registries: HashMap<u64, &RevocationRegistry>,
) -> CredxResult<bool> {
    let keys = &*GVT_REVOCABLE;
    verifier::verify_presentation(
        presentation,
        pres_req,
        &hashmap! { keys.schema.id.clone() => &keys.schema },
        &hashmap! { keys.cred_def.id.clone() => &keys.cred_def },
        Some(&hashmap! { reg.def.id.clone() => &reg.def }),
        Some(&hashmap! { reg.def.id.clone() => registries }),
    )
}

#[test]
fn issuance_by_default_flow() {
    init_logger();
    let mut reg = create_registry(&GVT_REVOCABLE, IssuanceType::ISSUANCE_BY_DEFAULT, 5);
    assert_eq!(reg.delta.issued, (1..=5).collect::<BTreeSet<_>>());
    assert!(reg.delta.prev_accum.is_none());

    let master_secret = prover::create_master_secret();
    let credential = issue(&GVT_REVOCABLE, &master_secret, gvt_values(), Some((&mut reg, 1))).unwrap();
    assert_eq!(credential.rev_reg_index(), Some(1));
    assert_eq!(
        credential.get_attribute(CredentialAttribute::RevRegIndex),
        Some("1".to_string())
    );
    assert_eq!(credential.rev_reg_id.as_ref(), Some(&reg.def.id));

    let before = Instant::now();
    let rev_state =
        prover::create_or_update_revocation_state(&reg.tails, &reg.def, &reg.delta, 1, 100, None)
            .unwrap();
    println!("revocation state: {:?}", before.elapsed());
    assert_eq!(rev_state.rev_reg, reg.registry);

    let pres_req = revocable_request(Some(NonRevokedInterval::new(None, Some(150))));
    let presentation = create(&pres_req, &credential, Some(&rev_state), &master_secret).unwrap();
    assert_eq!(presentation.identifiers[0].timestamp, Some(100));
    assert_eq!(presentation.identifiers[0].rev_reg_id.as_ref(), Some(&reg.def.id));
    assert!(presentation.proof.proofs[0].non_revoc_proof.is_some());
    // the context response is blinded like the other hidden attributes
    assert!(presentation.proof.proofs[0].primary_proof.eq_proof.m2_cap().bits() > 520);

    let registry = reg.registry;
    assert!(verify(&presentation, &pres_req, &reg, hashmap! { 100 => &registry }).unwrap());

    let json = serde_json::to_string(&presentation).unwrap();
    let parsed: Presentation = serde_json::from_str(&json).unwrap();
    assert!(verify(&parsed, &pres_req, &reg, hashmap! { 100 => &registry }).unwrap());

    // the registry entry must exist for the claimed timestamp
    let err = verify(&presentation, &pres_req, &reg, hashmap! { 99 => &registry }).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn revoked_credential_cannot_prove_membership() {
    init_logger();
    let mut reg = create_registry(&GVT_REVOCABLE, IssuanceType::ISSUANCE_BY_DEFAULT, 5);
    let master_secret = prover::create_master_secret();
    let credential = issue(&GVT_REVOCABLE, &master_secret, gvt_values(), Some((&mut reg, 2))).unwrap();
    let rev_state =
        prover::create_or_update_revocation_state(&reg.tails, &reg.def, &reg.delta, 2, 100, None)
            .unwrap();

    let pres_req = revocable_request(Some(NonRevokedInterval::new(None, None)));
    let presentation = create(&pres_req, &credential, Some(&rev_state), &master_secret).unwrap();

    let (revoked, delta) =
        issuer::revoke_credential(&reg.def, &reg.registry, 2, &reg.tails).unwrap();
    assert_eq!(delta.revoked, btreeset! {2});
    assert_ne!(revoked, reg.registry);

    // the old witness does not open against the new accumulator
    assert!(!verify(&presentation, &pres_req, &reg, hashmap! { 100 => &revoked }).unwrap());

    let err = prover::create_or_update_revocation_state(
        &reg.tails,
        &reg.def,
        &delta,
        2,
        200,
        Some(&rev_state),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialRevoked);

    // a fresh state from the full history agrees
    let mut history = reg.delta.clone();
    history.merge(&delta).unwrap();
    let err =
        prover::create_or_update_revocation_state(&reg.tails, &reg.def, &history, 2, 200, None)
            .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialRevoked);
}

#[test]
fn witness_follows_other_revocations() {
    init_logger();
    let mut reg = create_registry(&GVT_REVOCABLE, IssuanceType::ISSUANCE_BY_DEFAULT, 5);
    let master_secret = prover::create_master_secret();
    let credential = issue(&GVT_REVOCABLE, &master_secret, gvt_values(), Some((&mut reg, 1))).unwrap();
    issue(&GVT_REVOCABLE, &prover::create_master_secret(), gvt_values(), Some((&mut reg, 3))).unwrap();

    let rev_state =
        prover::create_or_update_revocation_state(&reg.tails, &reg.def, &reg.delta, 1, 100, None)
            .unwrap();
    let (registry, delta) =
        issuer::revoke_credential(&reg.def, &reg.registry, 3, &reg.tails).unwrap();

    let updated = prover::create_or_update_revocation_state(
        &reg.tails,
        &reg.def,
        &delta,
        1,
        200,
        Some(&rev_state),
    )
    .unwrap();
    assert_eq!(updated.rev_reg, registry);
    assert_ne!(updated.witness, rev_state.witness);

    // an update with no changes only moves the timestamp
    let unchanged = prover::create_or_update_revocation_state(
        &reg.tails,
        &reg.def,
        &delta,
        1,
        300,
        Some(&updated),
    )
    .unwrap();
    assert_eq!(unchanged.witness, updated.witness);
    assert_eq!(unchanged.timestamp, 300);

    let pres_req = revocable_request(Some(NonRevokedInterval::new(Some(150), Some(250))));
    let presentation = create(&pres_req, &credential, Some(&updated), &master_secret).unwrap();
    assert!(verify(&presentation, &pres_req, &reg, hashmap! { 200 => &registry }).unwrap());

    // a state outside of the requested interval is rejected
    let late = create(&pres_req, &credential, Some(&unchanged), &master_secret).unwrap();
    let err = verify(&late, &pres_req, &reg, hashmap! { 300 => &registry }).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProofRejected);

    // a delta that does not start at the prior state is refused
    let (_, unrelated) =
        issuer::revoke_credential(&reg.def, &reg.registry, 4, &reg.tails).unwrap();
    let err = prover::create_or_update_revocation_state(
        &reg.tails,
        &reg.def,
        &unrelated,
        1,
        400,
        Some(&updated),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn issuance_on_demand_flow() {
    init_logger();
    let mut reg = create_registry(&GVT_REVOCABLE, IssuanceType::ISSUANCE_ON_DEMAND, 3);
    assert!(reg.delta.is_empty());
    let empty = reg.registry;

    let master_secret = prover::create_master_secret();
    let credential = issue(&GVT_REVOCABLE, &master_secret, gvt_values(), Some((&mut reg, 2))).unwrap();
    assert_ne!(reg.registry, empty);
    assert_eq!(reg.delta.issued, btreeset! {2});

    // index 1 was never issued
    let err =
        prover::create_or_update_revocation_state(&reg.tails, &reg.def, &reg.delta, 1, 10, None)
            .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialRevoked);

    let rev_state =
        prover::create_or_update_revocation_state(&reg.tails, &reg.def, &reg.delta, 2, 10, None)
            .unwrap();
    let pres_req = revocable_request(Some(NonRevokedInterval::new(Some(5), Some(20))));
    let presentation = create(&pres_req, &credential, Some(&rev_state), &master_secret).unwrap();
    let registry = reg.registry;
    assert!(verify(&presentation, &pres_req, &reg, hashmap! { 10 => &registry }).unwrap());

    // a registry that never contained the credential
    assert!(!verify(&presentation, &pres_req, &reg, hashmap! { 10 => &empty })
        .unwrap_or(false));
}

#[test]
fn registry_capacity_is_enforced() {
    init_logger();
    let mut reg = create_registry(&GVT_REVOCABLE, IssuanceType::ISSUANCE_ON_DEMAND, 1);
    let master_secret = prover::create_master_secret();
    issue(&GVT_REVOCABLE, &master_secret, gvt_values(), Some((&mut reg, 1))).unwrap();

    let err = issue(&GVT_REVOCABLE, &master_secret, gvt_values(), Some((&mut reg, 1))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RevocationRegistryFull);
    let err = issue(&GVT_REVOCABLE, &master_secret, gvt_values(), Some((&mut reg, 2))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUserRevocId);

    let err = issuer::update_revocation_registry(
        &reg.def,
        &reg.registry,
        btreeset! {},
        btreeset! {7},
        &reg.tails,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUserRevocId);
}

#[test]
fn non_revocation_is_required_by_the_interval() {
    init_logger();
    let mut reg = create_registry(&GVT_REVOCABLE, IssuanceType::ISSUANCE_BY_DEFAULT, 2);
    let master_secret = prover::create_master_secret();
    let credential = issue(&GVT_REVOCABLE, &master_secret, gvt_values(), Some((&mut reg, 1))).unwrap();

    let open = revocable_request(None);
    let presentation = create(&open, &credential, None, &master_secret).unwrap();
    assert!(presentation.proof.proofs[0].non_revoc_proof.is_none());
    assert!(verify(&presentation, &open, &reg, HashMap::new()).unwrap());

    let mut strict = open.clone();
    strict.non_revoked = Some(NonRevokedInterval::new(None, Some(100)));
    let err = verify(&presentation, &strict, &reg, HashMap::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProofRejected);

    let err = create(&strict, &credential, None, &master_secret).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn merged_deltas_follow_the_registry() {
    init_logger();
    let reg = create_registry(&GVT_REVOCABLE, IssuanceType::ISSUANCE_BY_DEFAULT, 4);
    let (r1, revoke) = issuer::revoke_credential(&reg.def, &reg.registry, 1, &reg.tails).unwrap();
    let (r2, reissue) = issuer::update_revocation_registry(
        &reg.def,
        &r1,
        btreeset! {1},
        btreeset! {},
        &reg.tails,
    )
    .unwrap();
    assert_eq!(r2, reg.registry);

    let merged = issuer::merge_revocation_registry_deltas(&revoke, &reissue).unwrap();
    assert!(merged.is_empty());
    assert_eq!(merged.prev_accum, Some(reg.registry.accum));
    assert_eq!(merged.accum, r2.accum);

    let err = issuer::merge_revocation_registry_deltas(&reissue, &reissue).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let (_, revoke_two) = issuer::revoke_credential(&reg.def, &r1, 2, &reg.tails).unwrap();
    let merged = issuer::merge_revocation_registry_deltas(&revoke, &revoke_two).unwrap();
    assert_eq!(merged.revoked, btreeset! {1, 2});
    assert!(merged.issued.is_empty());

    let json = serde_json::to_value(&merged).unwrap();
    let parsed: RevocationRegistryDelta = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, merged);
}

#[test]
fn tails_file_round_trip() {
    init_logger();
    let mut writer = TailsFileWriter::new(None);
    let (def, _, registry, delta) = issuer::create_revocation_registry(
        &issuer_did(),
        &GVT_REVOCABLE.cred_def,
        "file",
        RegistryType::CL_ACCUM,
        IssuanceType::ISSUANCE_BY_DEFAULT,
        3,
        &mut writer,
    )
    .unwrap();
    assert_eq!(
        def.get_attribute(RevocationRegistryDefinitionAttribute::TailsLocation),
        Some(def.value.tails_location.clone())
    );
    assert_eq!(
        def.get_attribute(RevocationRegistryDefinitionAttribute::MaxCredNum),
        Some("3".to_string())
    );

    let tails = TailsReader::for_definition(&def).unwrap();
    let state = prover::create_or_update_revocation_state(&tails, &def, &delta, 3, 1, None).unwrap();
    assert_eq!(state.rev_reg, registry);

    let mut wrong_hash = def.clone();
    wrong_hash.value.tails_hash = "11111111111111111111111111111111".to_string();
    let err = TailsReader::for_definition(&wrong_hash).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let _ = std::fs::remove_file(&def.value.tails_location);
}

#[test]
fn revocation_state_serializes() {
    let mut reg = create_registry(&GVT_REVOCABLE, IssuanceType::ISSUANCE_BY_DEFAULT, 2);
    let master_secret = prover::create_master_secret();
    issue(&GVT_REVOCABLE, &master_secret, gvt_values(), Some((&mut reg, 1))).unwrap();
    let state =
        prover::create_or_update_revocation_state(&reg.tails, &reg.def, &reg.delta, 1, 5, None)
            .unwrap();
    let json = serde_json::to_string(&state).unwrap();
    let parsed: CredentialRevocationState = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, state);

    assert_eq!(round_trip(&reg.def), reg.def);
    round_trip(&reg.private);
    assert_eq!(round_trip(&reg.registry), reg.registry);
    assert_eq!(round_trip(&reg.delta), reg.delta);

    let (registry, delta) =
        issuer::revoke_credential(&reg.def, &reg.registry, 1, &reg.tails).unwrap();
    assert_eq!(round_trip(&registry), registry);
    assert_eq!(round_trip(&delta), delta);
}
