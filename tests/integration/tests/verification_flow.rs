//! Integration test: issuer → holder → verifier across crates.
//!
//! Credentials are issued by `did:example` issuers, presented by `did:key`
//! holders and verified against status lists and schemas.

use serde_json::json;
use std::sync::Arc;
use tessera_credentials::{
    InMemorySchemaLoader, PresentationOptions, VerifiableCredential,
    VerifiablePresentation,
};
use tessera_crypto::KeyType;
use tessera_integration_tests::Network;
use tessera_proof::ProofError;
use tessera_status::{StatusList2021Entry, StatusListOptions, StatusPurpose};

const LIST_ID: &str = "https://university.example/status/1";

fn degree(id: &str, holder: &str) -> VerifiableCredential {
    VerifiableCredential::new(id)
        .add_type("UniversityDegreeCredential")
        .set_subject(json!({
            "id": holder,
            "degree": {"type": "BachelorDegree", "name": "Bachelor of Science"},
        }))
}

// =========================================================================
// Presentations
// =========================================================================

#[tokio::test]
async fn test_presentation_with_one_tampered_credential() {
    let network = Network::new();
    let university = network.register("university", KeyType::Ed25519).unwrap();
    let holder = network.key_holder(KeyType::Ed25519).unwrap();

    let valid = university.issue(&degree("urn:vc:1", holder.did())).unwrap();
    let mut tampered = university.issue(&degree("urn:vc:2", holder.did())).unwrap();
    tampered["credentialSubject"]["degree"]["name"] = json!("Doctor of Medicine");

    let presentation = holder
        .sign_presentation(
            &VerifiablePresentation::new("urn:vp:1")
                .add_credential(valid)
                .add_credential(tampered),
            Some("nonce-1"),
            Some("verifier.example"),
        )
        .unwrap();

    let options = PresentationOptions::with_challenge("nonce-1").domain("verifier.example");
    let report = network
        .verifier()
        .verify_presentation(&presentation, &options)
        .await
        .unwrap();

    assert!(!report.verified);
    assert_eq!(report.credential_results.len(), 2);
    assert!(report.credential_results[0].verified);
    assert!(!report.credential_results[1].verified);
    assert_eq!(
        report.credential_results[1].credential_id.as_deref(),
        Some("urn:vc:2")
    );
    assert!(report.presentation_result.is_none());
}

#[tokio::test]
async fn test_presentation_from_several_issuers() {
    let network = Network::new();
    let university = network.register("university", KeyType::Ed25519).unwrap();
    let employer = network.register("employer", KeyType::Secp256k1).unwrap();
    let holder = network.key_holder(KeyType::Secp256k1).unwrap();

    let employment = VerifiableCredential::with_random_id()
        .add_type("EmploymentCredential")
        .set_subject(json!({"id": holder.did(), "role": "Engineer"}));
    let presentation = holder
        .sign_presentation(
            &VerifiablePresentation::with_random_id()
                .add_credential(university.issue(&degree("urn:vc:1", holder.did())).unwrap())
                .add_credential(employer.issue(&employment).unwrap()),
            Some("nonce-2"),
            None,
        )
        .unwrap();

    let verifier = network.verifier();
    let report = verifier
        .verify_presentation(&presentation, &PresentationOptions::with_challenge("nonce-2"))
        .await
        .unwrap();
    assert!(report.verified, "{:?}", report.error);
    assert!(report.presentation_result.unwrap().verified);

    let replayed = verifier
        .verify_presentation(&presentation, &PresentationOptions::with_challenge("nonce-3"))
        .await
        .unwrap();
    assert!(!replayed.verified);

    let unchallenged = verifier
        .verify_presentation(&presentation, &PresentationOptions::default())
        .await
        .unwrap();
    assert!(!unchallenged.verified);
    assert_eq!(unchallenged.error, Some(ProofError::MissingChallenge.to_string()));
    assert_eq!(unchallenged.credential_results.len(), 2);
    assert!(unchallenged.credential_results.iter().all(|r| r.verified));
}

// =========================================================================
// Revocation
// =========================================================================

#[tokio::test]
async fn test_revocation_takes_effect_on_next_verification() {
    let network = Network::new();
    let university = network.register("university", KeyType::Ed25519).unwrap();
    let holder = network.key_holder(KeyType::Ed25519).unwrap();

    let mut list = network
        .registry
        .create(university.key(), LIST_ID, StatusListOptions::default())
        .unwrap();
    network.lists.put(list.clone());

    let entry = StatusList2021Entry::new(LIST_ID, 42, StatusPurpose::Revocation);
    let credential = university
        .issue(&degree("urn:vc:42", holder.did()).set_status(&entry))
        .unwrap();

    let verifier = network.verifier();
    assert!(verifier.verify_credential(&credential).await.verified);

    network
        .registry
        .batch_update(university.key(), &mut list, &[42], &[])
        .unwrap();
    network.lists.put(list);

    let report = verifier.verify_credential(&credential).await;
    assert!(!report.verified);
    let status = report.check("status_valid").unwrap();
    assert!(!status.passed);
    assert_eq!(status.detail.as_deref(), Some("credential is revoked"));
    assert!(report.check("proof_valid").unwrap().passed);
}

#[tokio::test]
async fn test_status_list_signed_by_another_issuer_is_rejected() {
    let network = Network::new();
    let university = network.register("university", KeyType::Ed25519).unwrap();
    let impostor = network.register("impostor", KeyType::Ed25519).unwrap();

    let list = network
        .registry
        .create(impostor.key(), LIST_ID, StatusListOptions::default())
        .unwrap();
    network.lists.put(list);

    let entry = StatusList2021Entry::new(LIST_ID, 1, StatusPurpose::Revocation);
    let credential = university
        .issue(&degree("urn:vc:1", "did:example:holder").set_status(&entry))
        .unwrap();

    let report = network.verifier().verify_credential(&credential).await;
    assert!(!report.verified);
    assert!(!report.check("status_valid").unwrap().passed);
}

// =========================================================================
// Schemas
// =========================================================================

#[tokio::test]
async fn test_subject_checked_against_schema() {
    let network = Network::new();
    let university = network.register("university", KeyType::Ed25519).unwrap();

    let schemas = InMemorySchemaLoader::new();
    schemas
        .insert(
            "https://university.example/schemas/degree.json",
            json!({
                "type": "object",
                "required": ["degree"],
                "properties": {"degree": {"type": "object", "required": ["name"]}},
            }),
        )
        .unwrap();
    let verifier = network.verifier().with_schema_loader(Arc::new(schemas));

    let good = university
        .issue(
            &degree("urn:vc:1", "did:example:holder")
                .set_schema("https://university.example/schemas/degree.json"),
        )
        .unwrap();
    assert!(verifier.verify_credential(&good).await.verified);

    let bad = university
        .issue(
            &VerifiableCredential::new("urn:vc:2")
                .set_subject(json!({"id": "did:example:holder"}))
                .set_schema("https://university.example/schemas/degree.json"),
        )
        .unwrap();
    let report = verifier.verify_credential(&bad).await;
    assert!(!report.verified);
    assert!(report.check("proof_valid").unwrap().passed);
    assert!(!report.check("schema_valid").unwrap().passed);
}
