//! Integration test: a status list through its lifecycle.
//!
//! Creation, publication, suspension, reinstatement and serialization of a
//! StatusList2021 credential, checked the way a verifier would see it.

use serde_json::json;
use tessera_credentials::VerifiableCredential;
use tessera_crypto::KeyType;
use tessera_integration_tests::Network;
use tessera_status::{
    StatusError, StatusList2021Credential, StatusList2021Entry, StatusListOptions,
    StatusListSource, StatusPurpose,
};

const LIST_ID: &str = "https://issuer.example/status/suspension";

#[tokio::test]
async fn test_suspend_and_reinstate() {
    let network = Network::new();
    let issuer = network.register("issuer", KeyType::Secp256k1).unwrap();

    let mut list = network
        .registry
        .create(
            issuer.key(),
            LIST_ID,
            StatusListOptions::new(StatusPurpose::Suspension).with_length(1024),
        )
        .unwrap();
    network.lists.put(list.clone());

    let entry = StatusList2021Entry::new(LIST_ID, 7, StatusPurpose::Suspension);
    let credential = issuer
        .issue(
            &VerifiableCredential::new("urn:vc:membership")
                .set_subject(json!({"id": "did:example:member", "level": "gold"}))
                .set_status(&entry),
        )
        .unwrap();
    let verifier = network.verifier();

    network.registry.batch_update(issuer.key(), &mut list, &[7], &[]).unwrap();
    network.lists.put(list.clone());
    let report = verifier.verify_credential(&credential).await;
    assert_eq!(
        report.check("status_valid").unwrap().detail.as_deref(),
        Some("credential is suspended")
    );

    network.registry.batch_update(issuer.key(), &mut list, &[], &[7]).unwrap();
    network.lists.put(list);
    assert!(verifier.verify_credential(&credential).await.verified);
}

#[tokio::test]
async fn test_failed_update_leaves_published_list_intact() {
    let network = Network::new();
    let issuer = network.register("issuer", KeyType::Ed25519).unwrap();

    let mut list = network
        .registry
        .create(
            issuer.key(),
            LIST_ID,
            StatusListOptions::new(StatusPurpose::Revocation)
                .with_length(16)
                .with_revoked(vec![1]),
        )
        .unwrap();
    let published = list.clone();

    let err = network
        .registry
        .batch_update(issuer.key(), &mut list, &[2, 3], &[3])
        .unwrap_err();
    assert!(matches!(err, StatusError::UnsuspendNotAllowed(_)));

    let err = network
        .registry
        .batch_update(issuer.key(), &mut list, &[2, 16], &[])
        .unwrap_err();
    assert!(matches!(err, StatusError::IndexOutOfRange { .. }));

    assert_eq!(list, published);
    assert_eq!(
        network.registry.is_revoked_batch(&list, &[1, 2, 3]).unwrap(),
        vec![true, false, false]
    );
}

#[tokio::test]
async fn test_published_list_survives_serialization() {
    let network = Network::new();
    let issuer = network.register("issuer", KeyType::Ed25519).unwrap();

    let list = network
        .registry
        .create(
            issuer.key(),
            LIST_ID,
            StatusListOptions::default().with_revoked(vec![0, 9_999]),
        )
        .unwrap();

    let bytes = list.to_bytes().unwrap();
    let parsed = StatusList2021Credential::from_bytes(&bytes).unwrap();
    network.lists.put(parsed);

    let fetched = network.lists.fetch(LIST_ID).await.unwrap();
    assert_eq!(fetched.purpose(), StatusPurpose::Revocation);
    assert_eq!(fetched.status_list().unwrap().len(), 10_000);
    assert_eq!(
        network.registry.is_revoked_batch(&fetched, &[0, 1, 9_999]).unwrap(),
        vec![true, false, true]
    );

    let entry = StatusList2021Entry::new(LIST_ID, 9_999, StatusPurpose::Revocation);
    let credential = issuer
        .issue(
            &VerifiableCredential::new("urn:vc:gone")
                .set_subject(json!({"id": "did:example:someone"}))
                .set_status(&entry),
        )
        .unwrap();
    assert!(!network.verifier().verify_credential(&credential).await.verified);

    assert!(matches!(
        network.lists.fetch("https://issuer.example/status/missing").await,
        Err(StatusError::NotFound(_))
    ));
}
