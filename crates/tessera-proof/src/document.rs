//! Signing and verifying whole documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_identity::{resolve_verification_method, DidResolver};

use crate::error::ProofError;
use crate::key_doc::KeyDoc;
use crate::proof::{proofs_of, without_proof, Proof};
use crate::purpose::ProofPurpose;
use crate::registry::SuiteRegistry;

/// Result of checking one proof of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofResult {
    pub proof_type: String,
    pub verification_method: String,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of checking every proof of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVerification {
    pub verified: bool,
    pub results: Vec<ProofResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentVerification {
    fn failed(err: ProofError) -> Self {
        Self {
            verified: false,
            results: Vec::new(),
            error: Some(err.to_string()),
        }
    }
}

/// Return a signed copy of `document`.
///
/// The suite is chosen from the key type. Any previous proof is replaced;
/// the input is left untouched.
pub fn sign_document(
    document: &Value,
    key: &KeyDoc,
    purpose: &ProofPurpose,
    suites: &SuiteRegistry,
) -> Result<Value, ProofError> {
    if !document.is_object() {
        return Err(ProofError::NotAnObject);
    }
    let suite = suites.for_key_type(key.key_type())?;
    let mut signed = without_proof(document);
    let proof = suite.create_proof(&signed, key, purpose)?;
    tracing::debug!(
        suite = suite.proof_type(),
        verification_method = %key.id,
        purpose = purpose.term(),
        "document signed"
    );
    if let Value::Object(map) = &mut signed {
        map.insert("proof".to_string(), proof.to_json());
    }
    Ok(signed)
}

/// Verify every proof of `document` for `purpose`, resolving signer keys.
///
/// The document verifies when it has at least one proof and all proofs do.
pub async fn verify_document(
    document: &Value,
    purpose: &ProofPurpose,
    resolver: &dyn DidResolver,
    suites: &SuiteRegistry,
) -> DocumentVerification {
    let proofs = match proofs_of(document) {
        Ok(proofs) => proofs,
        Err(err) => return DocumentVerification::failed(err),
    };

    let mut results = Vec::with_capacity(proofs.len());
    for proof in &proofs {
        let outcome = check_proof(document, proof, purpose, resolver, suites).await;
        if let Err(err) = &outcome {
            tracing::debug!(
                verification_method = %proof.verification_method,
                error = %err,
                "proof rejected"
            );
        }
        results.push(ProofResult {
            proof_type: proof.proof_type.clone(),
            verification_method: proof.verification_method.clone(),
            verified: outcome.is_ok(),
            error: outcome.err().map(|e| e.to_string()),
        });
    }

    let verified = results.iter().all(|r| r.verified);
    let error = results.iter().find_map(|r| r.error.clone());
    DocumentVerification {
        verified,
        results,
        error,
    }
}

async fn check_proof(
    document: &Value,
    proof: &Proof,
    purpose: &ProofPurpose,
    resolver: &dyn DidResolver,
    suites: &SuiteRegistry,
) -> Result<(), ProofError> {
    let suite = suites.by_proof_type(&proof.proof_type)?;

    let (controller_doc, method) =
        resolve_verification_method(resolver, &proof.verification_method).await?;
    purpose.validate(proof, &method, &controller_doc)?;

    let public_key = method.public_key()?;
    let outcome = suite.verify_proof(document, proof, &public_key);
    if outcome.verified {
        Ok(())
    } else {
        Err(ProofError::InvalidProof(
            outcome.error.unwrap_or_else(|| "signature mismatch".into()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tessera_core::Did;
    use tessera_crypto::{AnyKeyPair, KeyType};
    use tessera_identity::{DidStore, IdentityError, MethodResolverRegistry};

    struct Fixture {
        store: Arc<DidStore>,
        registry: MethodResolverRegistry,
        suites: SuiteRegistry,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(DidStore::new());
        let registry = MethodResolverRegistry::new().with_resolver("example", store.clone());
        Fixture {
            store,
            registry,
            suites: SuiteRegistry::with_defaults(),
        }
    }

    fn key(fx: &Fixture, name: &str, key_type: KeyType) -> KeyDoc {
        let did = Did::from_parts("example", name).unwrap();
        let keypair = AnyKeyPair::generate(key_type);
        fx.store.create(&did, &keypair.public_key()).unwrap();
        KeyDoc::for_did(&did, keypair)
    }

    fn credential() -> Value {
        json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "id": "urn:uuid:42",
            "type": ["VerifiableCredential"],
            "issuer": "did:example:issuer",
            "credentialSubject": {"id": "did:example:subject"},
        })
    }

    #[tokio::test]
    async fn test_sign_and_verify() {
        let fx = fixture();
        for key_type in [KeyType::Ed25519, KeyType::Secp256k1] {
            let key = key(&fx, &format!("issuer-{}", key_type).to_lowercase(), key_type);
            let doc = sign_document(&credential(), &key, &ProofPurpose::assertion(), &fx.suites)
                .unwrap();

            let purpose = ProofPurpose::AssertionMethod {
                controller: Some(key.controller.clone()),
            };
            let result = verify_document(&doc, &purpose, &fx.registry, &fx.suites).await;
            assert!(result.verified, "{:?}", result);
            assert_eq!(result.results.len(), 1);
            assert!(result.error.is_none());
        }
    }

    #[tokio::test]
    async fn test_resign_replaces_proof() {
        let fx = fixture();
        let key = key(&fx, "issuer", KeyType::Ed25519);
        let once = sign_document(&credential(), &key, &ProofPurpose::assertion(), &fx.suites).unwrap();
        let twice = sign_document(&once, &key, &ProofPurpose::assertion(), &fx.suites).unwrap();

        assert!(twice["proof"].is_object());
        assert!(credential().get("proof").is_none());
        let result =
            verify_document(&twice, &ProofPurpose::assertion(), &fx.registry, &fx.suites).await;
        assert!(result.verified);
    }

    #[tokio::test]
    async fn test_tampered_document() {
        let fx = fixture();
        let key = key(&fx, "issuer", KeyType::Ed25519);
        let mut doc =
            sign_document(&credential(), &key, &ProofPurpose::assertion(), &fx.suites).unwrap();
        doc["credentialSubject"]["id"] = json!("did:example:mallory");

        let result = verify_document(&doc, &ProofPurpose::assertion(), &fx.registry, &fx.suites).await;
        assert!(!result.verified);
        assert!(result.error.unwrap().contains("invalid proof"));
    }

    #[tokio::test]
    async fn test_wrong_purpose() {
        let fx = fixture();
        let key = key(&fx, "holder", KeyType::Ed25519);
        let doc = sign_document(&credential(), &key, &ProofPurpose::assertion(), &fx.suites).unwrap();

        let purpose = ProofPurpose::authentication(Some("nonce".into()), None);
        let result = verify_document(&doc, &purpose, &fx.registry, &fx.suites).await;
        assert!(!result.verified);
    }

    #[tokio::test]
    async fn test_deactivated_signer() {
        let fx = fixture();
        let key = key(&fx, "issuer", KeyType::Ed25519);
        let doc = sign_document(&credential(), &key, &ProofPurpose::assertion(), &fx.suites).unwrap();
        fx.store.deactivate(&key.controller).unwrap();

        let result = verify_document(&doc, &ProofPurpose::assertion(), &fx.registry, &fx.suites).await;
        assert!(!result.verified);
        assert!(result.error.unwrap().contains("no DID document"));
    }

    #[tokio::test]
    async fn test_unknown_verification_method() {
        let fx = fixture();
        let key = key(&fx, "issuer", KeyType::Ed25519);
        let mut doc =
            sign_document(&credential(), &key, &ProofPurpose::assertion(), &fx.suites).unwrap();
        let missing = format!("{}#keys-9", key.controller);
        doc["proof"]["verificationMethod"] = json!(missing);

        let result = verify_document(&doc, &ProofPurpose::assertion(), &fx.registry, &fx.suites).await;
        assert!(!result.verified);
        assert_eq!(
            result.error,
            Some(ProofError::from(IdentityError::VerificationMethodNotFound(missing)).to_string())
        );
    }

    #[tokio::test]
    async fn test_unsigned_and_unknown_suite() {
        let fx = fixture();
        let unsigned =
            verify_document(&credential(), &ProofPurpose::assertion(), &fx.registry, &fx.suites)
                .await;
        assert!(!unsigned.verified);
        assert_eq!(unsigned.error.as_deref(), Some("document has no proof"));

        let key = key(&fx, "issuer", KeyType::Ed25519);
        let mut doc =
            sign_document(&credential(), &key, &ProofPurpose::assertion(), &fx.suites).unwrap();
        doc["proof"]["type"] = json!("BbsBlsSignature2020");
        let result = verify_document(&doc, &ProofPurpose::assertion(), &fx.registry, &fx.suites).await;
        assert!(!result.verified);
        assert!(result.error.unwrap().contains("unsupported proof suite"));
    }

    #[test]
    fn test_sign_rejects_non_object() {
        let fx = fixture();
        let key = key(&fx, "issuer", KeyType::Ed25519);
        assert_eq!(
            sign_document(&json!([1, 2]), &key, &ProofPurpose::assertion(), &fx.suites),
            Err(ProofError::NotAnObject)
        );
    }
}
