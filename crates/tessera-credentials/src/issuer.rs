use serde_json::Value;
use tessera_proof::{sign_document, KeyDoc, ProofPurpose, SuiteRegistry};

use crate::credential::{check_credential, VerifiableCredential};
use crate::error::CredentialError;
use crate::presentation::{check_presentation, VerifiablePresentation};

/// Signs credentials and presentations with one key document.
pub struct CredentialIssuer {
    key: KeyDoc,
    suites: SuiteRegistry,
}

impl CredentialIssuer {
    pub fn new(key: KeyDoc, suites: SuiteRegistry) -> Self {
        Self { key, suites }
    }

    /// The DID that controls the signing key.
    pub fn did(&self) -> &str {
        &self.key.controller
    }

    pub fn key(&self) -> &KeyDoc {
        &self.key
    }

    /// Sign a credential with an `assertionMethod` proof.
    ///
    /// A missing `issuer` is filled in with this issuer's DID; a different
    /// one is rejected.
    pub fn issue(&self, credential: &VerifiableCredential) -> Result<Value, CredentialError> {
        let mut credential = credential.clone();
        match &credential.issuer {
            None => credential.issuer = Some(self.did().to_string()),
            Some(issuer) if issuer != self.did() => {
                return Err(CredentialError::IssuanceFailed(format!(
                    "credential issuer {} does not control key {}",
                    issuer, self.key.id
                )));
            }
            Some(_) => {}
        }
        self.issue_json(&credential.to_json()?)
    }

    /// Sign an already serialized credential as is.
    pub fn issue_json(&self, credential: &Value) -> Result<Value, CredentialError> {
        check_credential(credential)?;
        let signed = sign_document(credential, &self.key, &ProofPurpose::assertion(), &self.suites)?;

        let credential_id = credential.get("id").and_then(Value::as_str).unwrap_or_default();
        tracing::info!(issuer = %self.did(), credential_id, "credential issued");
        Ok(signed)
    }

    /// Sign a presentation with an `authentication` proof bound to the
    /// verifier's `challenge` and `domain`.
    pub fn sign_presentation(
        &self,
        presentation: &VerifiablePresentation,
        challenge: Option<&str>,
        domain: Option<&str>,
    ) -> Result<Value, CredentialError> {
        let mut presentation = presentation.clone();
        if presentation.holder.is_none() {
            presentation.holder = Some(self.did().to_string());
        }
        let presentation = presentation.to_json()?;
        check_presentation(&presentation)?;

        let purpose = ProofPurpose::authentication(
            challenge.map(str::to_string),
            domain.map(str::to_string),
        );
        let signed = sign_document(&presentation, &self.key, &purpose, &self.suites)?;
        tracing::debug!(holder = %self.did(), "presentation signed");
        Ok(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_core::Did;
    use tessera_crypto::KeyPair;

    fn issuer() -> CredentialIssuer {
        let did = Did::parse("did:example:issuer").unwrap();
        CredentialIssuer::new(
            KeyDoc::for_did(&did, KeyPair::from_seed(&[4u8; 32])),
            SuiteRegistry::with_defaults(),
        )
    }

    #[test]
    fn test_issue_fills_issuer() {
        let credential = VerifiableCredential::new("urn:vc:1")
            .set_subject(json!({"id": "did:example:alice"}));
        let signed = issuer().issue(&credential).unwrap();

        assert_eq!(signed["issuer"], "did:example:issuer");
        assert_eq!(signed["proof"]["proofPurpose"], "assertionMethod");
        assert_eq!(signed["proof"]["verificationMethod"], "did:example:issuer#keys-1");
        assert!(credential.issuer.is_none());
    }

    #[test]
    fn test_issue_rejects_foreign_issuer() {
        let credential = VerifiableCredential::new("urn:vc:1").set_issuer("did:example:other");
        assert!(matches!(
            issuer().issue(&credential),
            Err(CredentialError::IssuanceFailed(_))
        ));
    }

    #[test]
    fn test_issue_json_checks_structure() {
        let not_a_credential = json!({"@context": ["https://example.com"], "type": "VerifiableCredential"});
        assert!(matches!(
            issuer().issue_json(&not_a_credential),
            Err(CredentialError::InvalidContext(_))
        ));
    }

    #[test]
    fn test_issue_json_signs_as_given() {
        let credential = VerifiableCredential::new("urn:vc:7")
            .set_issuer("did:example:issuer")
            .set_subject(json!({"id": "did:example:alice"}))
            .to_json()
            .unwrap();
        let signed = issuer().issue_json(&credential).unwrap();

        assert_eq!(signed["id"], "urn:vc:7");
        assert_eq!(signed["credentialSubject"], credential["credentialSubject"]);
        assert_eq!(signed["proof"]["proofPurpose"], "assertionMethod");

        let mut anonymous = credential.clone();
        anonymous.as_object_mut().unwrap().remove("id");
        assert!(issuer().issue_json(&anonymous).unwrap().get("proof").is_some());
    }

    #[test]
    fn test_sign_presentation() {
        let presentation = VerifiablePresentation::new("urn:vp:1");
        let signed = issuer()
            .sign_presentation(&presentation, Some("nonce-1"), Some("verifier.example"))
            .unwrap();

        assert_eq!(signed["holder"], "did:example:issuer");
        assert_eq!(signed["proof"]["proofPurpose"], "authentication");
        assert_eq!(signed["proof"]["challenge"], "nonce-1");
        assert_eq!(signed["proof"]["domain"], "verifier.example");
    }
}
