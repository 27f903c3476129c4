use tessera_identity::{DidDocument, Relationship, VerificationMethod};

use crate::error::ProofError;
use crate::proof::Proof;

/// Why a proof was created, and what a verifier expects of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofPurpose {
    /// Issuing a claim. `controller` pins the expected key controller.
    AssertionMethod { controller: Option<String> },
    /// Proving control of a DID, bound to a verifier's challenge and domain.
    Authentication {
        challenge: Option<String>,
        domain: Option<String>,
        controller: Option<String>,
    },
}

impl ProofPurpose {
    pub fn assertion() -> Self {
        ProofPurpose::AssertionMethod { controller: None }
    }

    pub fn authentication(challenge: Option<String>, domain: Option<String>) -> Self {
        ProofPurpose::Authentication {
            challenge,
            domain,
            controller: None,
        }
    }

    /// The `proofPurpose` term.
    pub fn term(&self) -> &'static str {
        self.relationship().term()
    }

    pub fn relationship(&self) -> Relationship {
        match self {
            ProofPurpose::AssertionMethod { .. } => Relationship::AssertionMethod,
            ProofPurpose::Authentication { .. } => Relationship::Authentication,
        }
    }

    pub fn challenge(&self) -> Option<&str> {
        match self {
            ProofPurpose::Authentication { challenge, .. } => challenge.as_deref(),
            ProofPurpose::AssertionMethod { .. } => None,
        }
    }

    pub fn domain(&self) -> Option<&str> {
        match self {
            ProofPurpose::Authentication { domain, .. } => domain.as_deref(),
            ProofPurpose::AssertionMethod { .. } => None,
        }
    }

    fn controller(&self) -> Option<&str> {
        match self {
            ProofPurpose::AssertionMethod { controller }
            | ProofPurpose::Authentication { controller, .. } => controller.as_deref(),
        }
    }

    /// Check a proof against this purpose and the signer's DID document.
    pub fn validate(
        &self,
        proof: &Proof,
        method: &VerificationMethod,
        controller_doc: &DidDocument,
    ) -> Result<(), ProofError> {
        if proof.proof_purpose != self.term() {
            return Err(ProofError::PurposeMismatch(format!(
                "expected {}, got {}",
                self.term(),
                proof.proof_purpose
            )));
        }

        if let Some(expected) = self.challenge() {
            if proof.challenge.as_deref() != Some(expected) {
                return Err(ProofError::PurposeMismatch("challenge does not match".into()));
            }
        }
        if let Some(expected) = self.domain() {
            if proof.domain.as_deref() != Some(expected) {
                return Err(ProofError::PurposeMismatch("domain does not match".into()));
            }
        }

        if let Some(expected) = self.controller() {
            if method.controller != expected {
                return Err(ProofError::PurposeMismatch(format!(
                    "verification method {} is controlled by {}, expected {}",
                    method.id, method.controller, expected
                )));
            }
        }

        if !controller_doc.is_authorized(&method.id, self.relationship()) {
            return Err(ProofError::PurposeMismatch(format!(
                "verification method {} is not authorized for {}",
                method.id,
                self.term()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Did;
    use tessera_crypto::KeyPair;

    fn fixture() -> (DidDocument, VerificationMethod) {
        let did = Did::parse("did:example:holder").unwrap();
        let doc = DidDocument::with_key(did, &KeyPair::generate().public_key().into());
        let vm = doc.verification_method[0].clone();
        (doc, vm)
    }

    fn proof(purpose: &str, challenge: Option<&str>) -> Proof {
        Proof {
            proof_type: "Ed25519Signature2018".into(),
            created: "2024-01-01T00:00:00Z".into(),
            verification_method: "did:example:holder#keys-1".into(),
            proof_purpose: purpose.into(),
            challenge: challenge.map(str::to_string),
            domain: None,
            proof_value: String::new(),
        }
    }

    #[test]
    fn test_assertion_purpose() {
        let (doc, vm) = fixture();
        let purpose = ProofPurpose::AssertionMethod {
            controller: Some("did:example:holder".into()),
        };
        assert!(purpose.validate(&proof("assertionMethod", None), &vm, &doc).is_ok());
        assert!(purpose.validate(&proof("authentication", None), &vm, &doc).is_err());
    }

    #[test]
    fn test_controller_mismatch() {
        let (doc, vm) = fixture();
        let purpose = ProofPurpose::AssertionMethod {
            controller: Some("did:example:someone-else".into()),
        };
        assert!(matches!(
            purpose.validate(&proof("assertionMethod", None), &vm, &doc),
            Err(ProofError::PurposeMismatch(_))
        ));
    }

    #[test]
    fn test_authentication_challenge() {
        let (doc, vm) = fixture();
        let purpose = ProofPurpose::authentication(Some("nonce-1".into()), None);
        assert!(purpose
            .validate(&proof("authentication", Some("nonce-1")), &vm, &doc)
            .is_ok());
        assert!(purpose
            .validate(&proof("authentication", Some("nonce-2")), &vm, &doc)
            .is_err());
        assert!(purpose.validate(&proof("authentication", None), &vm, &doc).is_err());
    }

    #[test]
    fn test_unauthorized_method() {
        let (mut doc, vm) = fixture();
        doc.assertion_method.clear();
        assert!(ProofPurpose::assertion()
            .validate(&proof("assertionMethod", None), &vm, &doc)
            .is_err());
    }
}
