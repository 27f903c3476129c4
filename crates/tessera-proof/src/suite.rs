use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_crypto::{canonical_hash, multibase_decode, multibase_encode, AnyPublicKey, KeyType};

use crate::error::ProofError;
use crate::key_doc::KeyDoc;
use crate::proof::{without_proof, Proof};
use crate::purpose::ProofPurpose;

pub const ED25519_SIGNATURE_2018: &str = "Ed25519Signature2018";
pub const ED25519_SIGNATURE_2020: &str = "Ed25519Signature2020";
pub const SECP256K1_SIGNATURE_2019: &str = "EcdsaSecp256k1Signature2019";

/// Outcome of checking one proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofVerification {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProofVerification {
    pub fn success() -> Self {
        Self {
            verified: true,
            error: None,
        }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self {
            verified: false,
            error: Some(error.to_string()),
        }
    }
}

/// A signature suite: creates and checks proofs of one type.
pub trait ProofSuite: Send + Sync {
    /// The proof `type` this suite produces and accepts.
    fn proof_type(&self) -> &str;

    /// The key algorithm this suite signs with.
    fn key_type(&self) -> KeyType;

    /// Create a proof over `document` (any existing proof is ignored).
    fn create_proof(
        &self,
        document: &Value,
        key: &KeyDoc,
        purpose: &ProofPurpose,
    ) -> Result<Proof, ProofError>;

    /// Check the signature of `proof` over `document`.
    fn verify_proof(&self, document: &Value, proof: &Proof, public_key: &AnyPublicKey)
        -> ProofVerification;
}

/// Signature suite over JCS-canonicalized JSON.
///
/// The signed bytes are `SHA-256(proof options) ‖ SHA-256(document)`, both
/// canonicalized, with the proof value encoded as multibase base58btc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureSuite {
    proof_type: &'static str,
    key_type: KeyType,
}

impl SignatureSuite {
    pub fn ed25519_2018() -> Self {
        Self {
            proof_type: ED25519_SIGNATURE_2018,
            key_type: KeyType::Ed25519,
        }
    }

    pub fn ed25519_2020() -> Self {
        Self {
            proof_type: ED25519_SIGNATURE_2020,
            key_type: KeyType::Ed25519,
        }
    }

    pub fn secp256k1_2019() -> Self {
        Self {
            proof_type: SECP256K1_SIGNATURE_2019,
            key_type: KeyType::Secp256k1,
        }
    }

    fn verify_data(document: &Value, proof: &Proof) -> Result<Vec<u8>, ProofError> {
        let mut data = canonical_hash(&proof.options())?.to_vec();
        data.extend_from_slice(&canonical_hash(&without_proof(document))?);
        Ok(data)
    }
}

impl ProofSuite for SignatureSuite {
    fn proof_type(&self) -> &str {
        self.proof_type
    }

    fn key_type(&self) -> KeyType {
        self.key_type
    }

    fn create_proof(
        &self,
        document: &Value,
        key: &KeyDoc,
        purpose: &ProofPurpose,
    ) -> Result<Proof, ProofError> {
        if key.key_type() != self.key_type {
            return Err(ProofError::KeyMismatch {
                key: key.key_type().to_string(),
                suite: self.proof_type.to_string(),
            });
        }

        let mut proof = Proof {
            proof_type: self.proof_type.to_string(),
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            verification_method: key.id.clone(),
            proof_purpose: purpose.term().to_string(),
            challenge: purpose.challenge().map(str::to_string),
            domain: purpose.domain().map(str::to_string),
            proof_value: String::new(),
        };
        let data = Self::verify_data(document, &proof)?;
        proof.proof_value = multibase_encode(&key.sign(&data));
        Ok(proof)
    }

    fn verify_proof(
        &self,
        document: &Value,
        proof: &Proof,
        public_key: &AnyPublicKey,
    ) -> ProofVerification {
        if proof.proof_type != self.proof_type {
            return ProofVerification::failure(ProofError::UnsupportedSuite(
                proof.proof_type.clone(),
            ));
        }
        if public_key.key_type() != self.key_type {
            return ProofVerification::failure(ProofError::KeyMismatch {
                key: public_key.key_type().to_string(),
                suite: self.proof_type.to_string(),
            });
        }

        let checked = multibase_decode(&proof.proof_value)
            .map_err(ProofError::from)
            .and_then(|signature| {
                let data = Self::verify_data(document, proof)?;
                public_key.verify(&data, &signature)?;
                Ok(())
            });

        match checked {
            Ok(()) => ProofVerification::success(),
            Err(err) => ProofVerification::failure(err),
        }
    }
}
