use std::collections::HashMap;
use std::sync::Arc;
use tessera_crypto::KeyType;

use crate::error::ProofError;
use crate::suite::{ProofSuite, SignatureSuite};

/// Dispatch table of proof suites, keyed by proof type.
#[derive(Clone)]
pub struct SuiteRegistry {
    suites: HashMap<String, Arc<dyn ProofSuite>>,
    /// Suite used to sign with each key type.
    signing: HashMap<KeyType, Arc<dyn ProofSuite>>,
}

impl SuiteRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            suites: HashMap::new(),
            signing: HashMap::new(),
        }
    }

    /// All built-in suites. New proofs use Ed25519Signature2018 and
    /// EcdsaSecp256k1Signature2019.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SignatureSuite::ed25519_2020()));
        registry.register(Arc::new(SignatureSuite::secp256k1_2019()));
        registry.register(Arc::new(SignatureSuite::ed25519_2018()));
        registry
    }

    /// Register a suite. The most recently registered suite for a key type
    /// becomes the signing suite for that type.
    pub fn register(&mut self, suite: Arc<dyn ProofSuite>) {
        self.signing.insert(suite.key_type(), Arc::clone(&suite));
        self.suites.insert(suite.proof_type().to_string(), suite);
    }

    /// The suite verifying proofs of `proof_type`.
    pub fn by_proof_type(&self, proof_type: &str) -> Result<Arc<dyn ProofSuite>, ProofError> {
        self.suites
            .get(proof_type)
            .cloned()
            .ok_or_else(|| ProofError::UnsupportedSuite(proof_type.to_string()))
    }

    /// The suite signing with keys of `key_type`.
    pub fn for_key_type(&self, key_type: KeyType) -> Result<Arc<dyn ProofSuite>, ProofError> {
        self.signing
            .get(&key_type)
            .cloned()
            .ok_or_else(|| ProofError::UnsupportedSuite(format!("no suite signs with {} keys", key_type)))
    }

    /// Registered proof types, sorted.
    pub fn proof_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.suites.keys().cloned().collect();
        types.sort();
        types
    }
}

impl Default for SuiteRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let registry = SuiteRegistry::with_defaults();
        assert_eq!(
            registry.proof_types(),
            vec![
                "EcdsaSecp256k1Signature2019".to_string(),
                "Ed25519Signature2018".to_string(),
                "Ed25519Signature2020".to_string(),
            ]
        );
        assert_eq!(
            registry.for_key_type(KeyType::Ed25519).unwrap().proof_type(),
            "Ed25519Signature2018"
        );
        assert_eq!(
            registry.for_key_type(KeyType::Secp256k1).unwrap().proof_type(),
            "EcdsaSecp256k1Signature2019"
        );
    }

    #[test]
    fn test_unknown_suite() {
        let registry = SuiteRegistry::new();
        assert!(matches!(
            registry.by_proof_type("BbsBlsSignature2020"),
            Err(ProofError::UnsupportedSuite(_))
        ));
        assert!(registry.for_key_type(KeyType::Ed25519).is_err());
    }

    #[test]
    fn test_register_overrides_signing_suite() {
        let mut registry = SuiteRegistry::with_defaults();
        registry.register(Arc::new(SignatureSuite::ed25519_2020()));
        assert_eq!(
            registry.for_key_type(KeyType::Ed25519).unwrap().proof_type(),
            "Ed25519Signature2020"
        );
    }
}
