use std::fmt;
use tessera_core::Did;
use tessera_crypto::{AnyKeyPair, AnyPublicKey, KeyType};
use tessera_identity::VerificationMethod;

/// A key pair bound to the verification method id it signs as.
pub struct KeyDoc {
    /// Verification method id (e.g. `did:example:issuer#keys-1`).
    pub id: String,
    /// The DID controlling the key.
    pub controller: String,
    keypair: AnyKeyPair,
}

impl KeyDoc {
    pub fn new(id: impl Into<String>, controller: impl Into<String>, keypair: impl Into<AnyKeyPair>) -> Self {
        Self {
            id: id.into(),
            controller: controller.into(),
            keypair: keypair.into(),
        }
    }

    /// The conventional key document of a DID: `<did>#keys-1`.
    pub fn for_did(did: &Did, keypair: impl Into<AnyKeyPair>) -> Self {
        Self::new(format!("{}#keys-1", did), did.to_string(), keypair)
    }

    pub fn key_type(&self) -> KeyType {
        self.keypair.key_type()
    }

    pub fn public_key(&self) -> AnyPublicKey {
        self.keypair.public_key()
    }

    pub fn keypair(&self) -> &AnyKeyPair {
        &self.keypair
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.keypair.sign(message)
    }

    /// The verification method a DID document should list for this key.
    pub fn verification_method(&self) -> VerificationMethod {
        VerificationMethod::new(self.id.clone(), self.controller.clone(), &self.public_key())
    }
}

impl fmt::Debug for KeyDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDoc")
            .field("id", &self.id)
            .field("controller", &self.controller)
            .field("key_type", &self.key_type())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_crypto::KeyPair;

    #[test]
    fn test_for_did() {
        let did = Did::parse("did:example:issuer").unwrap();
        let key = KeyDoc::for_did(&did, KeyPair::from_seed(&[1u8; 32]));
        assert_eq!(key.id, "did:example:issuer#keys-1");
        assert_eq!(key.controller, "did:example:issuer");
        assert_eq!(key.key_type(), KeyType::Ed25519);

        let vm = key.verification_method();
        assert_eq!(vm.id, key.id);
        assert_eq!(vm.public_key().unwrap(), key.public_key());
    }

    #[test]
    fn test_debug_hides_secret() {
        let did = Did::parse("did:example:issuer").unwrap();
        let key = KeyDoc::for_did(&did, KeyPair::from_seed(&[1u8; 32]));
        let printed = format!("{:?}", key);
        assert!(printed.contains("did:example:issuer#keys-1"));
        assert!(!printed.contains("keypair"));
    }
}
