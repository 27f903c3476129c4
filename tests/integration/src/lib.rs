//! Fixtures shared by the cross-crate integration tests: an in-memory DID
//! registry, a status list store and verifiers wired to both.

use std::sync::Arc;
use tessera_core::Did;
use tessera_credentials::{CredentialIssuer, CredentialVerifier, RevocationChecker};
use tessera_crypto::{AnyKeyPair, KeyType};
use tessera_identity::{DidKeyResolver, DidResolver, DidStore, IdentityError, MethodResolverRegistry};
use tessera_proof::{KeyDoc, SuiteRegistry};
use tessera_status::{InMemoryStatusListStore, StatusListRegistry};

/// A small trust network: `did:example` DIDs live in a store, `did:key`
/// DIDs resolve locally.
pub struct Network {
    pub dids: Arc<DidStore>,
    pub resolver: Arc<dyn DidResolver>,
    pub lists: Arc<InMemoryStatusListStore>,
    pub registry: Arc<StatusListRegistry>,
}

impl Network {
    pub fn new() -> Self {
        let dids = Arc::new(DidStore::new());
        let resolver = MethodResolverRegistry::new()
            .with_resolver("example", dids.clone())
            .with_resolver("key", Arc::new(DidKeyResolver));
        Self {
            dids,
            resolver: Arc::new(resolver),
            lists: Arc::new(InMemoryStatusListStore::new()),
            registry: Arc::new(StatusListRegistry::new(SuiteRegistry::with_defaults())),
        }
    }

    /// Register `did:example:<name>` with a fresh key and return its issuer.
    pub fn register(&self, name: &str, key_type: KeyType) -> Result<CredentialIssuer, IdentityError> {
        let did = Did::from_parts("example", name)?;
        let keypair = AnyKeyPair::generate(key_type);
        self.dids.create(&did, &keypair.public_key())?;
        Ok(CredentialIssuer::new(
            KeyDoc::for_did(&did, keypair),
            SuiteRegistry::with_defaults(),
        ))
    }

    /// A fresh `did:key` identity; it needs no registration to resolve.
    pub fn key_holder(&self, key_type: KeyType) -> Result<CredentialIssuer, IdentityError> {
        let keypair = AnyKeyPair::generate(key_type);
        let did = DidKeyResolver::did_for(&keypair.public_key())?;
        let key = KeyDoc::new(format!("{}#{}", did, did.identifier()), did.to_string(), keypair);
        Ok(CredentialIssuer::new(key, SuiteRegistry::with_defaults()))
    }

    /// A verifier resolving through this network and checking its status lists.
    pub fn verifier(&self) -> CredentialVerifier {
        CredentialVerifier::new(self.resolver.clone())
            .with_revocation(RevocationChecker::new(self.lists.clone(), self.registry.clone()))
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}
