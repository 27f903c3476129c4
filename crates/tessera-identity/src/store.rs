use async_trait::async_trait;
use dashmap::DashMap;
use tessera_core::Did;
use tessera_crypto::AnyPublicKey;

use crate::document::DidDocument;
use crate::error::IdentityError;
use crate::resolution::MethodResolution;
use crate::resolver::MethodResolver;

struct StoredDid {
    document: DidDocument,
    deactivated: bool,
}

/// In-memory DID registry.
///
/// Stands in for a ledger-backed DID module: DIDs can be registered,
/// deactivated and given an `attests` reference. Deactivated DIDs resolve
/// as tombstones.
pub struct DidStore {
    /// DID URI -> stored document
    store: DashMap<String, StoredDid>,
}

impl DidStore {
    /// Create a new, empty DID store.
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }

    /// Register `did` with a single-key document for `public_key`.
    pub fn create(&self, did: &Did, public_key: &AnyPublicKey) -> Result<DidDocument, IdentityError> {
        let doc = DidDocument::with_key(did.clone(), public_key);
        self.insert(doc.clone())?;
        Ok(doc)
    }

    /// Register a prepared document.
    pub fn insert(&self, document: DidDocument) -> Result<(), IdentityError> {
        let did = document.id.to_string();
        if self.store.contains_key(&did) {
            return Err(IdentityError::DuplicateDid(did));
        }
        tracing::info!(did = %did, "DID registered");
        self.store.insert(
            did,
            StoredDid {
                document,
                deactivated: false,
            },
        );
        Ok(())
    }

    /// Replace the document of a registered, active DID.
    pub fn update(&self, document: DidDocument) -> Result<(), IdentityError> {
        let mut entry = self.active_entry(document.id.uri())?;
        entry.document = document;
        Ok(())
    }

    /// Tombstone a DID. Its document is no longer served.
    pub fn deactivate(&self, did: &str) -> Result<(), IdentityError> {
        let mut entry = self.active_entry(did)?;
        entry.deactivated = true;
        tracing::info!(did = %did, "DID deactivated");
        Ok(())
    }

    /// Set or clear the `attests` reference of a DID.
    pub fn set_attests(&self, did: &str, attests: Option<String>) -> Result<(), IdentityError> {
        let mut entry = self.active_entry(did)?;
        entry.document.attests = attests;
        Ok(())
    }

    /// The current document of an active DID.
    pub fn get(&self, did: &str) -> Option<DidDocument> {
        self.store
            .get(did)
            .filter(|entry| !entry.deactivated)
            .map(|entry| entry.document.clone())
    }

    pub fn is_deactivated(&self, did: &str) -> bool {
        self.store.get(did).is_some_and(|entry| entry.deactivated)
    }

    pub fn count(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// List all stored DID URIs, including deactivated ones.
    pub fn list_dids(&self) -> Vec<String> {
        self.store.iter().map(|entry| entry.key().clone()).collect()
    }

    fn active_entry(
        &self,
        did: &str,
    ) -> Result<dashmap::mapref::one::RefMut<'_, String, StoredDid>, IdentityError> {
        match self.store.get_mut(did) {
            Some(entry) if !entry.deactivated => Ok(entry),
            _ => Err(IdentityError::NoDid(did.to_string())),
        }
    }
}

impl Default for DidStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MethodResolver for DidStore {
    async fn resolve_method(&self, did: &Did) -> Result<MethodResolution, IdentityError> {
        let entry = self
            .store
            .get(did.uri())
            .ok_or_else(|| IdentityError::NoDid(did.to_string()))?;
        if entry.deactivated {
            return Ok(MethodResolution::tombstone());
        }
        Ok(MethodResolution::found(entry.document.to_json()))
    }
}
