//! Where status list containers are fetched from.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::credential::StatusList2021Credential;
use crate::error::StatusError;

/// Fetches a status list container by its id.
#[async_trait]
pub trait StatusListSource: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<StatusList2021Credential, StatusError>;
}

#[async_trait]
impl<T: StatusListSource + ?Sized> StatusListSource for Arc<T> {
    async fn fetch(&self, id: &str) -> Result<StatusList2021Credential, StatusError> {
        (**self).fetch(id).await
    }
}

/// In-memory containers keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryStatusListStore {
    lists: DashMap<String, StatusList2021Credential>,
}

impl InMemoryStatusListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `credential`, replacing any container with the same id.
    pub fn put(&self, credential: StatusList2021Credential) {
        tracing::debug!(id = %credential.id, "status list stored");
        self.lists.insert(credential.id.clone(), credential);
    }

    pub fn get(&self, id: &str) -> Option<StatusList2021Credential> {
        self.lists.get(id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: &str) -> Option<StatusList2021Credential> {
        self.lists.remove(id).map(|(_, credential)| credential)
    }

    pub fn count(&self) -> usize {
        self.lists.len()
    }
}

#[async_trait]
impl StatusListSource for InMemoryStatusListStore {
    async fn fetch(&self, id: &str) -> Result<StatusList2021Credential, StatusError> {
        self.get(id)
            .ok_or_else(|| StatusError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::StatusListOptions;
    use tessera_core::Did;
    use tessera_crypto::KeyPair;
    use tessera_proof::{KeyDoc, SuiteRegistry};

    fn container(id: &str) -> StatusList2021Credential {
        let did = Did::parse("did:example:issuer").unwrap();
        let key = KeyDoc::for_did(&did, KeyPair::from_seed(&[2u8; 32]));
        StatusList2021Credential::create(
            &key,
            id,
            StatusListOptions::default().with_length(8),
            &SuiteRegistry::with_defaults(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_fetch_remove() {
        let store = Arc::new(InMemoryStatusListStore::new());
        store.put(container("urn:list:1"));
        assert_eq!(store.count(), 1);

        let source: Arc<dyn StatusListSource> = store.clone();
        assert_eq!(source.fetch("urn:list:1").await.unwrap().id, "urn:list:1");
        assert_eq!(
            source.fetch("urn:list:2").await,
            Err(StatusError::NotFound("urn:list:2".into()))
        );

        assert!(store.remove("urn:list:1").is_some());
        assert!(source.fetch("urn:list:1").await.is_err());
    }
}
