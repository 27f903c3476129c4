//! Status list operations with a shared decode cache.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tessera_core::config::StatusConfig;
use tessera_proof::{KeyDoc, SuiteRegistry};

use crate::bitstring::StatusList;
use crate::credential::{StatusList2021Credential, StatusListOptions};
use crate::entry::StatusList2021Entry;
use crate::error::StatusError;

/// Containers whose decoded bitstrings are kept by default.
pub const DEFAULT_DECODE_CACHE_CAPACITY: usize = 1024;

struct DecodedList {
    encoded: String,
    list: Arc<StatusList>,
    /// Insertion order, for eviction.
    seq: u64,
}

/// Creates, reads and updates status list containers.
///
/// Decoded bitstrings are cached per container id and reused for as long as
/// the container's `encodedList` is unchanged. At most `cache_capacity`
/// containers are cached; the oldest decode is evicted to make room.
pub struct StatusListRegistry {
    suites: SuiteRegistry,
    default_length: usize,
    cache_capacity: usize,
    decoded: DashMap<String, DecodedList>,
    next_seq: AtomicU64,
}

impl StatusListRegistry {
    pub fn new(suites: SuiteRegistry) -> Self {
        Self {
            suites,
            default_length: crate::credential::DEFAULT_LIST_LENGTH,
            cache_capacity: DEFAULT_DECODE_CACHE_CAPACITY,
            decoded: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &StatusConfig, suites: SuiteRegistry) -> Self {
        Self::new(suites)
            .with_default_length(config.default_length)
            .with_cache_capacity(config.decode_cache_capacity)
    }

    /// Bound the number of cached decodes. Zero disables the cache.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Length used by [`create`](Self::create) when the options leave it unset.
    pub fn with_default_length(mut self, length: usize) -> Self {
        self.default_length = length;
        self
    }

    pub fn suites(&self) -> &SuiteRegistry {
        &self.suites
    }

    /// Create and sign a new container.
    pub fn create(
        &self,
        key: &KeyDoc,
        id: &str,
        mut options: StatusListOptions,
    ) -> Result<StatusList2021Credential, StatusError> {
        options.length.get_or_insert(self.default_length);
        StatusList2021Credential::create(key, id, options, &self.suites)
    }

    /// Decode the container's bitstring, reusing a cached decode.
    pub fn decode(
        &self,
        container: &StatusList2021Credential,
    ) -> Result<Arc<StatusList>, StatusError> {
        let encoded = container.encoded_list();
        if let Some(cached) = self.decoded.get(&container.id) {
            if cached.encoded == encoded {
                tracing::debug!(id = %container.id, "status list cache hit");
                return Ok(Arc::clone(&cached.list));
            }
        }

        StatusList2021Credential::validate(&container.to_json()?)?;
        let list = Arc::new(StatusList::decode(encoded)?);
        self.remember(&container.id, encoded, Arc::clone(&list));
        Ok(list)
    }

    fn remember(&self, id: &str, encoded: &str, list: Arc<StatusList>) {
        if self.cache_capacity == 0 {
            return;
        }
        while !self.decoded.contains_key(id) && self.decoded.len() >= self.cache_capacity {
            let oldest = self
                .decoded
                .iter()
                .min_by_key(|entry| entry.value().seq)
                .map(|entry| entry.key().clone());
            let Some(oldest) = oldest else { break };
            tracing::debug!(id = %oldest, "status list evicted from decode cache");
            self.decoded.remove(&oldest);
        }
        self.decoded.insert(
            id.to_string(),
            DecodedList {
                encoded: encoded.to_string(),
                list,
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            },
        );
    }

    pub fn is_revoked(
        &self,
        container: &StatusList2021Credential,
        index: usize,
    ) -> Result<bool, StatusError> {
        self.decode(container)?.get(index)
    }

    pub fn is_revoked_batch(
        &self,
        container: &StatusList2021Credential,
        indices: &[usize],
    ) -> Result<Vec<bool>, StatusError> {
        let list = self.decode(container)?;
        indices.iter().map(|&index| list.get(index)).collect()
    }

    /// Look up the bit a credential's status entry points at.
    ///
    /// The entry must reference this container and share its purpose.
    pub fn check_entry(
        &self,
        container: &StatusList2021Credential,
        entry: &StatusList2021Entry,
    ) -> Result<bool, StatusError> {
        if entry.status_list_credential != container.id {
            return Err(StatusError::InvalidStatusEntry(format!(
                "entry references `{}`, not `{}`",
                entry.status_list_credential, container.id
            )));
        }
        if entry.status_purpose != container.purpose() {
            return Err(StatusError::InvalidStatusEntry(format!(
                "entry purpose `{}` does not match list purpose `{}`",
                entry.status_purpose,
                container.purpose()
            )));
        }
        self.is_revoked(container, entry.index()?)
    }

    /// Revoke and unsuspend indices in one step, then re-sign with `key`.
    ///
    /// On any error `container` is left exactly as it was.
    pub fn batch_update(
        &self,
        key: &KeyDoc,
        container: &mut StatusList2021Credential,
        revoke: &[usize],
        unsuspend: &[usize],
    ) -> Result<(), StatusError> {
        let updated = container.update(key, revoke, unsuspend, &self.suites)?;
        *container = updated;
        self.decoded.remove(&container.id);

        tracing::info!(
            id = %container.id,
            revoked = revoke.len(),
            unsuspended = unsuspend.len(),
            "status list updated"
        );
        Ok(())
    }

    pub fn cached_count(&self) -> usize {
        self.decoded.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::StatusPurpose;
    use tessera_core::Did;
    use tessera_crypto::KeyPair;

    const LIST_ID: &str = "https://issuer.example/status/7";

    fn key() -> KeyDoc {
        let did = Did::parse("did:example:issuer").unwrap();
        KeyDoc::for_did(&did, KeyPair::from_seed(&[5u8; 32]))
    }

    fn registry() -> StatusListRegistry {
        StatusListRegistry::new(SuiteRegistry::with_defaults()).with_default_length(128)
    }

    #[test]
    fn test_create_uses_default_length() {
        let registry = registry();
        let container = registry
            .create(&key(), LIST_ID, StatusListOptions::default())
            .unwrap();
        assert_eq!(registry.decode(&container).unwrap().len(), 128);

        let config = StatusConfig::default();
        let registry = StatusListRegistry::from_config(&config, SuiteRegistry::with_defaults());
        let container = registry
            .create(&key(), LIST_ID, StatusListOptions::default())
            .unwrap();
        assert_eq!(registry.decode(&container).unwrap().len(), 10_000);
    }

    #[test]
    fn test_revoke_then_check() {
        let registry = registry();
        let mut container = registry
            .create(&key(), LIST_ID, StatusListOptions::default())
            .unwrap();
        assert!(!registry.is_revoked(&container, 12).unwrap());

        registry.batch_update(&key(), &mut container, &[12], &[]).unwrap();
        assert!(registry.is_revoked(&container, 12).unwrap());
        assert_eq!(
            registry.is_revoked_batch(&container, &[11, 12, 13]).unwrap(),
            vec![false, true, false]
        );
    }

    #[test]
    fn test_conflicting_update_leaves_list() {
        let registry = registry();
        let mut container = registry
            .create(
                &key(),
                LIST_ID,
                StatusListOptions::new(StatusPurpose::Suspension).with_revoked([1, 2]),
            )
            .unwrap();
        let before = container.clone();

        assert_eq!(
            registry.batch_update(&key(), &mut container, &[2, 3], &[2]),
            Err(StatusError::ConflictingIndex(2))
        );
        assert_eq!(container, before);
        assert_eq!(
            registry.is_revoked_batch(&container, &[1, 2, 3]).unwrap(),
            vec![true, true, false]
        );
    }

    #[test]
    fn test_revocation_list_rejects_unsuspend() {
        let registry = registry();
        let mut container = registry
            .create(&key(), LIST_ID, StatusListOptions::default().with_revoked([4]))
            .unwrap();
        let before = container.clone();

        assert_eq!(
            registry.batch_update(&key(), &mut container, &[], &[4]),
            Err(StatusError::UnsuspendNotAllowed("revocation".into()))
        );
        assert_eq!(container, before);
        assert!(registry.is_revoked(&container, 4).unwrap());
    }

    #[test]
    fn test_suspension_unsuspend() {
        let registry = registry();
        let mut container = registry
            .create(&key(), LIST_ID, StatusListOptions::new(StatusPurpose::Suspension))
            .unwrap();

        registry.batch_update(&key(), &mut container, &[9], &[]).unwrap();
        assert!(registry.is_revoked(&container, 9).unwrap());
        registry.batch_update(&key(), &mut container, &[], &[9]).unwrap();
        assert!(!registry.is_revoked(&container, 9).unwrap());
    }

    #[test]
    fn test_index_out_of_range() {
        let registry = registry();
        let container = registry
            .create(&key(), LIST_ID, StatusListOptions::default())
            .unwrap();
        assert_eq!(
            registry.is_revoked(&container, 128),
            Err(StatusError::IndexOutOfRange {
                index: 128,
                length: 128
            })
        );
    }

    #[test]
    fn test_decode_cache_follows_encoded_list() {
        let registry = registry();
        let mut container = registry
            .create(&key(), LIST_ID, StatusListOptions::default())
            .unwrap();

        let first = registry.decode(&container).unwrap();
        let again = registry.decode(&container).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(registry.cached_count(), 1);

        // A stale copy of the container must not be served from the new cache.
        let stale = container.clone();
        registry.batch_update(&key(), &mut container, &[0], &[]).unwrap();
        assert!(registry.is_revoked(&container, 0).unwrap());
        assert!(!registry.is_revoked(&stale, 0).unwrap());
        assert!(registry.is_revoked(&container, 0).unwrap());
    }

    #[test]
    fn test_decode_cache_is_bounded() {
        let registry = registry().with_cache_capacity(2);
        let containers: Vec<_> = (0..3)
            .map(|i| {
                registry
                    .create(&key(), &format!("{}/{}", LIST_ID, i), StatusListOptions::default())
                    .unwrap()
            })
            .collect();

        for container in &containers {
            registry.decode(container).unwrap();
        }
        assert_eq!(registry.cached_count(), 2);
        assert!(!registry.decoded.contains_key(&containers[0].id));
        assert!(registry.decoded.contains_key(&containers[2].id));

        // Re-decoding a cached container does not evict another one.
        registry.decode(&containers[1]).unwrap();
        assert_eq!(registry.cached_count(), 2);
        assert!(registry.decoded.contains_key(&containers[2].id));

        let uncached = StatusListRegistry::new(SuiteRegistry::with_defaults()).with_cache_capacity(0);
        uncached.decode(&containers[0]).unwrap();
        assert_eq!(uncached.cached_count(), 0);
    }

    #[test]
    fn test_check_entry() {
        let registry = registry();
        let mut container = registry
            .create(&key(), LIST_ID, StatusListOptions::default())
            .unwrap();
        registry.batch_update(&key(), &mut container, &[42], &[]).unwrap();

        let entry = StatusList2021Entry::new(LIST_ID, 42, StatusPurpose::Revocation);
        assert!(registry.check_entry(&container, &entry).unwrap());

        let suspended = StatusList2021Entry::new(LIST_ID, 42, StatusPurpose::Suspension);
        assert!(registry.check_entry(&container, &suspended).is_err());

        let elsewhere = StatusList2021Entry::new("urn:other", 42, StatusPurpose::Revocation);
        assert!(registry.check_entry(&container, &elsewhere).is_err());
    }
}
