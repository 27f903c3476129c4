use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::error::IdentityError;
use crate::resolution::ResolutionResult;
use crate::resolver::DidResolver;

struct CachedResolution {
    result: ResolutionResult,
    fetched_at: Instant,
}

/// Caller-side cache in front of any [`DidResolver`].
///
/// Only active documents are cached; a deactivated result is always
/// fetched afresh and evicts any cached copy.
pub struct CachingDidResolver<R> {
    inner: R,
    ttl: Duration,
    /// DID URI -> last active resolution
    cache: DashMap<String, CachedResolution>,
}

impl<R: DidResolver> CachingDidResolver<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: DashMap::new(),
        }
    }

    /// Drop the cached document of `did`.
    pub fn invalidate(&self, did: &str) {
        self.cache.remove(did);
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// A fresh cached result. A stale entry is dropped on the way.
    fn lookup(&self, did: &str) -> Option<ResolutionResult> {
        if let Some(entry) = self.cache.get(did) {
            if entry.fetched_at.elapsed() < self.ttl {
                return Some(entry.result.clone());
            }
        }
        self.cache
            .remove_if(did, |_, entry| entry.fetched_at.elapsed() >= self.ttl);
        None
    }
}

#[async_trait]
impl<R: DidResolver> DidResolver for CachingDidResolver<R> {
    async fn resolve(&self, did: &str) -> Result<ResolutionResult, IdentityError> {
        if let Some(result) = self.lookup(did) {
            tracing::debug!(did = %did, "DID document cache hit");
            return Ok(result);
        }

        let result = self.inner.resolve(did).await?;
        if result.is_deactivated() {
            self.cache.remove(did);
        } else {
            self.cache.insert(
                did.to_string(),
                CachedResolution {
                    result: result.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
        Ok(result)
    }
}
