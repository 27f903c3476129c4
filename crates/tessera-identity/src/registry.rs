//! Routing of DIDs to method resolvers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tessera_core::config::ResolverConfig;
use tessera_core::{CallError, Did, MemoizedCallMap};

use crate::error::IdentityError;
use crate::resolution::ResolutionResult;
use crate::resolver::{DidResolver, MethodResolver};
use crate::universal::UniversalResolver;

/// Routes each DID to the resolver registered for its method, falling back
/// to a universal resolver for unregistered methods.
///
/// Concurrent resolutions of the same DID share one in-flight call. Nothing
/// is retained once a call settles; wrap the registry in a
/// [`CachingDidResolver`](crate::CachingDidResolver) for caching.
pub struct MethodResolverRegistry {
    resolvers: HashMap<String, Arc<dyn MethodResolver>>,
    universal: Option<Arc<dyn MethodResolver>>,
    calls: MemoizedCallMap<String, ResolutionResult, IdentityError>,
}

impl MethodResolverRegistry {
    /// Create an empty registry with unbounded deduplication.
    pub fn new() -> Self {
        Self {
            resolvers: HashMap::new(),
            universal: None,
            calls: MemoizedCallMap::new(),
        }
    }

    /// Build a registry from the `[resolver]` config section: dedup capacity
    /// and, when a URL is configured, the universal fallback.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, IdentityError> {
        let mut registry = Self::new();
        if let Some(capacity) = config.dedup_capacity {
            registry = registry.with_capacity(capacity, config.dedup_queue_capacity);
        }
        if let Some(url) = &config.universal_resolver_url {
            let universal =
                UniversalResolver::new(url, Duration::from_secs(config.request_timeout_secs))?;
            registry = registry.with_universal_resolver(Arc::new(universal));
        }
        Ok(registry)
    }

    /// Bound the number of distinct DIDs resolved concurrently.
    pub fn with_capacity(mut self, capacity: usize, queue_capacity: Option<usize>) -> Self {
        self.calls = MemoizedCallMap::with_capacity(capacity, queue_capacity);
        self
    }

    pub fn with_universal_resolver(mut self, resolver: Arc<dyn MethodResolver>) -> Self {
        self.universal = Some(resolver);
        self
    }

    /// Register `resolver` for `method`, replacing any previous one.
    pub fn register(&mut self, method: impl Into<String>, resolver: Arc<dyn MethodResolver>) {
        let method = method.into();
        tracing::debug!(method = %method, "registered DID method resolver");
        self.resolvers.insert(method, resolver);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_resolver(
        mut self,
        method: impl Into<String>,
        resolver: Arc<dyn MethodResolver>,
    ) -> Self {
        self.register(method, resolver);
        self
    }

    /// Whether `method` can be resolved, either directly or via the fallback.
    pub fn supports(&self, method: &str) -> bool {
        self.resolvers.contains_key(method) || self.universal.is_some()
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.resolvers.keys().cloned().collect();
        methods.sort();
        methods
    }

    pub fn has_universal_resolver(&self) -> bool {
        self.universal.is_some()
    }

    fn route(&self, did: &Did) -> Result<(Arc<dyn MethodResolver>, bool), IdentityError> {
        if let Some(resolver) = self.resolvers.get(did.method()) {
            return Ok((Arc::clone(resolver), false));
        }
        match &self.universal {
            Some(universal) => Ok((Arc::clone(universal), true)),
            None => Err(IdentityError::UnsupportedMethod(did.method().to_string())),
        }
    }
}

impl Default for MethodResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DidResolver for MethodResolverRegistry {
    async fn resolve(&self, did: &str) -> Result<ResolutionResult, IdentityError> {
        let did = Did::parse(did)?;
        let (resolver, fallback) = self.route(&did)?;
        tracing::debug!(did = %did, method = did.method(), fallback, "resolving DID");

        let key = did.to_string();
        let target = did.clone();
        let outcome = self
            .calls
            .call_by_key(key, move || async move {
                let raw = resolver
                    .resolve_method(&target)
                    .await
                    .map_err(|e| IdentityError::resolution(target.uri(), e))?;
                raw.normalize(&target)
                    .map_err(|e| IdentityError::resolution(target.uri(), e))
            })
            .await;

        match outcome {
            Ok(result) => {
                if result.is_deactivated() {
                    tracing::debug!(did = %did, "DID is deactivated");
                }
                Ok(result)
            }
            Err(CallError::Failed(err)) => Err(err),
            Err(err @ CallError::CapacityExceeded { .. }) => {
                Err(IdentityError::CapacityExceeded(err.to_string()))
            }
            Err(err) => Err(IdentityError::DidResolution {
                did: did.to_string(),
                cause: err.to_string(),
            }),
        }
    }
}
