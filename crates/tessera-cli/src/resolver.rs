use std::sync::Arc;
use std::time::Duration;
use tessera_core::TesseraConfig;
use tessera_identity::{
    CachingDidResolver, DidJwkResolver, DidKeyResolver, DidReplacementResolver, DidResolver,
    MethodResolverRegistry,
};

/// The resolver stack used by every command: `did:key` and `did:jwk` in
/// process, other methods through the configured universal resolver, behind a
/// TTL cache. Configured DID replacements sit in front of the cache.
pub fn build(config: &TesseraConfig) -> anyhow::Result<Arc<dyn DidResolver>> {
    let registry = MethodResolverRegistry::from_config(&config.resolver)?
        .with_resolver("key", Arc::new(DidKeyResolver))
        .with_resolver("jwk", Arc::new(DidJwkResolver));
    tracing::debug!(
        methods = ?registry.methods(),
        universal = registry.has_universal_resolver(),
        "resolver configured"
    );
    let mut resolver: Arc<dyn DidResolver> = Arc::new(CachingDidResolver::new(
        registry,
        Duration::from_secs(config.resolver.cache_ttl_secs),
    ));
    for replacement in &config.resolver.did_replacements {
        resolver = Arc::new(DidReplacementResolver::new(
            resolver,
            &replacement.from,
            &replacement.to,
        ));
    }
    Ok(resolver)
}
