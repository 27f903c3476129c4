//! Integration test: DID resolution under concurrency.
//!
//! Exercises method routing, the universal fallback, in-flight
//! deduplication and retried resolution together.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tessera_core::{Did, Next, Retry, RetryError, RetryOptions};
use tessera_crypto::KeyType;
use tessera_identity::{
    CachingDidResolver, DidResolver, IdentityError, MethodResolution, MethodResolver,
    MethodResolverRegistry,
};
use tessera_integration_tests::Network;

/// Serves a minimal document for any DID after `delay`, counting calls.
struct SlowResolver {
    calls: AtomicUsize,
    delay: Duration,
}

impl SlowResolver {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MethodResolver for SlowResolver {
    async fn resolve_method(&self, did: &Did) -> Result<MethodResolution, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(MethodResolution::found(json!({"id": did.uri()})))
    }
}

#[tokio::test]
async fn test_concurrent_resolutions_share_one_call() {
    let slow = SlowResolver::new(Duration::from_millis(50));
    let registry = Arc::new(MethodResolverRegistry::new().with_resolver("slow", slow.clone()));

    let lookups = (0..16).map(|i| {
        let registry = registry.clone();
        let did = if i % 2 == 0 { "did:slow:a" } else { "did:slow:b" };
        tokio::spawn(async move { registry.resolve(did).await })
    });
    let results = futures::future::join_all(lookups).await;

    for result in results {
        let resolved = result.unwrap().unwrap();
        assert!(resolved.document.is_some());
    }
    assert_eq!(slow.calls(), 2);

    // Settled calls are not memoized.
    registry.resolve("did:slow:a").await.unwrap();
    assert_eq!(slow.calls(), 3);
}

#[tokio::test]
async fn test_registered_method_wins_over_universal_resolver() {
    let network = Network::new();
    let issuer = network.register("issuer", KeyType::Ed25519).unwrap();

    let universal = SlowResolver::new(Duration::ZERO);
    let registry = MethodResolverRegistry::new()
        .with_resolver("example", network.dids.clone())
        .with_universal_resolver(universal.clone());

    let resolved = registry.resolve(issuer.did()).await.unwrap();
    assert_eq!(resolved.document.unwrap().id.uri(), issuer.did());
    assert_eq!(universal.calls(), 0);

    let fallback = registry.resolve("did:web:example.com").await.unwrap();
    assert_eq!(fallback.document.unwrap().id.uri(), "did:web:example.com");
    assert_eq!(universal.calls(), 1);
}

#[tokio::test]
async fn test_unsupported_method_without_fallback() {
    let network = Network::new();
    assert!(network.resolver.resolve("did:web:example.com").await.is_err());
    assert!(network.resolver.resolve("not-a-did").await.is_err());
}

#[tokio::test]
async fn test_cache_in_front_of_registry() {
    let slow = SlowResolver::new(Duration::ZERO);
    let cached = CachingDidResolver::new(
        MethodResolverRegistry::new().with_resolver("slow", slow.clone()),
        Duration::from_secs(60),
    );

    cached.resolve("did:slow:a").await.unwrap();
    cached.resolve("did:slow:a").await.unwrap();
    assert_eq!(slow.calls(), 1);

    cached.invalidate("did:slow:a");
    cached.resolve("did:slow:a").await.unwrap();
    assert_eq!(slow.calls(), 2);
}

#[tokio::test]
async fn test_retry_around_hanging_resolution() {
    let slow = SlowResolver::new(Duration::from_secs(3600));
    let registry = Arc::new(MethodResolverRegistry::new().with_resolver("slow", slow.clone()));

    let timeouts = Arc::new(AtomicU32::new(0));
    let seen = timeouts.clone();
    let result = Retry::new(RetryOptions::new(Duration::from_millis(20)).with_max_attempts(5))
        .on_timeout_exceeded(move |attempt| {
            seen.fetch_add(1, Ordering::SeqCst);
            if attempt < 2 {
                Next::Retry
            } else {
                Next::Stop
            }
        })
        .run(|| {
            let registry = registry.clone();
            async move { registry.resolve("did:slow:hangs").await }
        })
        .await;

    assert!(matches!(result, Err(RetryError::Exhausted { attempts: 2, .. })));
    assert_eq!(timeouts.load(Ordering::SeqCst), 2);
    // Abandoned attempts joined the same in-flight call.
    assert_eq!(slow.calls(), 1);
}
