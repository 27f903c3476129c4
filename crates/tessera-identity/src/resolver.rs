use async_trait::async_trait;
use std::sync::Arc;
use tessera_core::Did;

use crate::document::{DidDocument, VerificationMethod};
use crate::error::IdentityError;
use crate::resolution::{MethodResolution, ResolutionResult};

/// Trait for resolving DIDs to normalized documents.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolve a DID string. Malformed input fails with `MalformedDid`.
    async fn resolve(&self, did: &str) -> Result<ResolutionResult, IdentityError>;
}

#[async_trait]
impl<T: DidResolver + ?Sized> DidResolver for Arc<T> {
    async fn resolve(&self, did: &str) -> Result<ResolutionResult, IdentityError> {
        (**self).resolve(did).await
    }
}

/// A resolver for one or more DID methods, returning the method's raw
/// document shape.
#[async_trait]
pub trait MethodResolver: Send + Sync {
    async fn resolve_method(&self, did: &Did) -> Result<MethodResolution, IdentityError>;
}

/// Resolve the DID behind a verification method URL and return its
/// document together with that method.
///
/// Deactivated DIDs fail with `NoDid`.
pub async fn resolve_verification_method(
    resolver: &dyn DidResolver,
    method_id: &str,
) -> Result<(DidDocument, VerificationMethod), IdentityError> {
    let did = Did::from_url(method_id)?;
    let document = resolver.resolve(did.uri()).await?.into_active_document()?;
    let method = document
        .verification_method(method_id)
        .cloned()
        .ok_or_else(|| IdentityError::VerificationMethodNotFound(method_id.to_string()))?;
    Ok((document, method))
}
