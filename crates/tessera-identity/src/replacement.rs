use async_trait::async_trait;
use tessera_core::Did;

use crate::document::DidDocument;
use crate::error::IdentityError;
use crate::resolution::ResolutionResult;
use crate::resolver::DidResolver;

/// Resolves DIDs under a retired prefix through their replacement.
///
/// A DID starting with `from` is rewritten to start with `to` and resolved by
/// the inner resolver. The returned document is renamed back to the requested
/// DID, so verification method ids issued under the old prefix still match.
/// Other DIDs pass through unchanged.
pub struct DidReplacementResolver<R> {
    inner: R,
    from: String,
    to: String,
}

impl<R: DidResolver> DidReplacementResolver<R> {
    pub fn new(inner: R, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            inner,
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// The DID `did` is resolved as, if it falls under the replaced prefix.
    pub fn replacement_for(&self, did: &str) -> Option<String> {
        did.strip_prefix(&self.from)
            .map(|rest| format!("{}{}", self.to, rest))
    }
}

#[async_trait]
impl<R: DidResolver> DidResolver for DidReplacementResolver<R> {
    async fn resolve(&self, did: &str) -> Result<ResolutionResult, IdentityError> {
        let Some(target) = self.replacement_for(did) else {
            return self.inner.resolve(did).await;
        };
        let requested = Did::parse(did)?;
        tracing::debug!(did = %did, replacement = %target, "resolving replaced DID");

        let mut result = self.inner.resolve(&target).await?;
        result.did = requested.clone();
        if let Some(document) = result.document.as_mut() {
            rename(document, &target, requested);
        }
        Ok(result)
    }
}

fn rename(document: &mut DidDocument, from: &str, to: Did) {
    let swap = |value: &mut String| {
        if let Some(rest) = value.strip_prefix(from) {
            *value = format!("{}{}", to, rest);
        }
    };
    for method in &mut document.verification_method {
        swap(&mut method.id);
        swap(&mut method.controller);
    }
    document.authentication.iter_mut().for_each(swap);
    document.assertion_method.iter_mut().for_each(swap);
    document.id = to;
}
