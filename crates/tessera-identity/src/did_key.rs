use async_trait::async_trait;
use tessera_core::Did;
use tessera_crypto::AnyPublicKey;

use crate::document::{DidDocument, VerificationMethod};
use crate::error::IdentityError;
use crate::resolution::MethodResolution;
use crate::resolver::MethodResolver;

/// Resolver for `did:key` (Ed25519 and secp256k1 multicodec keys).
///
/// The document is derived from the identifier itself, so resolution never
/// leaves the process.
pub struct DidKeyResolver;

impl DidKeyResolver {
    /// The `did:key` DID of a public key.
    pub fn did_for(public_key: &AnyPublicKey) -> Result<Did, IdentityError> {
        Ok(Did::from_parts("key", &public_key.to_multibase())?)
    }

    /// Expand a `did:key` DID into its single-key document.
    pub fn document_for(did: &Did) -> Result<DidDocument, IdentityError> {
        if did.method() != "key" {
            return Err(IdentityError::UnsupportedMethod(did.method().to_string()));
        }
        let fingerprint = did.identifier();
        let public_key = AnyPublicKey::from_multibase(fingerprint).map_err(|e| {
            IdentityError::MalformedDid(format!("invalid did:key {}: {}", did, e))
        })?;

        let id = format!("{}#{}", did, fingerprint);
        let mut doc = DidDocument::new(did.clone());
        doc.verification_method.push(VerificationMethod::new(
            id.clone(),
            did.to_string(),
            &public_key,
        ));
        doc.authentication.push(id.clone());
        doc.assertion_method.push(id);
        Ok(doc)
    }
}

#[async_trait]
impl MethodResolver for DidKeyResolver {
    async fn resolve_method(&self, did: &Did) -> Result<MethodResolution, IdentityError> {
        let doc = Self::document_for(did)?;
        Ok(MethodResolution::found(doc.to_json()))
    }
}
