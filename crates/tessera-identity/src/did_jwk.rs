//! `did:jwk`: DIDs whose identifier is a base64url encoded public JWK.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{json, Value};
use tessera_core::Did;
use tessera_crypto::{AnyPublicKey, KeyType};

use crate::document::{DidDocument, VerificationMethod};
use crate::error::IdentityError;
use crate::resolution::MethodResolution;
use crate::resolver::MethodResolver;

/// Resolver for `did:jwk` (Ed25519 `OKP` and secp256k1 `EC` keys).
///
/// Like `did:key`, the document is derived from the identifier alone. The
/// single verification method is always `<did>#0`.
pub struct DidJwkResolver;

impl DidJwkResolver {
    /// The `did:jwk` DID of a public key.
    pub fn did_for(public_key: &AnyPublicKey) -> Result<Did, IdentityError> {
        let jwk = serde_json::to_vec(&jwk_for(public_key))
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
        Ok(Did::from_parts("jwk", &URL_SAFE_NO_PAD.encode(jwk))?)
    }

    /// Expand a `did:jwk` DID into its single-key document.
    pub fn document_for(did: &Did) -> Result<DidDocument, IdentityError> {
        if did.method() != "jwk" {
            return Err(IdentityError::UnsupportedMethod(did.method().to_string()));
        }
        let malformed =
            |reason: String| IdentityError::MalformedDid(format!("invalid did:jwk {}: {}", did, reason));
        let bytes = URL_SAFE_NO_PAD
            .decode(did.identifier())
            .map_err(|e| malformed(e.to_string()))?;
        let jwk: Value = serde_json::from_slice(&bytes).map_err(|e| malformed(e.to_string()))?;
        let public_key = public_key_from_jwk(&jwk)?;

        let id = format!("{}#0", did);
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
impl MethodResolver for DidJwkResolver {
    async fn resolve_method(&self, did: &Did) -> Result<MethodResolution, IdentityError> {
        let doc = Self::document_for(did)?;
        Ok(MethodResolution::found(doc.to_json()))
    }
}

fn jwk_for(public_key: &AnyPublicKey) -> Value {
    match public_key {
        AnyPublicKey::Ed25519(pk) => json!({
            "crv": "Ed25519",
            "kty": "OKP",
            "x": URL_SAFE_NO_PAD.encode(pk.as_bytes()),
        }),
        AnyPublicKey::Secp256k1(pk) => {
            let point = pk.to_uncompressed_bytes();
            json!({
                "crv": "secp256k1",
                "kty": "EC",
                "x": URL_SAFE_NO_PAD.encode(&point[1..33]),
                "y": URL_SAFE_NO_PAD.encode(&point[33..]),
            })
        }
    }
}

fn public_key_from_jwk(jwk: &Value) -> Result<AnyPublicKey, IdentityError> {
    if jwk.get("d").is_some() {
        return Err(IdentityError::InvalidKey("did:jwk must not carry a private key".into()));
    }
    let member = |name: &str| -> Result<Vec<u8>, IdentityError> {
        let encoded = jwk
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| IdentityError::InvalidKey(format!("JWK is missing \"{}\"", name)))?;
        URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| IdentityError::InvalidKey(format!("JWK \"{}\": {}", name, e)))
    };

    let kty = jwk.get("kty").and_then(Value::as_str).unwrap_or_default();
    let crv = jwk.get("crv").and_then(Value::as_str).unwrap_or_default();
    match (kty, crv) {
        ("OKP", "Ed25519") => Ok(AnyPublicKey::from_bytes(KeyType::Ed25519, &member("x")?)?),
        ("EC", "secp256k1") => {
            let (x, y) = (member("x")?, member("y")?);
            if x.len() != 32 || y.len() != 32 {
                return Err(IdentityError::InvalidKey(
                    "secp256k1 JWK coordinates must be 32 bytes".into(),
                ));
            }
            let mut point = vec![0x04];
            point.extend_from_slice(&x);
            point.extend_from_slice(&y);
            Ok(AnyPublicKey::from_bytes(KeyType::Secp256k1, &point)?)
        }
        _ => Err(IdentityError::InvalidKey(format!(
            "unsupported JWK kty {:?} crv {:?}",
            kty, crv
        ))),
    }
}
