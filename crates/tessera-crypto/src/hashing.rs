use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// SHA-256 digest (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Serialize a value in JCS-canonical form (RFC 8785): sorted keys, compact
/// separators, normalized numbers.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CryptoError> {
    serde_jcs::to_vec(value).map_err(|e| CryptoError::Canonicalization(e.to_string()))
}

/// SHA-256 of the canonical form of `value`.
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> Result<Hash, CryptoError> {
    Ok(sha256(&canonicalize(value)?))
}
