//! Multibase helpers. Only base58btc (`z`) is supported.

use crate::error::CryptoError;

/// Encode bytes as multibase base58btc (`z` prefix).
pub fn multibase_encode(bytes: &[u8]) -> String {
    format!("z{}", bs58::encode(bytes).into_string())
}

/// Decode a multibase base58btc string.
pub fn multibase_decode(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    let body = encoded.strip_prefix('z').ok_or_else(|| {
        CryptoError::InvalidInput(format!(
            "unsupported multibase encoding, expected 'z' prefix: {}",
            encoded
        ))
    })?;
    bs58::decode(body)
        .into_vec()
        .map_err(|e| CryptoError::InvalidInput(format!("invalid base58: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multibase_roundtrip() {
        let encoded = multibase_encode(b"tessera");
        assert!(encoded.starts_with('z'));
        assert_eq!(multibase_decode(&encoded).unwrap(), b"tessera");
    }

    #[test]
    fn test_multibase_rejects_other_bases() {
        assert!(multibase_decode("mAAAA").is_err());
        assert!(multibase_decode("z0OIl").is_err());
    }
}
