//! secp256k1 ECDSA keys (`EcdsaSecp256k1VerificationKey2019`).

use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// secp256k1 key pair. Signatures are ECDSA over SHA-256, 64 bytes (r ‖ s).
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Create a key pair from a 32-byte secret scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid secp256k1 secret: {}", e)))?;
        Ok(Self { signing_key })
    }

    pub fn public_key(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey {
            verifying_key: *self.signing_key.verifying_key(),
        }
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(message);
        signature.to_bytes().to_vec()
    }
}

/// Compressed secp256k1 public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secp256k1PublicKey {
    verifying_key: VerifyingKey,
}

impl Secp256k1PublicKey {
    /// Parse a SEC1 encoded key (compressed or uncompressed).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let verifying_key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid secp256k1 key: {}", e)))?;
        Ok(Self { verifying_key })
    }

    /// Compressed SEC1 bytes (33 bytes).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.verifying_key.to_encoded_point(true).as_bytes().to_vec()
    }

    /// Uncompressed SEC1 bytes (65 bytes, `0x04 || x || y`).
    pub fn to_uncompressed_bytes(&self) -> Vec<u8> {
        self.verifying_key.to_encoded_point(false).as_bytes().to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let signature = Signature::from_slice(signature)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid signature: {}", e)))?;
        self.verifying_key
            .verify(message, &signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let kp = Secp256k1KeyPair::generate();
        let sig = kp.sign(b"credential payload");
        assert_eq!(sig.len(), 64);
        assert!(kp.public_key().verify(b"credential payload", &sig).is_ok());
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let kp1 = Secp256k1KeyPair::generate();
        let kp2 = Secp256k1KeyPair::generate();
        let sig = kp1.sign(b"message");
        assert_eq!(
            kp2.public_key().verify(b"message", &sig),
            Err(CryptoError::SignatureVerificationFailed)
        );
    }

    #[test]
    fn test_public_key_compressed() {
        let pk = Secp256k1KeyPair::generate().public_key();
        let bytes = pk.to_bytes();
        assert_eq!(bytes.len(), 33);
        assert!(bytes[0] == 0x02 || bytes[0] == 0x03);
        assert_eq!(Secp256k1PublicKey::from_bytes(&bytes).unwrap(), pk);
    }

    #[test]
    fn test_public_key_uncompressed() {
        let pk = Secp256k1KeyPair::generate().public_key();
        let bytes = pk.to_uncompressed_bytes();
        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes[0], 0x04);
        assert_eq!(Secp256k1PublicKey::from_bytes(&bytes).unwrap(), pk);
    }

    #[test]
    fn test_from_bytes_rejects_bad_length() {
        assert!(Secp256k1KeyPair::from_bytes(&[1u8; 31]).is_err());
        assert!(Secp256k1PublicKey::from_bytes(&[2u8; 10]).is_err());
    }

    #[test]
    fn test_secret_roundtrip() {
        let kp = Secp256k1KeyPair::generate();
        let restored = Secp256k1KeyPair::from_bytes(&kp.secret_bytes()).unwrap();
        assert_eq!(restored.public_key(), kp.public_key());
    }
}
