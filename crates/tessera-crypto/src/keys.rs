//! Algorithm-agnostic key pairs and public keys, and their multicodec form.

use std::fmt;

use crate::ed25519::{KeyPair, PublicKey};
use crate::encoding::{multibase_decode, multibase_encode};
use crate::error::CryptoError;
use crate::secp256k1::{Secp256k1KeyPair, Secp256k1PublicKey};

/// Multicodec prefix for an Ed25519 public key (`0xed`, varint encoded).
pub const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];
/// Multicodec prefix for a compressed secp256k1 public key (`0xe7`, varint encoded).
pub const SECP256K1_MULTICODEC: [u8; 2] = [0xe7, 0x01];

/// Supported key algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Ed25519,
    Secp256k1,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Ed25519 => write!(f, "Ed25519"),
            KeyType::Secp256k1 => write!(f, "Secp256k1"),
        }
    }
}

/// A key pair of any supported algorithm.
pub enum AnyKeyPair {
    Ed25519(KeyPair),
    Secp256k1(Secp256k1KeyPair),
}

impl AnyKeyPair {
    pub fn generate(key_type: KeyType) -> Self {
        match key_type {
            KeyType::Ed25519 => AnyKeyPair::Ed25519(KeyPair::generate()),
            KeyType::Secp256k1 => AnyKeyPair::Secp256k1(Secp256k1KeyPair::generate()),
        }
    }

    /// Restore a key pair from its 32 secret bytes.
    pub fn from_secret_bytes(key_type: KeyType, bytes: &[u8]) -> Result<Self, CryptoError> {
        match key_type {
            KeyType::Ed25519 => KeyPair::from_bytes(bytes).map(AnyKeyPair::Ed25519),
            KeyType::Secp256k1 => Secp256k1KeyPair::from_bytes(bytes).map(AnyKeyPair::Secp256k1),
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            AnyKeyPair::Ed25519(_) => KeyType::Ed25519,
            AnyKeyPair::Secp256k1(_) => KeyType::Secp256k1,
        }
    }

    pub fn public_key(&self) -> AnyPublicKey {
        match self {
            AnyKeyPair::Ed25519(kp) => AnyPublicKey::Ed25519(kp.public_key()),
            AnyKeyPair::Secp256k1(kp) => AnyPublicKey::Secp256k1(kp.public_key()),
        }
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        match self {
            AnyKeyPair::Ed25519(kp) => kp.secret_bytes(),
            AnyKeyPair::Secp256k1(kp) => kp.secret_bytes(),
        }
    }

    /// Sign `message`, returning the raw 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            AnyKeyPair::Ed25519(kp) => kp.sign(message),
            AnyKeyPair::Secp256k1(kp) => kp.sign(message),
        }
    }
}

impl From<KeyPair> for AnyKeyPair {
    fn from(kp: KeyPair) -> Self {
        AnyKeyPair::Ed25519(kp)
    }
}

impl From<Secp256k1KeyPair> for AnyKeyPair {
    fn from(kp: Secp256k1KeyPair) -> Self {
        AnyKeyPair::Secp256k1(kp)
    }
}

/// A public key of any supported algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyPublicKey {
    Ed25519(PublicKey),
    Secp256k1(Secp256k1PublicKey),
}

impl AnyPublicKey {
    /// Parse raw public key bytes for the given algorithm.
    pub fn from_bytes(key_type: KeyType, bytes: &[u8]) -> Result<Self, CryptoError> {
        match key_type {
            KeyType::Ed25519 => PublicKey::from_bytes(bytes).map(AnyPublicKey::Ed25519),
            KeyType::Secp256k1 => {
                Secp256k1PublicKey::from_bytes(bytes).map(AnyPublicKey::Secp256k1)
            }
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            AnyPublicKey::Ed25519(_) => KeyType::Ed25519,
            AnyPublicKey::Secp256k1(_) => KeyType::Secp256k1,
        }
    }

    /// Raw key bytes (32 bytes for Ed25519, 33 compressed bytes for secp256k1).
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            AnyPublicKey::Ed25519(pk) => pk.as_bytes().to_vec(),
            AnyPublicKey::Secp256k1(pk) => pk.to_bytes(),
        }
    }

    pub fn to_bs58(&self) -> String {
        bs58::encode(self.to_bytes()).into_string()
    }

    /// Verify a raw signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        match self {
            AnyPublicKey::Ed25519(pk) => pk.verify(message, signature),
            AnyPublicKey::Secp256k1(pk) => pk.verify(message, signature),
        }
    }

    /// Multibase (`z` base58btc) encoding of the multicodec-prefixed key,
    /// as used by `did:key` and `publicKeyMultibase`.
    pub fn to_multibase(&self) -> String {
        let prefix = match self {
            AnyPublicKey::Ed25519(_) => ED25519_MULTICODEC,
            AnyPublicKey::Secp256k1(_) => SECP256K1_MULTICODEC,
        };
        let mut bytes = prefix.to_vec();
        bytes.extend_from_slice(&self.to_bytes());
        multibase_encode(&bytes)
    }

    /// Parse a multibase, multicodec-prefixed public key.
    pub fn from_multibase(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = multibase_decode(encoded)?;
        match bytes.get(..2) {
            Some(prefix) if prefix == ED25519_MULTICODEC => {
                Self::from_bytes(KeyType::Ed25519, &bytes[2..])
            }
            Some(prefix) if prefix == SECP256K1_MULTICODEC => {
                Self::from_bytes(KeyType::Secp256k1, &bytes[2..])
            }
            _ => Err(CryptoError::UnsupportedKeyType(format!(
                "unknown multicodec prefix in {}",
                encoded
            ))),
        }
    }
}

impl From<PublicKey> for AnyPublicKey {
    fn from(pk: PublicKey) -> Self {
        AnyPublicKey::Ed25519(pk)
    }
}

impl From<Secp256k1PublicKey> for AnyPublicKey {
    fn from(pk: Secp256k1PublicKey) -> Self {
        AnyPublicKey::Secp256k1(pk)
    }
}
