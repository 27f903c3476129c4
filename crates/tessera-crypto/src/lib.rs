//! Tessera Crypto: key pairs, signatures and the hashing/canonicalization
//! used to build proof verification data.

pub mod ed25519;
pub mod encoding;
pub mod error;
pub mod hashing;
pub mod keys;
pub mod secp256k1;

pub use ed25519::{KeyPair, PublicKey};
pub use encoding::{multibase_decode, multibase_encode};
pub use error::CryptoError;
pub use hashing::{canonical_hash, canonicalize, sha256, Hash};
pub use keys::{AnyKeyPair, AnyPublicKey, KeyType};
pub use secp256k1::{Secp256k1KeyPair, Secp256k1PublicKey};
