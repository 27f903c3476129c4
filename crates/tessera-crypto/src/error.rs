/// Cryptographic errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
}
