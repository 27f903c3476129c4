use tessera_crypto::CryptoError;
use tessera_identity::IdentityError;

/// Proof creation and verification errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofError {
    #[error("document has no proof")]
    MissingProof,

    #[error("invalid proof: {0}")]
    InvalidProof(String),

    #[error("unsupported proof suite: {0}")]
    UnsupportedSuite(String),

    #[error("proof purpose mismatch: {0}")]
    PurposeMismatch(String),

    #[error("presentation requires a challenge or an explicit proof purpose")]
    MissingChallenge,

    #[error("key type {key} cannot be used with {suite}")]
    KeyMismatch { key: String, suite: String },

    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}
