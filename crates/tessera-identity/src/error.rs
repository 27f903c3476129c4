use tessera_core::CoreError;
use tessera_crypto::CryptoError;

/// Identity-layer errors.
///
/// Resolution outcomes are shared between deduplicated callers, so causes
/// are carried as strings and the type is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("malformed DID: {0}")]
    MalformedDid(String),

    #[error("no DID document found for {0}")]
    NoDid(String),

    #[error("failed to resolve {did}: {cause}")]
    DidResolution { did: String, cause: String },

    #[error("resolver capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("no resolver available for DID method '{0}'")]
    UnsupportedMethod(String),

    #[error("verification method not found: {0}")]
    VerificationMethodNotFound(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("invalid DID document: {0}")]
    InvalidDocument(String),

    #[error("duplicate DID: {0}")]
    DuplicateDid(String),
}

impl IdentityError {
    /// Wrap a resolver-level failure for `did`, letting `NoDid`,
    /// `MalformedDid` and already wrapped errors through unchanged.
    pub fn resolution(did: &str, err: IdentityError) -> Self {
        match err {
            IdentityError::NoDid(_)
            | IdentityError::MalformedDid(_)
            | IdentityError::DidResolution { .. } => err,
            other => IdentityError::DidResolution {
                did: did.to_string(),
                cause: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for IdentityError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedDid(msg) => IdentityError::MalformedDid(msg),
            other => IdentityError::InvalidDocument(other.to_string()),
        }
    }
}

impl From<CryptoError> for IdentityError {
    fn from(err: CryptoError) -> Self {
        IdentityError::InvalidKey(err.to_string())
    }
}
