use tessera_identity::IdentityError;
use tessera_proof::ProofError;
use tessera_status::StatusError;

/// Credential and presentation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CredentialError {
    #[error("invalid context: {0}")]
    InvalidContext(String),

    #[error("invalid type: {0}")]
    InvalidType(String),

    #[error("malformed credential: {0}")]
    Malformed(String),

    #[error("issuance failed: {0}")]
    IssuanceFailed(String),

    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("credential subject does not match schema: {0}")]
    SchemaViolation(String),

    #[error("status check failed: {0}")]
    StatusCheck(String),

    #[error("proof error: {0}")]
    Proof(#[from] ProofError),

    #[error("status error: {0}")]
    Status(#[from] StatusError),

    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
}
