use tessera_proof::ProofError;

/// Status list errors. Every variant is raised before any bit is changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("cannot unsuspend indices of a list with statusPurpose `{0}`, only `suspension` lists allow it")]
    UnsuspendNotAllowed(String),

    #[error("index {0} appears in both revoke and unsuspend sets")]
    ConflictingIndex(usize),

    #[error("index {index} is out of range for a status list of length {length}")]
    IndexOutOfRange { index: usize, length: usize },

    #[error("invalid status list credential: {0}")]
    InvalidStatusListContainer(String),

    #[error("invalid status entry: {0}")]
    InvalidStatusEntry(String),

    #[error("status list encoding error: {0}")]
    Encoding(String),

    #[error("status list not found: {0}")]
    NotFound(String),

    #[error("proof error: {0}")]
    Proof(#[from] ProofError),
}
