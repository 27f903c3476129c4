//! Tessera Credentials: building, issuing and verifying credentials and
//! presentations.
//!
//! Verification resolves signer keys through a [`DidResolver`], checks
//! StatusList2021 revocation and JSON Schema conformance, and reports every
//! check per credential.
//!
//! [`DidResolver`]: tessera_identity::DidResolver

pub mod credential;
pub mod error;
pub mod issuer;
pub mod presentation;
pub mod revocation;
pub mod schema;
pub mod verifier;

pub use credential::{VerifiableCredential, BASE_CONTEXT};
pub use error::CredentialError;
pub use issuer::CredentialIssuer;
pub use presentation::VerifiablePresentation;
pub use revocation::RevocationChecker;
pub use schema::{HttpSchemaLoader, InMemorySchemaLoader, SchemaLoader};
pub use verifier::{
    CredentialVerification, CredentialVerifier, PresentationOptions, PresentationVerification,
    VerificationCheck, VerifierConfig,
};
