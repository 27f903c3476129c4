//! Tessera Proof: linked-data proofs over JSON documents.
//!
//! Provides:
//! - Proof purposes (`assertionMethod`, `authentication`)
//! - Key documents binding a key pair to a verification method id
//! - Signature suites (Ed25519Signature2018/2020, EcdsaSecp256k1Signature2019)
//! - Document signing and verification against resolved DID documents

pub mod document;
pub mod error;
pub mod key_doc;
pub mod proof;
pub mod purpose;
pub mod registry;
pub mod suite;

pub use document::{sign_document, verify_document, DocumentVerification, ProofResult};
pub use error::ProofError;
pub use key_doc::KeyDoc;
pub use proof::Proof;
pub use purpose::ProofPurpose;
pub use registry::SuiteRegistry;
pub use suite::{ProofSuite, ProofVerification, SignatureSuite};
