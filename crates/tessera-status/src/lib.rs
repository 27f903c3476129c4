//! Tessera Status: bit-per-credential revocation and suspension lists.
//!
//! Provides:
//! - The StatusList2021 bitstring codec (gzip + base64url)
//! - `StatusList2021Credential`, the signed container of a bitstring
//! - `StatusList2021Entry`, the reference a credential carries
//! - A registry with atomic batch updates and cached decoding
//! - Status list sources for fetching containers by id

pub mod bitstring;
pub mod credential;
pub mod entry;
pub mod error;
pub mod registry;
pub mod source;

pub use bitstring::StatusList;
pub use credential::{StatusList2021Credential, StatusListOptions, StatusPurpose};
pub use entry::StatusList2021Entry;
pub use error::StatusError;
pub use registry::StatusListRegistry;
pub use source::{InMemoryStatusListStore, StatusListSource};
