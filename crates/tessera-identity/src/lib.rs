//! Tessera Identity Layer
//!
//! Resolves DIDs to normalized DID documents:
//! - DID document model and normalization of resolver-specific shapes
//! - Method resolvers (`did:key`, `did:jwk`, in-memory store, HTTP universal resolver)
//! - A registry routing DIDs to method resolvers with in-flight deduplication
//! - An optional caller-side cache and a resolver for replaced DID prefixes

pub mod cache;
pub mod did_jwk;
pub mod did_key;
pub mod document;
pub mod error;
pub mod registry;
pub mod replacement;
pub mod resolution;
pub mod resolver;
pub mod store;
pub mod universal;

pub use cache::CachingDidResolver;
pub use did_jwk::DidJwkResolver;
pub use did_key::DidKeyResolver;
pub use document::{DidDocument, Relationship, VerificationMethod};
pub use error::IdentityError;
pub use registry::MethodResolverRegistry;
pub use replacement::DidReplacementResolver;
pub use resolution::{MethodResolution, ResolutionMetadata, ResolutionResult};
pub use resolver::{resolve_verification_method, DidResolver, MethodResolver};
pub use store::DidStore;
pub use universal::UniversalResolver;
