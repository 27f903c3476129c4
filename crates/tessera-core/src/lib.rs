//! Tessera Core: Fundamental types, configuration and async primitives
//! shared by the resolution, status and verification layers.

pub mod config;
pub mod error;
pub mod memoized;
pub mod retry;
pub mod types;

pub use config::TesseraConfig;
pub use error::CoreError;
pub use memoized::{CallError, MemoizedCallMap};
pub use retry::{timeout, Next, Retry, RetryError, RetryOptions};
pub use types::Did;
