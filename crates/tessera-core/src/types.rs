use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Decentralized Identifier.
/// Format: `did:<method>:<method-specific-id>`
///
/// Paths, queries and fragments are not part of the DID itself; use
/// [`Did::from_url`] to strip them from a DID URL such as a verification
/// method id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Parse a DID string, checking the scheme, method and identifier.
    pub fn parse(uri: &str) -> Result<Self, CoreError> {
        let mut parts = uri.splitn(3, ':');
        let scheme = parts.next().unwrap_or_default();
        if scheme != "did" {
            return Err(CoreError::MalformedDid(format!(
                "DID must start with 'did:', got: {}",
                uri
            )));
        }

        let method = parts.next().unwrap_or_default();
        if method.is_empty()
            || !method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(CoreError::MalformedDid(format!(
                "DID method must be non-empty lowercase alphanumeric, got: {}",
                uri
            )));
        }

        let identifier = parts.next().unwrap_or_default();
        if identifier.is_empty() || identifier.ends_with(':') {
            return Err(CoreError::MalformedDid(format!(
                "DID must have format 'did:<method>:<identifier>', got: {}",
                uri
            )));
        }
        if identifier.contains(['#', '?', '/']) {
            return Err(CoreError::MalformedDid(format!(
                "DID must not contain a path, query or fragment, got: {}",
                uri
            )));
        }

        Ok(Self(uri.to_string()))
    }

    /// Parse the DID part of a DID URL (`did:example:123#keys-1`).
    pub fn from_url(url: &str) -> Result<Self, CoreError> {
        let end = url.find(['#', '?', '/']).unwrap_or(url.len());
        Self::parse(&url[..end])
    }

    /// Create a DID from method and identifier components.
    pub fn from_parts(method: &str, identifier: &str) -> Result<Self, CoreError> {
        Self::parse(&format!("did:{}:{}", method, identifier))
    }

    /// Get the full DID URI.
    pub fn uri(&self) -> &str {
        &self.0
    }

    /// The method segment (`key`, `web`, `cheqd`, ...).
    pub fn method(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }

    /// Everything after the method segment.
    pub fn identifier(&self) -> &str {
        self.0.splitn(3, ':').nth(2).unwrap_or_default()
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
