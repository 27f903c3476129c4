use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tessera_core::Did;

use crate::error::IdentityError;
use crate::resolution::MethodResolution;
use crate::resolver::MethodResolver;

const DID_LD_JSON: &str = "application/did+ld+json";

/// HTTP client for a DIF universal resolver
/// (`GET {base}/1.0/identifiers/{did}`).
///
/// Any non-success or empty response resolves to `NoDid`; only transport
/// failures surface as resolution errors.
pub struct UniversalResolver {
    base_url: String,
    http_client: reqwest::Client,
}

impl UniversalResolver {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IdentityError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tessera/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IdentityError::DidResolution {
                did: String::new(),
                cause: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn identifier_url(&self, did: &Did) -> String {
        format!("{}/1.0/identifiers/{}", self.base_url, did)
    }
}

#[async_trait]
impl MethodResolver for UniversalResolver {
    async fn resolve_method(&self, did: &Did) -> Result<MethodResolution, IdentityError> {
        let url = self.identifier_url(did);
        tracing::debug!(did = %did, url = %url, "querying universal resolver");

        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::ACCEPT, DID_LD_JSON)
            .send()
            .await
            .map_err(|e| IdentityError::DidResolution {
                did: did.to_string(),
                cause: format!("universal resolver request failed: {}", e),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IdentityError::DidResolution {
                did: did.to_string(),
                cause: format!("failed to read universal resolver response: {}", e),
            })?;

        if !status.is_success() {
            // DIF resolvers answer 410 Gone with metadata for deactivated DIDs.
            if status == StatusCode::GONE && envelope_deactivated(&body) {
                return Ok(MethodResolution::tombstone());
            }
            tracing::debug!(did = %did, status = %status, "universal resolver has no document");
            return Err(IdentityError::NoDid(did.to_string()));
        }

        if body.trim().is_empty() {
            return Err(IdentityError::NoDid(did.to_string()));
        }
        let value: Value =
            serde_json::from_str(&body).map_err(|e| IdentityError::DidResolution {
                did: did.to_string(),
                cause: format!("invalid universal resolver response: {}", e),
            })?;

        Ok(parse_response(value))
    }
}

fn envelope_deactivated(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .map(|value| matches!(parse_response(value), MethodResolution { deactivated: true, .. }))
        .unwrap_or(false)
}

/// Accept either a resolution envelope or a bare document.
fn parse_response(value: Value) -> MethodResolution {
    let Value::Object(mut obj) = value else {
        return MethodResolution::default();
    };

    if !obj.contains_key("didDocument") {
        return MethodResolution::found(Value::Object(obj));
    }

    let deactivated = obj
        .get("didDocumentMetadata")
        .and_then(|meta| meta.get("deactivated"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let document = match obj.remove("didDocument") {
        Some(Value::Null) | None => None,
        Some(doc) => Some(doc),
    };

    MethodResolution {
        document,
        deactivated,
    }
}
