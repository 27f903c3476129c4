//! Credential schemas: loading and subject validation.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CredentialError;

/// Loads a JSON schema document by id.
#[async_trait]
pub trait SchemaLoader: Send + Sync {
    async fn load(&self, id: &str) -> Result<Value, CredentialError>;
}

#[async_trait]
impl<T: SchemaLoader + ?Sized> SchemaLoader for Arc<T> {
    async fn load(&self, id: &str) -> Result<Value, CredentialError> {
        (**self).load(id).await
    }
}

/// Schemas registered up front, keyed by id.
#[derive(Debug, Default)]
pub struct InMemorySchemaLoader {
    schemas: DashMap<String, Value>,
}

impl InMemorySchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` under `id`, after checking it compiles.
    pub fn insert(&self, id: impl Into<String>, schema: Value) -> Result<(), CredentialError> {
        jsonschema::validator_for(&schema)
            .map_err(|e| CredentialError::InvalidSchema(e.to_string()))?;
        self.schemas.insert(id.into(), schema);
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.schemas.len()
    }
}

#[async_trait]
impl SchemaLoader for InMemorySchemaLoader {
    async fn load(&self, id: &str) -> Result<Value, CredentialError> {
        self.schemas
            .get(id)
            .map(|schema| schema.value().clone())
            .ok_or_else(|| CredentialError::SchemaNotFound(id.to_string()))
    }
}

/// Fetches schemas over HTTP(S), treating the schema id as its URL.
/// Fetched schemas are kept for the lifetime of the loader.
pub struct HttpSchemaLoader {
    http_client: reqwest::Client,
    fetched: DashMap<String, Value>,
}

impl HttpSchemaLoader {
    pub fn new(timeout: Duration) -> Result<Self, CredentialError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tessera/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CredentialError::SchemaNotFound(format!("HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            fetched: DashMap::new(),
        })
    }
}

#[async_trait]
impl SchemaLoader for HttpSchemaLoader {
    async fn load(&self, id: &str) -> Result<Value, CredentialError> {
        if let Some(schema) = self.fetched.get(id) {
            return Ok(schema.value().clone());
        }

        tracing::debug!(schema = id, "fetching credential schema");
        let not_found = |cause: String| CredentialError::SchemaNotFound(format!("{}: {}", id, cause));
        let response = self
            .http_client
            .get(id)
            .send()
            .await
            .map_err(|e| not_found(e.to_string()))?;
        if !response.status().is_success() {
            return Err(not_found(format!("HTTP {}", response.status())));
        }
        let schema: Value = response
            .json()
            .await
            .map_err(|e| CredentialError::InvalidSchema(format!("{}: {}", id, e)))?;

        self.fetched.insert(id.to_string(), schema.clone());
        Ok(schema)
    }
}

/// Validate every credential subject against `schema`.
pub fn validate_subject(schema: &Value, subject: &Value) -> Result<(), CredentialError> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| CredentialError::InvalidSchema(e.to_string()))?;

    let subjects = match subject {
        Value::Array(subjects) => subjects.iter().collect(),
        subject => vec![subject],
    };
    for subject in subjects {
        let errors: Vec<String> = validator
            .iter_errors(subject)
            .map(|e| format!("{} at `{}`", e, e.instance_path))
            .collect();
        if !errors.is_empty() {
            return Err(CredentialError::SchemaViolation(errors.join("; ")));
        }
    }
    Ok(())
}

/// The schema id referenced by a credential's `credentialSchema`, if any.
pub(crate) fn schema_id(credential: &Value) -> Option<Result<&str, CredentialError>> {
    let schema = credential.get("credentialSchema")?;
    Some(
        schema
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| CredentialError::Malformed("\"credentialSchema.id\" is required".into())),
    )
}
