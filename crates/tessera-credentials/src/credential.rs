//! Verifiable credential builder and structural checks.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tessera_status::StatusList2021Entry;
use uuid::Uuid;

use crate::error::CredentialError;

/// The context every credential and presentation must list first.
pub const BASE_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const CREDENTIAL_TYPE: &str = "VerifiableCredential";
pub const JSON_SCHEMA_VALIDATOR_2018: &str = "JsonSchemaValidator2018";

/// An unsigned credential under construction.
///
/// Sign it with [`CredentialIssuer::issue`](crate::CredentialIssuer::issue);
/// verification always works on the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<Value>,
    pub id: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    pub issuance_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    pub credential_subject: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerifiableCredential {
    /// A credential with the base context and type, issued now.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            context: vec![Value::String(BASE_CONTEXT.to_string())],
            id: id.into(),
            types: vec![CREDENTIAL_TYPE.to_string()],
            issuer: None,
            issuance_date: timestamp(Utc::now()),
            expiration_date: None,
            credential_subject: Value::Object(Map::new()),
            credential_status: None,
            credential_schema: None,
            extra: Map::new(),
        }
    }

    /// A credential identified by a fresh `urn:uuid:` id.
    pub fn with_random_id() -> Self {
        Self::new(format!("urn:uuid:{}", Uuid::now_v7()))
    }

    pub fn add_context(mut self, context: impl Into<Value>) -> Self {
        let context = context.into();
        if !self.context.contains(&context) {
            self.context.push(context);
        }
        self
    }

    pub fn add_type(mut self, credential_type: impl Into<String>) -> Self {
        let credential_type = credential_type.into();
        if !self.types.contains(&credential_type) {
            self.types.push(credential_type);
        }
        self
    }

    pub fn set_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn set_subject(mut self, subject: Value) -> Self {
        self.credential_subject = subject;
        self
    }

    /// Add a subject, turning a single subject into an array.
    pub fn add_subject(mut self, subject: Value) -> Self {
        self.credential_subject = match std::mem::take(&mut self.credential_subject) {
            Value::Object(existing) if existing.is_empty() => subject,
            Value::Array(mut subjects) => {
                subjects.push(subject);
                Value::Array(subjects)
            }
            existing => Value::Array(vec![existing, subject]),
        };
        self
    }

    pub fn set_status(mut self, entry: &StatusList2021Entry) -> Self {
        self.credential_status = Some(entry.to_json());
        self
    }

    /// Reference a JSON schema the subject must conform to.
    pub fn set_schema(mut self, schema_id: impl Into<String>) -> Self {
        let mut schema = Map::new();
        schema.insert("id".into(), Value::String(schema_id.into()));
        schema.insert(
            "type".into(),
            Value::String(JSON_SCHEMA_VALIDATOR_2018.to_string()),
        );
        self.credential_schema = Some(Value::Object(schema));
        self
    }

    pub fn set_issuance_date(mut self, date: DateTime<Utc>) -> Self {
        self.issuance_date = timestamp(date);
        self
    }

    pub fn set_expiration_date(mut self, date: DateTime<Utc>) -> Self {
        self.expiration_date = Some(timestamp(date));
        self
    }

    pub fn to_json(&self) -> Result<Value, CredentialError> {
        serde_json::to_value(self).map_err(|e| CredentialError::Malformed(e.to_string()))
    }
}

/// Structural checks run before a credential is signed or verified.
pub fn check_credential(credential: &Value) -> Result<(), CredentialError> {
    check_context(credential)?;
    if !values_of(credential, "type").iter().any(|t| t == CREDENTIAL_TYPE) {
        return Err(CredentialError::InvalidType(format!(
            "\"type\" must include \"{}\"",
            CREDENTIAL_TYPE
        )));
    }
    if credential.get("credentialSubject").is_none() {
        return Err(CredentialError::Malformed(
            "\"credentialSubject\" is required".into(),
        ));
    }
    Ok(())
}

/// `@context` may be a single string or an array; either way the base
/// context must come first.
pub(crate) fn check_context(document: &Value) -> Result<(), CredentialError> {
    let first = match document.get("@context") {
        Some(Value::Array(contexts)) => contexts.first(),
        other => other,
    };
    if first.and_then(Value::as_str) != Some(BASE_CONTEXT) {
        return Err(CredentialError::InvalidContext(format!(
            "\"{}\" needs to be first in the list of contexts",
            BASE_CONTEXT
        )));
    }
    Ok(())
}

/// String values of a property given as a string or an array of strings.
pub(crate) fn values_of(document: &Value, key: &str) -> Vec<String> {
    match document.get(key) {
        Some(Value::String(value)) => vec![value.clone()],
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// The issuer id, from either `"issuer": "did:..."` or `"issuer": {"id": ...}`.
pub(crate) fn issuer_of(credential: &Value) -> Option<&str> {
    match credential.get("issuer")? {
        Value::String(id) => Some(id),
        Value::Object(obj) => obj.get("id").and_then(Value::as_str),
        _ => None,
    }
}

fn timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_status::StatusPurpose;

    #[test]
    fn test_builder_defaults() {
        let vc = VerifiableCredential::new("urn:credential:1").to_json().unwrap();
        assert_eq!(vc["@context"], json!([BASE_CONTEXT]));
        assert_eq!(vc["type"], json!(["VerifiableCredential"]));
        assert!(vc["issuanceDate"].as_str().unwrap().ends_with('Z'));
        assert!(vc.get("issuer").is_none());
        assert!(check_credential(&vc).is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let entry = StatusList2021Entry::new("urn:list", 3, StatusPurpose::Revocation);
        let vc = VerifiableCredential::with_random_id()
            .add_context("https://www.w3.org/2018/credentials/examples/v1")
            .add_type("AlumniCredential")
            .add_type("AlumniCredential")
            .set_issuer("did:example:university")
            .set_subject(json!({"id": "did:example:alice", "alumniOf": "Example University"}))
            .set_status(&entry)
            .set_schema("https://schemas.example/alumni.json")
            .to_json()
            .unwrap();

        assert!(vc["id"].as_str().unwrap().starts_with("urn:uuid:"));
        assert_eq!(vc["type"], json!(["VerifiableCredential", "AlumniCredential"]));
        assert_eq!(vc["issuer"], "did:example:university");
        assert_eq!(vc["credentialStatus"]["statusListIndex"], "3");
        assert_eq!(vc["credentialSchema"]["type"], JSON_SCHEMA_VALIDATOR_2018);
    }

    #[test]
    fn test_add_subject() {
        let vc = VerifiableCredential::new("urn:c")
            .add_subject(json!({"id": "did:example:a"}))
            .add_subject(json!({"id": "did:example:b"}));
        assert_eq!(vc.credential_subject.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_check_context() {
        assert!(check_context(&json!({"@context": BASE_CONTEXT})).is_ok());
        assert!(matches!(
            check_context(&json!({"@context": ["https://example.com/v1", BASE_CONTEXT]})),
            Err(CredentialError::InvalidContext(_))
        ));
        assert!(check_context(&json!({})).is_err());
    }

    #[test]
    fn test_check_credential_type() {
        let vc = json!({
            "@context": [BASE_CONTEXT],
            "type": "VerifiablePresentation",
            "credentialSubject": {},
        });
        assert!(matches!(
            check_credential(&vc),
            Err(CredentialError::InvalidType(_))
        ));
    }

    #[test]
    fn test_issuer_shapes() {
        assert_eq!(issuer_of(&json!({"issuer": "did:example:a"})), Some("did:example:a"));
        assert_eq!(
            issuer_of(&json!({"issuer": {"id": "did:example:b", "name": "B"}})),
            Some("did:example:b")
        );
        assert_eq!(issuer_of(&json!({})), None);
    }
}
