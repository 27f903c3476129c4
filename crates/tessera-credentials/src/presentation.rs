use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::credential::{check_context, values_of, BASE_CONTEXT};
use crate::error::CredentialError;

pub const PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// An unsigned presentation under construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiablePresentation {
    #[serde(rename = "@context")]
    pub context: Vec<Value>,
    pub id: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(default)]
    pub verifiable_credential: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerifiablePresentation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            context: vec![Value::String(BASE_CONTEXT.to_string())],
            id: id.into(),
            types: vec![PRESENTATION_TYPE.to_string()],
            holder: None,
            verifiable_credential: Vec::new(),
            extra: Map::new(),
        }
    }

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

    pub fn add_type(mut self, presentation_type: impl Into<String>) -> Self {
        let presentation_type = presentation_type.into();
        if !self.types.contains(&presentation_type) {
            self.types.push(presentation_type);
        }
        self
    }

    pub fn set_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = Some(holder.into());
        self
    }

    /// Embed a signed credential.
    pub fn add_credential(mut self, credential: Value) -> Self {
        self.verifiable_credential.push(credential);
        self
    }

    pub fn to_json(&self) -> Result<Value, CredentialError> {
        serde_json::to_value(self).map_err(|e| CredentialError::Malformed(e.to_string()))
    }
}

/// Base context first and `VerifiablePresentation` among the types.
pub fn check_presentation(presentation: &Value) -> Result<(), CredentialError> {
    check_context(presentation)?;
    if !values_of(presentation, "type")
        .iter()
        .any(|t| t == PRESENTATION_TYPE)
    {
        return Err(CredentialError::InvalidType(format!(
            "\"type\" must include \"{}\"",
            PRESENTATION_TYPE
        )));
    }
    Ok(())
}

/// Embedded credentials, whether given as one object or an array.
pub(crate) fn credentials_of(presentation: &Value) -> Vec<Value> {
    match presentation.get("verifiableCredential") {
        Some(Value::Array(credentials)) => credentials.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(credential) => vec![credential.clone()],
    }
}
