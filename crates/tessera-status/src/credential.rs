//! The signed StatusList2021 container.

use chrono::{SecondsFormat, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;
use tessera_proof::{sign_document, KeyDoc, ProofPurpose, SuiteRegistry};

use crate::bitstring::StatusList;
use crate::error::StatusError;

pub const VC_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const STATUS_LIST_2021_CONTEXT: &str = "https://w3id.org/vc/status-list/2021/v1";
pub const STATUS_LIST_2021: &str = "StatusList2021";
pub const STATUS_LIST_2021_CREDENTIAL: &str = "StatusList2021Credential";

/// Default number of entries in a new list.
pub const DEFAULT_LIST_LENGTH: usize = 10_000;

/// What a set bit means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPurpose {
    /// Permanent; bits are never cleared.
    Revocation,
    /// Temporary; bits may be cleared again.
    Suspension,
}

impl StatusPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusPurpose::Revocation => "revocation",
            StatusPurpose::Suspension => "suspension",
        }
    }
}

impl fmt::Display for StatusPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusPurpose {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revocation" => Ok(StatusPurpose::Revocation),
            "suspension" => Ok(StatusPurpose::Suspension),
            other => Err(StatusError::InvalidStatusListContainer(format!(
                "statusPurpose must be `revocation` or `suspension`, got `{}`",
                other
            ))),
        }
    }
}

/// Options for [`StatusList2021Credential::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusListOptions {
    pub status_purpose: StatusPurpose,
    /// Number of entries; [`DEFAULT_LIST_LENGTH`] when unset.
    pub length: Option<usize>,
    /// Indices revoked from the start.
    pub revoke_indices: Vec<usize>,
}

impl Default for StatusListOptions {
    fn default() -> Self {
        Self {
            status_purpose: StatusPurpose::Revocation,
            length: None,
            revoke_indices: Vec::new(),
        }
    }
}

impl StatusListOptions {
    pub fn new(status_purpose: StatusPurpose) -> Self {
        Self {
            status_purpose,
            ..Self::default()
        }
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_revoked(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.revoke_indices.extend(indices);
        self
    }
}

/// `credentialSubject` of a status list container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusListSubject {
    pub id: String,
    #[serde(rename = "type")]
    pub subject_type: String,
    pub status_purpose: StatusPurpose,
    pub encoded_list: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A signed credential carrying an encoded [`StatusList`].
///
/// Fields that JSON-LD allows in several shapes (`@context`, `type`,
/// `issuer`) are kept as given so a parsed container still verifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusList2021Credential {
    #[serde(rename = "@context")]
    pub context: Value,
    pub id: String,
    #[serde(rename = "type")]
    pub types: Value,
    pub issuer: Value,
    pub issuance_date: String,
    pub credential_subject: StatusListSubject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatusList2021Credential {
    /// Build and sign a new container issued by `key.controller`.
    ///
    /// The subject id is `<id>#list`.
    pub fn create(
        key: &KeyDoc,
        id: &str,
        options: StatusListOptions,
        suites: &SuiteRegistry,
    ) -> Result<Self, StatusError> {
        let length = options.length.unwrap_or(DEFAULT_LIST_LENGTH);
        let mut list = StatusList::new(length);
        update_status_list(
            options.status_purpose,
            &mut list,
            &options.revoke_indices,
            &[],
        )?;

        let mut credential = Self {
            context: json!([VC_V1_CONTEXT, STATUS_LIST_2021_CONTEXT]),
            id: id.to_string(),
            types: json!(["VerifiableCredential", STATUS_LIST_2021_CREDENTIAL]),
            issuer: Value::String(key.controller.clone()),
            issuance_date: now(),
            credential_subject: StatusListSubject {
                id: format!("{}#list", id),
                subject_type: STATUS_LIST_2021.to_string(),
                status_purpose: options.status_purpose,
                encoded_list: list.encode()?,
                extra: Map::new(),
            },
            proof: None,
            extra: Map::new(),
        };
        credential.sign(key, suites)?;

        tracing::info!(
            id = %credential.id,
            purpose = %options.status_purpose,
            length = list.len(),
            revoked = options.revoke_indices.len(),
            "status list created"
        );
        Ok(credential)
    }

    /// Replace the proof with a fresh `assertionMethod` proof by `key`.
    pub fn sign(&mut self, key: &KeyDoc, suites: &SuiteRegistry) -> Result<(), StatusError> {
        let signed = sign_document(&self.to_json()?, key, &ProofPurpose::assertion(), suites)?;
        self.proof = signed.get("proof").cloned();
        Ok(())
    }

    /// Return an updated, re-signed copy. `self` is untouched, also on error.
    pub fn update(
        &self,
        key: &KeyDoc,
        revoke: &[usize],
        unsuspend: &[usize],
        suites: &SuiteRegistry,
    ) -> Result<Self, StatusError> {
        let mut list = self.status_list()?;
        update_status_list(self.purpose(), &mut list, revoke, unsuspend)?;

        let mut updated = self.clone();
        updated.credential_subject.encoded_list = list.encode()?;
        updated.proof = None;
        updated.issuance_date = now();
        updated.sign(key, suites)?;
        Ok(updated)
    }

    pub fn purpose(&self) -> StatusPurpose {
        self.credential_subject.status_purpose
    }

    pub fn encoded_list(&self) -> &str {
        &self.credential_subject.encoded_list
    }

    /// The issuer DID, whether `issuer` is a string or an object with an `id`.
    pub fn issuer_id(&self) -> Option<&str> {
        match &self.issuer {
            Value::String(id) => Some(id),
            Value::Object(obj) => obj.get("id").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Decode the bitstring.
    pub fn status_list(&self) -> Result<StatusList, StatusError> {
        StatusList::decode(self.encoded_list())
    }

    /// Structural checks on a container in JSON form.
    pub fn validate(value: &Value) -> Result<(), StatusError> {
        let invalid = |msg: &str| StatusError::InvalidStatusListContainer(msg.to_string());

        let subject = value
            .get("credentialSubject")
            .ok_or_else(|| invalid("`credentialSubject` must be present"))?;
        let purpose = subject
            .get("statusPurpose")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("`credentialSubject.statusPurpose` must be present"))?;
        purpose.parse::<StatusPurpose>()?;

        match subject.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => {}
            _ => return Err(invalid("`credentialSubject.id` must be a non-empty string")),
        }
        if subject.get("type").and_then(Value::as_str) != Some(STATUS_LIST_2021) {
            return Err(invalid("`credentialSubject.type` must be `StatusList2021`"));
        }
        if !subject.get("encodedList").is_some_and(Value::is_string) {
            return Err(invalid("`credentialSubject.encodedList` must be present"));
        }
        Ok(())
    }

    /// Validate and parse a container.
    pub fn from_json(value: &Value) -> Result<Self, StatusError> {
        Self::validate(value)?;
        serde_json::from_value(value.clone())
            .map_err(|e| StatusError::InvalidStatusListContainer(e.to_string()))
    }

    pub fn to_json(&self) -> Result<Value, StatusError> {
        serde_json::to_value(self).map_err(|e| StatusError::Encoding(e.to_string()))
    }

    /// gzip of the JSON form, as stored on a ledger.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StatusError> {
        let json = serde_json::to_vec(self).map_err(|e| StatusError::Encoding(e.to_string()))?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&json)
            .map_err(|e| StatusError::Encoding(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| StatusError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StatusError> {
        let mut json = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut json)
            .map_err(|e| StatusError::Encoding(format!("invalid gzip data: {}", e)))?;
        let value: Value = serde_json::from_slice(&json)
            .map_err(|e| StatusError::InvalidStatusListContainer(e.to_string()))?;
        Self::from_json(&value)
    }
}

/// Apply a batch of changes to `list`, all or nothing.
///
/// Bits in `revoke` are set, then bits in `unsuspend` are cleared. Only
/// suspension lists accept a non-empty `unsuspend`, and no index may appear
/// in both sets.
pub fn update_status_list(
    purpose: StatusPurpose,
    list: &mut StatusList,
    revoke: &[usize],
    unsuspend: &[usize],
) -> Result<(), StatusError> {
    if !unsuspend.is_empty() && purpose != StatusPurpose::Suspension {
        return Err(StatusError::UnsuspendNotAllowed(purpose.to_string()));
    }

    let revoked: HashSet<usize> = revoke.iter().copied().collect();
    if let Some(&index) = unsuspend.iter().find(|i| revoked.contains(i)) {
        return Err(StatusError::ConflictingIndex(index));
    }

    for &index in revoke.iter().chain(unsuspend) {
        list.check_index(index)?;
    }
    for &index in revoke {
        list.set(index, true)?;
    }
    for &index in unsuspend {
        list.set(index, false)?;
    }
    Ok(())
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
