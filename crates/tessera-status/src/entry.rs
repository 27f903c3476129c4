use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credential::StatusPurpose;
use crate::error::StatusError;

pub const STATUS_LIST_2021_ENTRY: &str = "StatusList2021Entry";

/// The `credentialStatus` of a credential tracked in a status list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusList2021Entry {
    pub id: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub status_purpose: StatusPurpose,
    /// Decimal index into the list.
    pub status_list_index: String,
    /// Id of the status list container.
    pub status_list_credential: String,
}

impl StatusList2021Entry {
    /// Entry for `index` in the list `list_id`, with id `<list_id>#<index>`.
    pub fn new(list_id: &str, index: usize, purpose: StatusPurpose) -> Self {
        Self {
            id: format!("{}#{}", list_id, index),
            entry_type: STATUS_LIST_2021_ENTRY.to_string(),
            status_purpose: purpose,
            status_list_index: index.to_string(),
            status_list_credential: list_id.to_string(),
        }
    }

    /// Whether a `credentialStatus` value declares this entry type.
    pub fn is_entry(value: &Value) -> bool {
        value.get("type").and_then(Value::as_str) == Some(STATUS_LIST_2021_ENTRY)
    }

    /// Parse a `credentialStatus` value. A numeric `statusListIndex` is
    /// accepted as well as the decimal string form.
    pub fn from_json(value: &Value) -> Result<Self, StatusError> {
        if !Self::is_entry(value) {
            let found = value.get("type").map(Value::to_string).unwrap_or_default();
            return Err(StatusError::InvalidStatusEntry(format!(
                "unsupported status type {}",
                found
            )));
        }

        let mut value = value.clone();
        if let Some(index) = value.get("statusListIndex").and_then(Value::as_u64) {
            value["statusListIndex"] = Value::String(index.to_string());
        }
        let entry: Self = serde_json::from_value(value)
            .map_err(|e| StatusError::InvalidStatusEntry(e.to_string()))?;
        entry.index()?;
        Ok(entry)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn index(&self) -> Result<usize, StatusError> {
        self.status_list_index.parse().map_err(|_| {
            StatusError::InvalidStatusEntry(format!(
                "statusListIndex `{}` is not a decimal index",
                self.status_list_index
            ))
        })
    }
}
