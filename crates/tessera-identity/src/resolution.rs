use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_core::Did;

use crate::document::DidDocument;
use crate::error::IdentityError;

/// Resolution metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionMetadata {
    /// The DID has been deactivated (tombstoned) by its controller.
    #[serde(default)]
    pub deactivated: bool,
}

/// Outcome of resolving a DID.
///
/// A deactivated result never carries a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub did: Did,
    pub document: Option<DidDocument>,
    pub metadata: ResolutionMetadata,
}

impl ResolutionResult {
    pub fn active(document: DidDocument) -> Self {
        Self {
            did: document.id.clone(),
            document: Some(document),
            metadata: ResolutionMetadata::default(),
        }
    }

    pub fn deactivated(did: Did) -> Self {
        Self {
            did,
            document: None,
            metadata: ResolutionMetadata { deactivated: true },
        }
    }

    pub fn is_deactivated(&self) -> bool {
        self.metadata.deactivated
    }

    /// The document, unless the DID is deactivated or has none.
    pub fn into_active_document(self) -> Result<DidDocument, IdentityError> {
        match self.document {
            Some(document) if !self.metadata.deactivated => Ok(document),
            _ => Err(IdentityError::NoDid(self.did.to_string())),
        }
    }
}

/// Raw output of a method resolver, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodResolution {
    pub document: Option<Value>,
    pub deactivated: bool,
}

impl MethodResolution {
    pub fn found(document: Value) -> Self {
        Self {
            document: Some(document),
            deactivated: false,
        }
    }

    pub fn tombstone() -> Self {
        Self {
            document: None,
            deactivated: true,
        }
    }

    /// Normalize into a [`ResolutionResult`] for `did`.
    ///
    /// Tombstones are recognized from the metadata flag or a
    /// `deactivated: true` field on the document itself.
    pub fn normalize(self, did: &Did) -> Result<ResolutionResult, IdentityError> {
        let flagged = self
            .document
            .as_ref()
            .and_then(|doc| doc.get("deactivated"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if self.deactivated || flagged {
            return Ok(ResolutionResult::deactivated(did.clone()));
        }

        let value = self
            .document
            .ok_or_else(|| IdentityError::NoDid(did.to_string()))?;
        let document = DidDocument::from_json(&value)?;
        if document.id != *did {
            return Err(IdentityError::InvalidDocument(format!(
                "resolved document id {} does not match {}",
                document.id, did
            )));
        }
        Ok(ResolutionResult::active(document))
    }
}
