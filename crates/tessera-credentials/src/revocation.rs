//! Revocation status of credentials carrying a `credentialStatus` entry.

use serde_json::Value;
use std::sync::Arc;
use tessera_identity::DidResolver;
use tessera_proof::{verify_document, ProofPurpose};
use tessera_status::{StatusList2021Entry, StatusListRegistry, StatusListSource};

use crate::error::CredentialError;

/// Looks up StatusList2021 entries in containers fetched from a source.
///
/// A container is trusted only when its own proof verifies and its issuer is
/// the issuer of the credential being checked.
#[derive(Clone)]
pub struct RevocationChecker {
    source: Arc<dyn StatusListSource>,
    registry: Arc<StatusListRegistry>,
}

impl RevocationChecker {
    /// Check statuses against containers from `source`, decoding them through
    /// the shared `registry` cache.
    pub fn new(source: Arc<dyn StatusListSource>, registry: Arc<StatusListRegistry>) -> Self {
        Self { source, registry }
    }

    /// Whether a status type is one this checker understands.
    pub fn supports(status: &Value) -> bool {
        StatusList2021Entry::is_entry(status)
    }

    /// Whether the credential's status bit is set.
    pub async fn is_revoked(
        &self,
        status: &Value,
        issuer: &str,
        resolver: &dyn DidResolver,
    ) -> Result<bool, CredentialError> {
        let entry = StatusList2021Entry::from_json(status)?;
        let container = self.source.fetch(&entry.status_list_credential).await?;

        if container.issuer_id() != Some(issuer) {
            return Err(CredentialError::StatusCheck(format!(
                "status list {} is not issued by {}",
                container.id, issuer
            )));
        }

        let purpose = ProofPurpose::AssertionMethod {
            controller: Some(issuer.to_string()),
        };
        let verification = verify_document(
            &container.to_json()?,
            &purpose,
            resolver,
            self.registry.suites(),
        )
        .await;
        if !verification.verified {
            return Err(CredentialError::StatusCheck(format!(
                "status list {} failed verification: {}",
                container.id,
                verification.error.unwrap_or_default()
            )));
        }

        let revoked = self.registry.check_entry(&container, &entry)?;
        tracing::debug!(
            list = %container.id,
            index = %entry.status_list_index,
            revoked,
            "status checked"
        );
        Ok(revoked)
    }
}
