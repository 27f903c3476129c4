//! The credential and presentation verification pipeline.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tessera_core::config::VerificationConfig;
use tessera_identity::DidResolver;
use tessera_proof::{verify_document, DocumentVerification, ProofError, ProofPurpose, ProofResult, SuiteRegistry};

use crate::credential::{check_credential, issuer_of};
use crate::error::CredentialError;
use crate::presentation::{check_presentation, credentials_of};
use crate::revocation::RevocationChecker;
use crate::schema::{schema_id, validate_subject, SchemaLoader};

pub const CHECK_PROOF_VALID: &str = "proof_valid";
pub const CHECK_NOT_EXPIRED: &str = "not_expired";
pub const CHECK_STATUS_VALID: &str = "status_valid";
pub const CHECK_SCHEMA_VALID: &str = "schema_valid";

/// Verification policy of a [`CredentialVerifier`], usually built from the
/// `[verification]` config section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Check every recognized `credentialStatus` and fail credentials whose
    /// status cannot be checked. When off, status entries are ignored.
    pub force_revocation_check: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            force_revocation_check: true,
        }
    }
}

impl From<&VerificationConfig> for VerifierConfig {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            force_revocation_check: config.force_revocation_check,
        }
    }
}

/// An individual verification check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCheck {
    /// One of the `CHECK_*` names, e.g. `status_valid`.
    pub name: String,
    pub passed: bool,
    /// Why the check failed; `None` when it passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl VerificationCheck {
    fn from_outcome(name: &str, outcome: Result<(), String>) -> Self {
        Self {
            name: name.to_string(),
            passed: outcome.is_ok(),
            detail: outcome.err(),
        }
    }
}

/// Outcome of verifying one credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialVerification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    pub verified: bool,
    pub checks: Vec<VerificationCheck>,
    /// Per-proof results of the credential's own proof.
    pub results: Vec<ProofResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CredentialVerification {
    fn rejected(credential_id: Option<String>, err: CredentialError) -> Self {
        Self {
            credential_id,
            verified: false,
            checks: Vec::new(),
            results: Vec::new(),
            error: Some(err.to_string()),
        }
    }

    pub fn check(&self, name: &str) -> Option<&VerificationCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// Outcome of verifying a presentation and its credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationVerification {
    pub verified: bool,
    /// Per-proof results of the presentation proof; empty when not evaluated.
    pub results: Vec<ProofResult>,
    pub credential_results: Vec<CredentialVerification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_result: Option<DocumentVerification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How a presentation proof is checked.
#[derive(Debug, Clone, Default)]
pub struct PresentationOptions {
    pub challenge: Option<String>,
    pub domain: Option<String>,
    /// Expected controller of the signing key; defaults to the `holder`.
    pub controller: Option<String>,
    /// Overrides the `authentication` purpose built from the fields above.
    pub purpose: Option<ProofPurpose>,
    /// Skip the presentation proof and verify only the credentials.
    pub unsigned: bool,
}

impl PresentationOptions {
    pub fn with_challenge(challenge: impl Into<String>) -> Self {
        Self {
            challenge: Some(challenge.into()),
            ..Self::default()
        }
    }

    pub fn unsigned() -> Self {
        Self {
            unsigned: true,
            ..Self::default()
        }
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    fn proof_purpose(&self, presentation: &Value) -> Result<ProofPurpose, ProofError> {
        if let Some(purpose) = &self.purpose {
            return Ok(purpose.clone());
        }
        if self.challenge.is_none() {
            return Err(ProofError::MissingChallenge);
        }
        let controller = self.controller.clone().or_else(|| {
            presentation
                .get("holder")
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        Ok(ProofPurpose::Authentication {
            challenge: self.challenge.clone(),
            domain: self.domain.clone(),
            controller,
        })
    }
}

/// Verifies credentials and presentations.
///
/// Signer keys come from the resolver. Status and schema checks need a
/// [`RevocationChecker`] and a [`SchemaLoader`]; a credential that references
/// a status list or schema fails when the corresponding collaborator is
/// missing.
pub struct CredentialVerifier {
    resolver: Arc<dyn DidResolver>,
    suites: SuiteRegistry,
    config: VerifierConfig,
    revocation: Option<RevocationChecker>,
    schemas: Option<Arc<dyn SchemaLoader>>,
}

impl CredentialVerifier {
    pub fn new(resolver: Arc<dyn DidResolver>) -> Self {
        Self {
            resolver,
            suites: SuiteRegistry::with_defaults(),
            config: VerifierConfig::default(),
            revocation: None,
            schemas: None,
        }
    }

    pub fn with_suites(mut self, suites: SuiteRegistry) -> Self {
        self.suites = suites;
        self
    }

    pub fn with_config(mut self, config: VerifierConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_revocation(mut self, checker: RevocationChecker) -> Self {
        self.revocation = Some(checker);
        self
    }

    pub fn with_schema_loader(mut self, loader: Arc<dyn SchemaLoader>) -> Self {
        self.schemas = Some(loader);
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify one credential. Every check runs; the credential verifies
    /// when all of them pass.
    pub async fn verify_credential(&self, credential: &Value) -> CredentialVerification {
        let credential_id = credential
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Err(err) = check_credential(credential) {
            return CredentialVerification::rejected(credential_id, err);
        }
        let Some(issuer) = issuer_of(credential) else {
            return CredentialVerification::rejected(
                credential_id,
                CredentialError::Malformed("\"issuer\" is required".into()),
            );
        };

        let purpose = ProofPurpose::AssertionMethod {
            controller: Some(issuer.to_string()),
        };
        let (proof, status, schema) = futures::join!(
            verify_document(credential, &purpose, self.resolver.as_ref(), &self.suites),
            self.check_status(credential, issuer),
            self.check_schema(credential),
        );

        let proof_outcome = if proof.verified {
            Ok(())
        } else {
            Err(proof.error.clone().unwrap_or_else(|| "proof not verified".into()))
        };
        let checks = vec![
            VerificationCheck::from_outcome(CHECK_PROOF_VALID, proof_outcome),
            VerificationCheck::from_outcome(CHECK_NOT_EXPIRED, check_expiry(credential)),
            VerificationCheck::from_outcome(CHECK_STATUS_VALID, status),
            VerificationCheck::from_outcome(CHECK_SCHEMA_VALID, schema),
        ];

        let verified = checks.iter().all(|c| c.passed);
        let error = checks
            .iter()
            .find(|c| !c.passed)
            .map(|c| format!("{}: {}", c.name, c.detail.clone().unwrap_or_default()));
        if let Some(error) = &error {
            tracing::warn!(
                credential_id = credential_id.as_deref().unwrap_or_default(),
                issuer,
                error = %error,
                "credential failed verification"
            );
        }

        CredentialVerification {
            credential_id,
            verified,
            checks,
            results: proof.results,
            error,
        }
    }

    /// Verify a presentation: structure, then every embedded credential
    /// concurrently, then the presentation proof.
    ///
    /// Fails outright only on a malformed presentation. A signed presentation
    /// checked without a challenge or explicit purpose still reports its
    /// credential results, with the presentation unverified.
    pub async fn verify_presentation(
        &self,
        presentation: &Value,
        options: &PresentationOptions,
    ) -> Result<PresentationVerification, CredentialError> {
        check_presentation(presentation)?;

        let credentials = credentials_of(presentation);
        let credential_results =
            join_all(credentials.iter().map(|c| self.verify_credential(c))).await;

        let failed = credential_results.iter().find(|r| !r.verified).map(|r| {
            format!(
                "credential {} failed: {}",
                r.credential_id.as_deref().unwrap_or("<no id>"),
                r.error.as_deref().unwrap_or_default()
            )
        });
        let error = match failed {
            Some(failed) => Some(failed),
            None if options.unsigned => None,
            None => match options.proof_purpose(presentation) {
                Ok(purpose) => {
                    let report = self
                        .check_presentation_proof(presentation, &purpose, credential_results)
                        .await;
                    return Ok(report);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "presentation proof not checked");
                    Some(err.to_string())
                }
            },
        };
        Ok(PresentationVerification {
            verified: error.is_none(),
            results: Vec::new(),
            credential_results,
            presentation_result: None,
            error,
        })
    }

    async fn check_presentation_proof(
        &self,
        presentation: &Value,
        purpose: &ProofPurpose,
        credential_results: Vec<CredentialVerification>,
    ) -> PresentationVerification {
        let presentation_result =
            verify_document(presentation, purpose, self.resolver.as_ref(), &self.suites).await;
        if !presentation_result.verified {
            tracing::warn!(
                error = presentation_result.error.as_deref().unwrap_or_default(),
                "presentation proof failed verification"
            );
        }
        PresentationVerification {
            verified: presentation_result.verified,
            results: presentation_result.results.clone(),
            credential_results,
            error: presentation_result.error.clone(),
            presentation_result: Some(presentation_result),
        }
    }

    async fn check_status(&self, credential: &Value, issuer: &str) -> Result<(), String> {
        let Some(status) = credential.get("credentialStatus") else {
            return Ok(());
        };
        if !self.config.force_revocation_check {
            return Ok(());
        }
        if !RevocationChecker::supports(status) {
            return Err(format!(
                "unsupported credentialStatus type {}",
                status.get("type").map(Value::to_string).unwrap_or_default()
            ));
        }
        let Some(checker) = &self.revocation else {
            return Err("no status list source configured".into());
        };

        match checker
            .is_revoked(status, issuer, self.resolver.as_ref())
            .await
        {
            Ok(false) => Ok(()),
            Ok(true) => match status.get("statusPurpose").and_then(Value::as_str) {
                Some("suspension") => Err("credential is suspended".into()),
                _ => Err("credential is revoked".into()),
            },
            Err(err) => Err(err.to_string()),
        }
    }

    async fn check_schema(&self, credential: &Value) -> Result<(), String> {
        let id = match schema_id(credential) {
            None => return Ok(()),
            Some(id) => id.map_err(|e| e.to_string())?,
        };
        let Some(loader) = &self.schemas else {
            return Err(format!("no schema loader configured for {}", id));
        };
        let schema = loader.load(id).await.map_err(|e| e.to_string())?;
        let subject = credential.get("credentialSubject").unwrap_or(&Value::Null);
        validate_subject(&schema, subject).map_err(|e| e.to_string())
    }
}

fn check_expiry(credential: &Value) -> Result<(), String> {
    match credential.get("expirationDate") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(date)) => {
            let expires = DateTime::parse_from_rfc3339(date)
                .map_err(|e| format!("invalid expirationDate {}: {}", date, e))?;
            if expires < Utc::now() {
                Err(format!("credential expired at {}", date))
            } else {
                Ok(())
            }
        }
        Some(_) => Err("expirationDate must be a string".into()),
    }
}
