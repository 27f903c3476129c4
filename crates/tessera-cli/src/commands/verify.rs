//! `tessera verify`: Verify a credential or presentation.

use anyhow::Context;
use clap::Args;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tessera_core::TesseraConfig;
use tessera_credentials::{
    CredentialVerifier, HttpSchemaLoader, InMemorySchemaLoader, PresentationOptions,
    RevocationChecker, SchemaLoader, VerifierConfig,
};
use tessera_proof::SuiteRegistry;
use tessera_status::{InMemoryStatusListStore, StatusList2021Credential, StatusListRegistry};

use super::read_json;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Credential file.
    #[arg(long, conflicts_with = "presentation", required_unless_present = "presentation")]
    pub credential: Option<PathBuf>,

    /// Presentation file.
    #[arg(long)]
    pub presentation: Option<PathBuf>,

    /// Challenge the presentation proof must carry.
    #[arg(long)]
    pub challenge: Option<String>,

    /// Domain the presentation proof must carry.
    #[arg(long)]
    pub domain: Option<String>,

    /// Verify only the embedded credentials of an unsigned presentation.
    #[arg(long)]
    pub unsigned: bool,

    /// Status list credential files to check statuses against.
    #[arg(long = "status-list")]
    pub status_lists: Vec<PathBuf>,

    /// Local schema as `<schema id>=<file>`; without any, schemas are fetched over HTTP.
    #[arg(long = "schema", value_name = "ID=FILE")]
    pub schemas: Vec<String>,

    /// Do not fail credentials whose status cannot be checked.
    #[arg(long)]
    pub skip_revocation_check: bool,
}

pub async fn run(args: &VerifyArgs, config: &TesseraConfig) -> anyhow::Result<()> {
    let report = verify(args, config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report["verified"] != Value::Bool(true) {
        anyhow::bail!("verification failed");
    }
    Ok(())
}

/// Run the verification and return the report as JSON.
pub async fn verify(args: &VerifyArgs, config: &TesseraConfig) -> anyhow::Result<Value> {
    let verifier = verifier(args, config)?;

    let report = match (&args.credential, &args.presentation) {
        (Some(path), _) => {
            let credential = read_json(path)?;
            serde_json::to_value(verifier.verify_credential(&credential).await)?
        }
        (None, Some(path)) => {
            let presentation = read_json(path)?;
            let options = PresentationOptions {
                challenge: args.challenge.clone(),
                domain: args.domain.clone(),
                unsigned: args.unsigned,
                ..PresentationOptions::default()
            };
            let report = verifier.verify_presentation(&presentation, &options).await?;
            serde_json::to_value(report)?
        }
        (None, None) => anyhow::bail!("either --credential or --presentation is required"),
    };
    Ok(report)
}

fn verifier(args: &VerifyArgs, config: &TesseraConfig) -> anyhow::Result<CredentialVerifier> {
    let suites = SuiteRegistry::with_defaults();

    let lists = Arc::new(InMemoryStatusListStore::new());
    for path in &args.status_lists {
        lists.put(StatusList2021Credential::from_json(&read_json(path)?)?);
    }
    let registry = Arc::new(StatusListRegistry::from_config(&config.status, suites.clone()));

    let mut verifier_config = VerifierConfig::from(&config.verification);
    if args.skip_revocation_check {
        verifier_config.force_revocation_check = false;
    }

    Ok(CredentialVerifier::new(crate::resolver::build(config)?)
        .with_suites(suites)
        .with_config(verifier_config)
        .with_revocation(RevocationChecker::new(lists, registry))
        .with_schema_loader(schema_loader(args, config)?))
}

fn schema_loader(args: &VerifyArgs, config: &TesseraConfig) -> anyhow::Result<Arc<dyn SchemaLoader>> {
    if args.schemas.is_empty() {
        let timeout = Duration::from_secs(config.resolver.request_timeout_secs);
        return Ok(Arc::new(HttpSchemaLoader::new(timeout)?));
    }

    let loader = InMemorySchemaLoader::new();
    for spec in &args.schemas {
        let (id, file) = spec
            .split_once('=')
            .with_context(|| format!("expected <schema id>=<file>, got {}", spec))?;
        loader.insert(id, read_json(Path::new(file))?)?;
    }
    Ok(Arc::new(loader))
}
