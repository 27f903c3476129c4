//! `tessera status`: Create, check and update StatusList2021 credentials.

use clap::{Args, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use tessera_core::TesseraConfig;
use tessera_proof::{verify_document, ProofPurpose, SuiteRegistry};
use tessera_status::{StatusList2021Credential, StatusListOptions, StatusListRegistry, StatusPurpose};

use super::{read_json, write_json};
use crate::keyfile::KeyFile;

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(subcommand)]
    pub command: StatusCommand,
}

#[derive(Subcommand, Debug)]
pub enum StatusCommand {
    /// Create and sign a new status list.
    Create(CreateArgs),
    /// Read the bits at one or more indices.
    Check(CheckArgs),
    /// Revoke and unsuspend indices, then re-sign.
    Update(UpdateArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Id of the status list credential (usually the URL it is served from).
    #[arg(long)]
    pub id: String,

    /// Issuer key file.
    #[arg(short, long, default_value = "tessera-key.json")]
    pub key: PathBuf,

    /// revocation or suspension.
    #[arg(long, default_value = "revocation")]
    pub purpose: StatusPurpose,

    /// Number of entries (defaults to `status.default_length`).
    #[arg(long)]
    pub length: Option<usize>,

    /// Indices to revoke from the start, comma-separated.
    #[arg(long, value_delimiter = ',')]
    pub revoke: Vec<usize>,

    /// Output file.
    #[arg(short, long)]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Status list credential file.
    #[arg(short, long)]
    pub list: PathBuf,

    /// Indices to read, comma-separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub index: Vec<usize>,

    /// Do not verify the status list proof.
    #[arg(long)]
    pub skip_proof: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Status list credential file.
    #[arg(short, long)]
    pub list: PathBuf,

    /// Issuer key file.
    #[arg(short, long, default_value = "tessera-key.json")]
    pub key: PathBuf,

    /// Indices to revoke, comma-separated.
    #[arg(long, value_delimiter = ',')]
    pub revoke: Vec<usize>,

    /// Indices to unsuspend, comma-separated (suspension lists only).
    #[arg(long, value_delimiter = ',')]
    pub unsuspend: Vec<usize>,

    /// Output file (defaults to updating the list in place).
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub async fn run(args: &StatusArgs, config: &TesseraConfig) -> anyhow::Result<()> {
    match &args.command {
        StatusCommand::Create(args) => {
            let credential = create(args, config)?;
            println!("Created status list {}", credential.id);
            println!("  Purpose: {}", credential.purpose());
            println!("  Written to {}", args.out.display());
        }
        StatusCommand::Check(args) => {
            let report = check(args, config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        StatusCommand::Update(args) => {
            let credential = update(args, config)?;
            println!("Updated status list {}", credential.id);
            println!("  Issued: {}", credential.issuance_date);
        }
    }
    Ok(())
}

fn registry(config: &TesseraConfig) -> StatusListRegistry {
    StatusListRegistry::from_config(&config.status, SuiteRegistry::with_defaults())
}

pub fn create(args: &CreateArgs, config: &TesseraConfig) -> anyhow::Result<StatusList2021Credential> {
    let key = KeyFile::load(&args.key)?.key_doc()?;
    let options = StatusListOptions {
        status_purpose: args.purpose,
        length: args.length,
        revoke_indices: args.revoke.clone(),
    };
    let credential = registry(config).create(&key, &args.id, options)?;
    write_json(&args.out, &credential.to_json()?)?;
    Ok(credential)
}

pub async fn check(args: &CheckArgs, config: &TesseraConfig) -> anyhow::Result<Value> {
    let credential = StatusList2021Credential::from_json(&read_json(&args.list)?)?;
    let registry = registry(config);

    if !args.skip_proof {
        let resolver = crate::resolver::build(config)?;
        let purpose = ProofPurpose::AssertionMethod {
            controller: credential.issuer_id().map(str::to_string),
        };
        let verification =
            verify_document(&credential.to_json()?, &purpose, resolver.as_ref(), registry.suites()).await;
        if !verification.verified {
            anyhow::bail!(
                "status list proof failed verification: {}",
                verification.error.unwrap_or_default()
            );
        }
    }

    let bits = registry.is_revoked_batch(&credential, &args.index)?;
    let results: Vec<Value> = args
        .index
        .iter()
        .zip(bits)
        .map(|(index, set)| json!({"index": index, "set": set}))
        .collect();
    Ok(json!({
        "id": credential.id,
        "statusPurpose": credential.purpose(),
        "results": results,
    }))
}

pub fn update(args: &UpdateArgs, config: &TesseraConfig) -> anyhow::Result<StatusList2021Credential> {
    let key = KeyFile::load(&args.key)?.key_doc()?;
    let mut credential = StatusList2021Credential::from_json(&read_json(&args.list)?)?;
    registry(config).batch_update(&key, &mut credential, &args.revoke, &args.unsuspend)?;

    let out = args.out.as_ref().unwrap_or(&args.list);
    write_json(out, &credential.to_json()?)?;
    Ok(credential)
}
