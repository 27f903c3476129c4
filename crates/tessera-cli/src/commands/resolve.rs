//! `tessera resolve`: Resolve a DID to its document.

use clap::Args;
use serde_json::{json, Value};
use tessera_core::TesseraConfig;
use tessera_identity::DidResolver;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// The DID to resolve.
    pub did: String,
}

pub async fn run(args: &ResolveArgs, config: &TesseraConfig) -> anyhow::Result<()> {
    let output = resolve(&args.did, config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// The resolution in DID resolution envelope form.
pub async fn resolve(did: &str, config: &TesseraConfig) -> anyhow::Result<Value> {
    let resolver = crate::resolver::build(config)?;
    let result = resolver.resolve(did).await?;
    let document = match &result.document {
        Some(document) => document.to_json(),
        None => Value::Null,
    };
    Ok(json!({
        "didDocument": document,
        "didDocumentMetadata": {"deactivated": result.is_deactivated()},
    }))
}
