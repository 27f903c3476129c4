//! `tessera init`: Write a default configuration and an issuer key.

use clap::Args;
use std::path::{Path, PathBuf};
use tessera_core::TesseraConfig;

use crate::keyfile::{KeyAlgorithm, KeyFile};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the issuer key.
    #[arg(long, default_value = "tessera-key.json")]
    pub key: PathBuf,

    /// Algorithm of the issuer key.
    #[arg(long, value_enum, default_value_t = KeyAlgorithm::Ed25519)]
    pub key_type: KeyAlgorithm,

    /// Overwrite existing files.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, config_path: &Path) -> anyhow::Result<()> {
    for path in [config_path, args.key.as_path()] {
        if path.exists() && !args.force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }
    }

    TesseraConfig::default().save(config_path)?;
    let key = KeyFile::generate(args.key_type)?;
    key.save(&args.key)?;

    tracing::info!(config = %config_path.display(), did = %key.did, "initialized");
    println!("Wrote configuration to {}", config_path.display());
    println!("Wrote issuer key to {}", args.key.display());
    println!("  DID: {}", key.did);
    Ok(())
}
