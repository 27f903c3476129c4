//! Tessera CLI: DID resolution, credential verification and status lists.
//!
//! Subcommands: init, resolve, verify, status (create, check, update).

mod commands;
mod keyfile;
mod logging;
mod resolver;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tessera_core::TesseraConfig;

/// Tessera: trust evaluation for decentralized identifiers and credentials.
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "tessera.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Override the log format (text, json).
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Override the universal resolver URL.
    #[arg(long, global = true)]
    universal_resolver: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration and a fresh issuer key.
    Init(commands::init::InitArgs),
    /// Resolve a DID to its document.
    Resolve(commands::resolve::ResolveArgs),
    /// Verify a credential or presentation.
    Verify(commands::verify::VerifyArgs),
    /// Create, check and update StatusList2021 credentials.
    Status(commands::status::StatusArgs),
}

impl Cli {
    fn apply_overrides(&self, config: &mut TesseraConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        if let Some(url) = &self.universal_resolver {
            config.resolver.universal_resolver_url = Some(url.clone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = TesseraConfig::load(&cli.config)?;
    cli.apply_overrides(&mut config);
    logging::init(&config.logging);

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config),
        Commands::Resolve(args) => commands::resolve::run(args, &config).await,
        Commands::Verify(args) => commands::verify::run(args, &config).await,
        Commands::Status(args) => commands::status::run(args, &config).await,
    }
}
