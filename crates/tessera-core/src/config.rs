//! Engine configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Full configuration for the Tessera engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TesseraConfig {
    /// DID resolution settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Credential and presentation verification policy.
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Status list settings.
    #[serde(default)]
    pub status: StatusConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Base URL of the universal resolver used for unregistered methods.
    #[serde(default)]
    pub universal_resolver_url: Option<String>,
    /// Per-request timeout for remote resolution, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum number of distinct DIDs resolved concurrently.
    #[serde(default)]
    pub dedup_capacity: Option<usize>,
    /// Maximum number of resolutions waiting for a free slot.
    #[serde(default)]
    pub dedup_queue_capacity: Option<usize>,
    /// TTL of the optional caller-side document cache, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// DID prefixes resolved through a replacement prefix.
    #[serde(default)]
    pub did_replacements: Vec<DidReplacement>,
}

/// A retired DID prefix and the prefix it is now resolved under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidReplacement {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Check the status list of every credential that references one.
    ///
    /// Disabling this can let revoked credentials verify.
    #[serde(default = "default_true")]
    pub force_revocation_check: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Number of entries in newly created status lists.
    #[serde(default = "default_status_list_length")]
    pub default_length: usize,
    /// Maximum number of status lists whose decoded bitstrings are cached.
    #[serde(default = "default_decode_cache_capacity")]
    pub decode_cache_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_request_timeout_secs() -> u64 {
    10
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_true() -> bool {
    true
}
fn default_status_list_length() -> usize {
    10_000
}
fn default_decode_cache_capacity() -> usize {
    1024
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            universal_resolver_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            dedup_capacity: None,
            dedup_queue_capacity: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            did_replacements: Vec::new(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            force_revocation_check: true,
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            default_length: default_status_list_length(),
            decode_cache_capacity: default_decode_cache_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl TesseraConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: TesseraConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}
