// # Environment configuration
//
// Every setting comes from a `DNSREC_*` environment variable. Values are
// read through a lookup function so tests never touch the process
// environment.

use anyhow::{Context, Result};
use dnsrec_core::config::{EngineConfig, ExistenceCheck, ProviderConfig, ReconcileConfig, SourceConfig};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

const DEFAULT_SOURCE_DIR: &str = "./records";
const DEFAULT_RECORD_TYPES: &str = "arecord,cname";

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub provider_type: String,
    pub provider_api_token: String,
    pub zone_id: String,
    pub account_id: Option<String>,
    pub source_dir: String,
    pub record_types: Vec<String>,
    pub max_attempts: u32,
    pub backoff_unit_secs: u64,
    pub existence_check: ExistenceCheck,
    pub output_path: Option<PathBuf>,
    pub log_level: String,
    pub dry_run: bool,
}

// Hand-written so the token never reaches a log line
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider_type", &self.provider_type)
            .field("provider_api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("account_id", &self.account_id)
            .field("source_dir", &self.source_dir)
            .field("record_types", &self.record_types)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_unit_secs", &self.backoff_unit_secs)
            .field("existence_check", &self.existence_check)
            .field("output_path", &self.output_path)
            .field("log_level", &self.log_level)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let engine_defaults = EngineConfig::default();

        Ok(Self {
            provider_type: var("DNSREC_PROVIDER_TYPE").unwrap_or_else(|| "cloudflare".to_string()),
            provider_api_token: var("DNSREC_PROVIDER_API_TOKEN")
                .context("DNSREC_PROVIDER_API_TOKEN is not set")?,
            zone_id: var("DNSREC_ZONE_ID").context("DNSREC_ZONE_ID is not set")?,
            account_id: var("DNSREC_ACCOUNT_ID"),
            source_dir: var("DNSREC_SOURCE_DIR").unwrap_or_else(|| DEFAULT_SOURCE_DIR.to_string()),
            record_types: var("DNSREC_RECORD_TYPES")
                .unwrap_or_else(|| DEFAULT_RECORD_TYPES.to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_attempts: parse_var(&var, "DNSREC_MAX_ATTEMPTS")?
                .unwrap_or(engine_defaults.max_attempts),
            backoff_unit_secs: parse_var(&var, "DNSREC_BACKOFF_UNIT_SECS")?
                .unwrap_or(engine_defaults.backoff_unit_secs),
            existence_check: parse_var(&var, "DNSREC_EXISTENCE_CHECK")?
                .unwrap_or(engine_defaults.existence_check),
            output_path: var("DNSREC_OUTPUT_PATH").map(PathBuf::from),
            log_level: var("DNSREC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            dry_run: match var("DNSREC_MODE") {
                None => false,
                Some(mode) => match mode.to_lowercase().as_str() {
                    "dry-run" | "dry_run" | "dryrun" => true,
                    "live" => false,
                    other => anyhow::bail!(
                        "DNSREC_MODE '{}' is not valid. Valid modes: live, dry-run",
                        other
                    ),
                },
            },
        })
    }

    /// Validate the configuration
    ///
    /// Checks value ranges and formats, then the assembled core
    /// configuration.
    pub fn validate(&self) -> Result<()> {
        match self.provider_type.as_str() {
            "cloudflare" => {}
            _ => anyhow::bail!(
                "DNSREC_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: cloudflare",
                self.provider_type
            ),
        }

        // Cloudflare API tokens are 40 characters
        if self.provider_api_token.len() < 20 {
            anyhow::bail!(
                "DNSREC_PROVIDER_API_TOKEN appears too short ({} chars). \
                Cloudflare tokens are typically 40 characters.",
                self.provider_api_token.len()
            );
        }

        let token_lower = self.provider_api_token.to_lowercase();
        if token_lower.contains("your_token") || token_lower.contains("replace_me") {
            anyhow::bail!(
                "DNSREC_PROVIDER_API_TOKEN appears to be a placeholder. \
                Use an actual API token from your DNS provider."
            );
        }

        if !(1..=10).contains(&self.max_attempts) {
            anyhow::bail!(
                "DNSREC_MAX_ATTEMPTS must be between 1 and 10. Got: {}",
                self.max_attempts
            );
        }

        if self.backoff_unit_secs > 300 {
            anyhow::bail!(
                "DNSREC_BACKOFF_UNIT_SECS must be between 0 and 300 seconds. Got: {}",
                self.backoff_unit_secs
            );
        }

        for record_type in &self.record_types {
            if !record_type
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                anyhow::bail!(
                    "DNSREC_RECORD_TYPES entry '{}' contains invalid characters. \
                    Valid: alphanumeric, underscore and hyphen only.",
                    record_type
                );
            }
        }

        if let Some(parent) = self.output_path.as_ref().and_then(|p| p.parent())
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            anyhow::bail!(
                "DNSREC_OUTPUT_PATH parent directory does not exist: {}",
                parent.display()
            );
        }

        self.log_level()?;

        self.reconcile_config()
            .validate()
            .context("invalid reconcile configuration")?;

        Ok(())
    }

    /// Parsed log level
    pub fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DNSREC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Core configuration assembled from the environment values
    pub fn reconcile_config(&self) -> ReconcileConfig {
        ReconcileConfig {
            provider: ProviderConfig::Cloudflare {
                api_token: self.provider_api_token.clone(),
                account_id: self.account_id.clone(),
            },
            source: SourceConfig::Yaml {
                directory: self.source_dir.clone(),
            },
            zone_id: self.zone_id.clone(),
            record_types: self.record_types.clone(),
            engine: EngineConfig {
                max_attempts: self.max_attempts,
                backoff_unit_secs: self.backoff_unit_secs,
                existence_check: self.existence_check,
                ..EngineConfig::default()
            },
        }
    }
}

fn parse_var<T>(var: impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
        })
        .transpose()
}
