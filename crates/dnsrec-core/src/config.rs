//! Configuration types for the reconciliation system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Desired-record source configuration
    pub source: SourceConfig,

    /// Zone the records live in
    pub zone_id: String,

    /// Record-type keys to reconcile, in order
    #[serde(default = "default_record_types")]
    pub record_types: Vec<String>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ReconcileConfig {
    /// Create a new configuration with defaults
    pub fn new(zone_id: impl Into<String>) -> Self {
        Self {
            provider: ProviderConfig::default(),
            source: SourceConfig::default(),
            zone_id: zone_id.into(),
            record_types: default_record_types(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_id.trim().is_empty() {
            return Err(crate::Error::config("Zone ID cannot be empty"));
        }

        if self.record_types.is_empty() {
            return Err(crate::Error::config("No record types configured"));
        }

        if self.record_types.iter().any(|t| t.trim().is_empty()) {
            return Err(crate::Error::config("Record type keys cannot be empty"));
        }

        self.provider.validate()?;
        self.source.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// Account ID (optional)
        account_id: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare { api_token, .. } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Cloudflare {
            api_token: String::new(),
            account_id: None,
        }
    }
}

/// Desired-record source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Directory of `<record_type>.yaml` files
    Yaml {
        /// Directory holding the files
        directory: String,
    },

    /// Custom source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl SourceConfig {
    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SourceConfig::Yaml { directory } => {
                if directory.is_empty() {
                    return Err(crate::Error::config("YAML source directory cannot be empty"));
                }
                Ok(())
            }
            SourceConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom source factory cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the source type name
    pub fn type_name(&self) -> &str {
        match self {
            SourceConfig::Yaml { .. } => "yaml",
            SourceConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Yaml {
            directory: "records".to_string(),
        }
    }
}

/// How the reconciler decides whether a record already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceCheck {
    /// Filtered list query by name and type
    #[default]
    Filter,
    /// Direct lookup by (type, name); only an explicit not-found means absent
    CompositeKey,
    /// No check; every record goes straight to creation
    Disabled,
}

impl std::str::FromStr for ExistenceCheck {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filter" => Ok(ExistenceCheck::Filter),
            "composite_key" | "composite-key" => Ok(ExistenceCheck::CompositeKey),
            "disabled" | "none" => Ok(ExistenceCheck::Disabled),
            other => Err(crate::Error::config(format!(
                "Unknown existence check strategy: {} (expected filter, composite_key, disabled)",
                other
            ))),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum create attempts per record (including the first)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff unit; the wait after attempt `n` is `n` units
    #[serde(default = "default_backoff_unit_secs")]
    pub backoff_unit_secs: u64,

    /// Existence check strategy
    #[serde(default)]
    pub existence_check: ExistenceCheck,

    /// Capacity of the reconcile event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_attempts == 0 {
            return Err(crate::Error::config("max_attempts must be at least 1"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be at least 1"));
        }
        Ok(())
    }

    /// Backoff unit as a duration
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_secs(self.backoff_unit_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_unit_secs: default_backoff_unit_secs(),
            existence_check: ExistenceCheck::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_record_types() -> Vec<String> {
    vec!["arecord".to_string(), "cname".to_string()]
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_unit_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    1000
}
