//! Plugin-based provider registry
//!
//! The registry allows DNS providers and record sources to be registered
//! dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dnsrec_core::registry::ProviderRegistry;
//! use dnsrec_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::new();
//! dnsrec_provider_cloudflare::register(&registry);
//! dnsrec_source_yaml::register(&registry);
//!
//! let provider = registry.create_provider(&config.provider)?;
//! let source = registry.create_source(&config.source)?;
//! ```

use crate::config::{ProviderConfig, SourceConfig};
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory, RecordSource, RecordSourceFactory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of provider and source factories, keyed by type name
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered DNS provider factories
    providers: RwLock<HashMap<String, Box<dyn DnsProviderFactory>>>,

    /// Registered record source factories
    sources: RwLock<HashMap<String, Box<dyn RecordSourceFactory>>>,
}

fn poisoned(what: &str) -> Error {
    Error::Other(format!("{} registry lock poisoned", what))
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "cloudflare")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        factory: Box<dyn DnsProviderFactory>,
    ) -> Result<()> {
        let mut providers = self.providers.write().map_err(|_| poisoned("provider"))?;
        providers.insert(name.into(), factory);
        Ok(())
    }

    /// Register a record source factory
    ///
    /// # Parameters
    ///
    /// - `name`: Source type name (e.g., "yaml")
    /// - `factory`: Factory object for creating source instances
    pub fn register_source(
        &self,
        name: impl Into<String>,
        factory: Box<dyn RecordSourceFactory>,
    ) -> Result<()> {
        let mut sources = self.sources.write().map_err(|_| poisoned("source"))?;
        sources.insert(name.into(), factory);
        Ok(())
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If provider type is not registered or creation fails
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Arc<dyn DnsProvider>> {
        let provider_type = config.type_name();
        let providers = self.providers.read().map_err(|_| poisoned("provider"))?;

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// Create a record source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RecordSource>)`: Created source instance
    /// - `Err(Error)`: If source type is not registered or creation fails
    pub fn create_source(&self, config: &SourceConfig) -> Result<Box<dyn RecordSource>> {
        let source_type = config.type_name();
        let sources = self.sources.read().map_err(|_| poisoned("source"))?;

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown record source type: {}", source_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        self.providers
            .read()
            .map(|providers| providers.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// List all registered source types
    pub fn list_sources(&self) -> Vec<String> {
        self.sources
            .read()
            .map(|sources| sources.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        self.providers
            .read()
            .map(|providers| providers.contains_key(name))
            .unwrap_or(false)
    }

    /// Check if a source type is registered
    pub fn has_source(&self, name: &str) -> bool {
        self.sources
            .read()
            .map(|sources| sources.contains_key(name))
            .unwrap_or(false)
    }
}
