// # Record Source Trait
//
// Defines where desired records come from.
//
// ## Implementations
//
// - In-memory: `dnsrec_core::source::MemoryRecordSource`
// - YAML directory: `dnsrec-source-yaml` crate
//
// ## Contract
//
// A source is asked for one record-type key at a time (`arecord`, `cname`,
// ...) and answers with the specs in declaration order. Having no data for
// a key is a normal condition and is reported as `Ok(None)`, never as an
// error.

use async_trait::async_trait;

use crate::record::RawSpec;

/// Trait for desired-record sources
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Load the specs declared for a record type
    ///
    /// # Parameters
    ///
    /// - `record_type`: record-type key, e.g. `arecord`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(specs))`: specs in source order (possibly empty)
    /// - `Ok(None)`: nothing is declared for this record type
    /// - `Err(Error)`: the source exists but could not be read or parsed
    async fn load(&self, record_type: &str) -> Result<Option<Vec<RawSpec>>, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing record sources from configuration
pub trait RecordSourceFactory: Send + Sync {
    /// Create a RecordSource instance from configuration
    fn create(
        &self,
        config: &crate::config::SourceConfig,
    ) -> Result<Box<dyn RecordSource>, crate::Error>;
}
