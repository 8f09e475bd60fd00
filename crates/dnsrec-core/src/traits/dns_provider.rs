// # DNS Provider Trait
//
// Defines the interface to the remote authoritative DNS provider.
//
// ## Implementations
//
// - Cloudflare: `dnsrec-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsrec_core::DnsProvider;
// use dnsrec_core::record::RecordType;
//
// #[tokio::main]
// async fn main() -> dnsrec_core::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let exists = provider
//         .find_by_name_and_type("zone-id", "api.example.com", RecordType::A)
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::record::{CanonicalRecord, RecordType};

/// Identity of a record the provider just created
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreatedRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// The fully qualified name the provider stored
    pub hostname: String,
}

/// A record as it currently exists at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// The fully qualified record name
    pub name: String,
    /// Record type as reported by the provider
    pub record_type: String,
    /// Current content
    pub content: String,
    /// Time-to-live for the record
    pub ttl: u32,
    /// Whether the record is proxied
    pub proxied: bool,
}

/// Trait for DNS provider implementations
///
/// Every method is a single request/response exchange with the provider.
///
/// # Error Contract
///
/// - A call that ran out of time MUST fail with
///   [`Error::DeadlineExceeded`](crate::Error::DeadlineExceeded). This is the
///   only error the reconciler retries.
/// - A lookup that positively found nothing MUST fail with
///   [`Error::NotFound`](crate::Error::NotFound) (or, for
///   [`find_by_name_and_type`](Self::find_by_name_and_type), return
///   `Ok(false)`). Outages must never be reported as "not found"; that would
///   let the reconciler create a duplicate.
///
/// # Forbidden
///
/// - Retry or backoff (owned by the `Reconciler`)
/// - Deciding whether a record should be created (owned by the `Reconciler`)
/// - Caching remote state between calls
/// - Spawning tasks
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Check whether a record with this name and type exists in the zone
    ///
    /// Matching is by name and type only; content and TTL are ignored.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: at least one matching record exists
    /// - `Ok(false)`: the provider answered and has no match
    /// - `Err(Error)`: the provider could not answer
    async fn find_by_name_and_type(
        &self,
        zone_id: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<bool, crate::Error>;

    /// Create a record in the zone
    ///
    /// # Returns
    ///
    /// - `Ok(CreatedRecord)`: the record was stored
    /// - `Err(Error)`: creation failed; the reconciler classifies the error
    async fn create_record(
        &self,
        zone_id: &str,
        record: &CanonicalRecord,
    ) -> Result<CreatedRecord, crate::Error>;

    /// Fetch a single record by its (type, name) key
    ///
    /// # Returns
    ///
    /// - `Ok(RemoteRecord)`: the record
    /// - `Err(Error::NotFound)`: no such record
    /// - `Err(Error)`: the provider could not answer
    async fn get_by_composite_key(
        &self,
        zone_id: &str,
        record_type: RecordType,
        name: &str,
    ) -> Result<RemoteRecord, crate::Error>;

    /// Fetch a single record by its provider identifier
    ///
    /// # Returns
    ///
    /// - `Ok(RemoteRecord)`: the record
    /// - `Err(Error::NotFound)`: no record with that ID
    /// - `Err(Error)`: the provider could not answer
    async fn get_record_by_id(
        &self,
        zone_id: &str,
        record_id: &str,
    ) -> Result<RemoteRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    ///
    /// # Returns
    ///
    /// A shared DnsProvider trait object
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<std::sync::Arc<dyn DnsProvider>, crate::Error>;
}
