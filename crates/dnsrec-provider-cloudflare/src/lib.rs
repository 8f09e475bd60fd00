// # Cloudflare DNS Provider
//
// `DnsProvider` implementation backed by the Cloudflare API v4.
//
// ## Behavior
//
// - One HTTP request per trait call, plus one zone lookup per zone
// - Relative names (`api`, `@`) are qualified with the zone's name before
//   lookups and creates; the API only matches fully qualified names
// - HTTP timeout of 30 seconds; a timed-out request is reported as
//   `Error::DeadlineExceeded`, the only error the reconciler retries
// - Dry-run mode: lookups hit the API, creates are only logged
// - NO retry or backoff (owned by the `Reconciler`)
//
// ## Error Mapping
//
// | Response                 | Error                  |
// |--------------------------|------------------------|
// | request timed out        | `DeadlineExceeded`     |
// | 401 / 403                | `Authentication`       |
// | 404                      | `NotFound`             |
// | 429                      | `RateLimited`          |
// | 5xx, other non-2xx       | `Provider`             |
// | `success: false` body    | `Provider`             |
//
// ## Security
//
// - API token NEVER appears in logs or `Debug` output
// - Provider creation fails if the token is empty
//
// ## API Reference
//
// - Zone Details: GET `/zones/:zone_id`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - DNS Record Details: GET `/zones/:zone_id/dns_records/:record_id`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`

mod types;

use async_trait::async_trait;
use dnsrec_core::config::ProviderConfig;
use dnsrec_core::record::{CanonicalRecord, RecordType};
use dnsrec_core::traits::{CreatedRecord, DnsProvider, DnsProviderFactory, RemoteRecord};
use dnsrec_core::{Error, ProviderRegistry, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::types::{CloudflareDnsRecord, CloudflareResponse, CloudflareZone, CreateDnsRecord};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Record ID reported for creates skipped in dry-run mode
pub const DRY_RUN_RECORD_ID: &str = "dry-run";

const PROVIDER: &str = "cloudflare";

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (existence checks, import probes)
/// - Log the intended POST payload
/// - **NOT** create anything, answering with [`DRY_RUN_RECORD_ID`]
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Account ID (optional, informational)
    account_id: Option<String>,

    /// API base URL, without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip POSTs
    dry_run: bool,

    /// Zone ID -> zone name, filled on first use
    zone_names: RwLock<HashMap<String, String>>,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("account_id", &self.account_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `account_id`: Optional account ID
    /// - `dry_run`: If true, perform GET requests but skip creates
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be built.
    pub fn new(
        api_token: impl Into<String>,
        account_id: Option<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        Ok(Self {
            api_token,
            account_id,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client: build_client(DEFAULT_HTTP_TIMEOUT)?,
            dry_run,
            zone_names: RwLock::new(HashMap::new()),
        })
    }

    /// Replace the HTTP timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Point the provider at a different API endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether creates are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Configured account ID, if any
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    fn zone_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}", self.base_url, zone_id)
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id)
    }

    /// Send one request and unwrap the Cloudflare envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| map_transport_error(e, context))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, context))?;

        if !status.is_success() {
            return Err(map_status(status, &body, context));
        }

        let envelope: CloudflareResponse<T> = serde_json::from_str(&body).map_err(|e| {
            Error::provider(PROVIDER, format!("{}: failed to parse response: {}", context, e))
        })?;

        if !envelope.success {
            let reason = envelope
                .first_error()
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(Error::provider(PROVIDER, format!("{}: {}", context, reason)));
        }

        envelope.result.ok_or_else(|| {
            Error::provider(PROVIDER, format!("{}: response has no result", context))
        })
    }

    /// List records in a zone matching name and type exactly
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=api.example.com&type=A
    /// Authorization: Bearer <token>
    /// ```
    async fn list_records(
        &self,
        zone_id: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<CloudflareDnsRecord>> {
        tracing::debug!("Looking up {} record {} in zone {}", record_type, name, zone_id);

        let request = self
            .client
            .get(self.records_url(zone_id))
            .query(&[("name", name), ("type", record_type.as_str())]);

        self.send(request, &format!("list {} records for {}", record_type, name))
            .await
    }

    /// Name of a zone, fetched once per zone ID
    async fn zone_name(&self, zone_id: &str) -> Result<String> {
        if let Some(name) = self.zone_names.read().await.get(zone_id) {
            return Ok(name.clone());
        }

        let request = self.client.get(self.zone_url(zone_id));
        let zone: CloudflareZone = self
            .send(request, &format!("get zone {}", zone_id))
            .await?;
        tracing::debug!("Zone {} is {}", zone.id, zone.name);

        self.zone_names
            .write()
            .await
            .insert(zone_id.to_string(), zone.name.clone());
        Ok(zone.name)
    }

    async fn qualified_name(&self, zone_id: &str, name: &str) -> Result<String> {
        let zone = self.zone_name(zone_id).await?;
        Ok(qualify(name, &zone))
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
}

/// Qualify a record name with its zone
///
/// `@` and the empty name mean the zone apex. A trailing dot marks a name
/// as already absolute. Names equal to the zone or ending in `.<zone>`
/// are kept as they are; anything else is relative to the zone.
fn qualify(name: &str, zone: &str) -> String {
    let zone = zone.trim_end_matches('.');
    if name.is_empty() || name == "@" {
        return zone.to_string();
    }
    if let Some(absolute) = name.strip_suffix('.') {
        return absolute.to_string();
    }

    let lower = name.to_ascii_lowercase();
    let zone_lower = zone.to_ascii_lowercase();
    if lower == zone_lower || lower.ends_with(&format!(".{}", zone_lower)) {
        name.to_string()
    } else {
        format!("{}.{}", name, zone)
    }
}

/// Map a transport-level failure
///
/// Only a timeout becomes the retryable `DeadlineExceeded`; connection
/// failures and the like are reported as permanent provider errors.
fn map_transport_error(e: reqwest::Error, context: &str) -> Error {
    if e.is_timeout() {
        Error::deadline_exceeded(format!("{}: request timed out", context))
    } else {
        Error::provider(PROVIDER, format!("{}: HTTP request failed: {}", context, e))
    }
}

/// Map a non-2xx response to an error
fn map_status(status: StatusCode, body: &str, context: &str) -> Error {
    let detail = serde_json::from_str::<CloudflareResponse<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.first_error())
        .unwrap_or_else(|| status.to_string());

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid API token or insufficient permissions ({})",
            context, detail
        )),
        404 => Error::not_found(format!("{}: {}", context, detail)),
        429 => Error::rate_limited(format!("{}: {}", context, detail)),
        500..=599 => Error::provider(
            PROVIDER,
            format!("{}: Cloudflare server error {}: {}", context, status, detail),
        ),
        _ => Error::provider(PROVIDER, format!("{}: {} - {}", context, status, detail)),
    }
}

impl From<CloudflareDnsRecord> for RemoteRecord {
    fn from(record: CloudflareDnsRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            record_type: record.record_type,
            content: record.content,
            ttl: record.ttl,
            proxied: record.proxied.unwrap_or(false),
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn find_by_name_and_type(
        &self,
        zone_id: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<bool> {
        let name = self.qualified_name(zone_id, name).await?;
        let records = self.list_records(zone_id, &name, record_type).await?;
        Ok(!records.is_empty())
    }

    /// Create a record
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// {
    ///   "type": "A",
    ///   "name": "api.example.com",
    ///   "content": "203.0.113.5",
    ///   "ttl": 1,
    ///   "proxied": true,
    ///   "comment": "Managed by dnsrec"
    /// }
    /// ```
    async fn create_record(&self, zone_id: &str, record: &CanonicalRecord) -> Result<CreatedRecord> {
        let name = self.qualified_name(zone_id, &record.name).await?;
        let body = CreateDnsRecord {
            record_type: record.record_type.as_str(),
            name: &name,
            content: &record.content,
            ttl: record.ttl,
            proxied: record.proxied,
            comment: &record.comment,
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                self.records_url(zone_id),
                serde_json::to_string(&body)?
            );
            return Ok(CreatedRecord {
                id: DRY_RUN_RECORD_ID.to_string(),
                hostname: name,
            });
        }

        tracing::info!(
            "Creating {} record {} -> {} in zone {}",
            record.record_type,
            name,
            record.content,
            zone_id
        );

        let request = self.client.post(self.records_url(zone_id)).json(&body);
        let created: CloudflareDnsRecord = self
            .send(request, &format!("create {} record {}", record.record_type, name))
            .await?;

        Ok(CreatedRecord {
            id: created.id,
            hostname: created.name,
        })
    }

    async fn get_by_composite_key(
        &self,
        zone_id: &str,
        record_type: RecordType,
        name: &str,
    ) -> Result<RemoteRecord> {
        let name = self.qualified_name(zone_id, name).await?;
        self.list_records(zone_id, &name, record_type)
            .await?
            .into_iter()
            .next()
            .map(RemoteRecord::from)
            .ok_or_else(|| Error::not_found(format!("{} record {}", record_type, name)))
    }

    /// Fetch a record by ID
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records/:record_id
    /// ```
    async fn get_record_by_id(&self, zone_id: &str, record_id: &str) -> Result<RemoteRecord> {
        let request = self.client.get(self.record_url(zone_id, record_id));
        let record: CloudflareDnsRecord = self
            .send(request, &format!("get record {}", record_id))
            .await?;
        Ok(record.into())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory {
    dry_run: bool,
}

impl CloudflareFactory {
    /// Factory for live providers
    pub fn live() -> Self {
        Self { dry_run: false }
    }

    /// Factory for dry-run providers
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn DnsProvider>> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                account_id,
            } => {
                if self.dry_run {
                    tracing::warn!(
                        "Cloudflare provider running in DRY-RUN mode - no records will be created"
                    );
                }

                let provider = CloudflareProvider::new(api_token.clone(), account_id.clone(), self.dry_run)?;
                Ok(Arc::new(provider))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use dnsrec_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// dnsrec_provider_cloudflare::register(&registry, false).unwrap();
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &ProviderRegistry, dry_run: bool) -> Result<()> {
    let factory = if dry_run {
        CloudflareFactory::dry_run()
    } else {
        CloudflareFactory::live()
    };
    registry.register_provider(PROVIDER, Box::new(factory))
}
