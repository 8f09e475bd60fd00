// # dnsrec-core
//
// Core library for reconciling declared DNS records against a remote
// authoritative provider.
//
// ## Architecture Overview
//
// - **RecordSource**: Trait supplying desired records per record type
// - **normalize**: Turns a raw spec into a validated `CanonicalRecord`
// - **DnsProvider**: Trait for querying and creating records at the provider
// - **Reconciler**: Per-record existence check, create, bounded retry
// - **BatchRunner**: Runs the reconciler over every record type and reports
// - **ProviderRegistry**: Plugin-based registry for providers and sources
//
// ## Data Flow
//
// ```text
// RecordSource ──▶ normalize ──▶ Reconciler ──▶ BatchRunner ──▶ RunReport
//                                  │    ▲
//                                  ▼    │
//                               DnsProvider
// ```
//
// ## Design Principles
//
// 1. **Single forward pass**: no state survives between runs; the provider is the only truth
// 2. **Idempotency**: a record that already exists is never created again
// 3. **Outages are not absence**: a failed existence check never leads to a create call
// 4. **Library-First**: all core functionality can be used as a library

pub mod traits;
pub mod record;
pub mod engine;
pub mod batch;
pub mod source;
pub mod registry;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, RecordSource};
pub use record::{normalize, CanonicalRecord, RawSpec, RecordType};
pub use engine::{OutcomeStatus, RecordOutcome, Reconciler, RetryPolicy, SkipReason};
pub use batch::{BatchCondition, BatchRunner, BatchSummary, RunReport, TypeReport};
pub use registry::ProviderRegistry;
pub use config::{EngineConfig, ExistenceCheck, ProviderConfig, ReconcileConfig, SourceConfig};
pub use error::{Error, Result};
pub use source::MemoryRecordSource;
