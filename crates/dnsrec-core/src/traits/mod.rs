//! Core traits for the reconciliation system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DnsProvider`]: Query and create records at the remote provider
//! - [`RecordSource`]: Supply desired records per record type

pub mod dns_provider;
pub mod record_source;

pub use dns_provider::{CreatedRecord, DnsProvider, DnsProviderFactory, RemoteRecord};
pub use record_source::{RecordSource, RecordSourceFactory};
