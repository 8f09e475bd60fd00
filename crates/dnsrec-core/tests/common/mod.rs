//! Test doubles and common utilities for reconciler contract tests
//!
//! This module provides a scripted in-memory provider that records every
//! call, so tests can assert on exactly what the reconciler asked for.

#![allow(dead_code)]

use dnsrec_core::config::{EngineConfig, ExistenceCheck};
use dnsrec_core::error::{Error, Result};
use dnsrec_core::record::{CanonicalRecord, RecordType};
use dnsrec_core::traits::{CreatedRecord, DnsProvider, RemoteRecord};
use dnsrec_core::{BatchRunner, MemoryRecordSource, Reconciler};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};

pub const ZONE_ID: &str = "zone-test";

/// A provider backed by an in-memory zone, with scriptable failures
#[derive(Default)]
pub struct ScriptedProvider {
    /// Records present in the zone, keyed by (name, type)
    zone: Mutex<HashMap<(String, RecordType), RemoteRecord>>,
    /// Records reachable by ID only (for import probes)
    by_id: Mutex<HashMap<String, RemoteRecord>>,
    /// Responses for upcoming create calls; empty means succeed
    create_script: Mutex<VecDeque<Error>>,
    /// Error every create call returns, if set
    create_always: Mutex<Option<Error>>,
    /// Error every existence query returns, if set
    lookup_error: Mutex<Option<Error>>,
    /// Instants at which create was called
    create_times: Mutex<Vec<tokio::time::Instant>>,
    /// Names passed to create, in call order
    created_names: Mutex<Vec<String>>,

    find_calls: AtomicUsize,
    composite_calls: AtomicUsize,
    by_id_calls: AtomicUsize,
    create_calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed a record as already present in the zone
    pub fn seed(&self, name: &str, record_type: RecordType, content: &str) {
        let id = format!("seeded-{}", name);
        let remote = RemoteRecord {
            id,
            name: name.to_string(),
            record_type: record_type.as_str().to_string(),
            content: content.to_string(),
            ttl: 300,
            proxied: false,
        };
        self.zone
            .lock()
            .unwrap()
            .insert((name.to_string(), record_type), remote);
    }

    /// Make a record reachable through `get_record_by_id`
    pub fn seed_id(&self, id: &str, name: &str) {
        let remote = RemoteRecord {
            id: id.to_string(),
            name: name.to_string(),
            record_type: "A".to_string(),
            content: "192.0.2.99".to_string(),
            ttl: 300,
            proxied: false,
        };
        self.by_id.lock().unwrap().insert(id.to_string(), remote);
    }

    /// Queue errors for the next create calls
    pub fn fail_next_creates(&self, errors: impl IntoIterator<Item = Error>) {
        self.create_script.lock().unwrap().extend(errors);
    }

    /// Make every create call fail with `error`
    pub fn fail_all_creates(&self, error: Error) {
        *self.create_always.lock().unwrap() = Some(error);
    }

    /// Make every existence query fail with `error`
    pub fn fail_lookups(&self, error: Error) {
        *self.lookup_error.lock().unwrap() = Some(error);
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn composite_calls(&self) -> usize {
        self.composite_calls.load(Ordering::SeqCst)
    }

    pub fn by_id_calls(&self) -> usize {
        self.by_id_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn create_times(&self) -> Vec<tokio::time::Instant> {
        self.create_times.lock().unwrap().clone()
    }

    pub fn created_names(&self) -> Vec<String> {
        self.created_names.lock().unwrap().clone()
    }

    pub fn zone_len(&self) -> usize {
        self.zone.lock().unwrap().len()
    }

    fn lookup_error(&self) -> Option<Error> {
        self.lookup_error.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for ScriptedProvider {
    async fn find_by_name_and_type(
        &self,
        _zone_id: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<bool> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.lookup_error() {
            return Err(e);
        }
        Ok(self
            .zone
            .lock()
            .unwrap()
            .contains_key(&(name.to_string(), record_type)))
    }

    async fn create_record(&self, _zone_id: &str, record: &CanonicalRecord) -> Result<CreatedRecord> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.create_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        self.created_names.lock().unwrap().push(record.name.clone());

        if let Some(e) = self.create_always.lock().unwrap().clone() {
            return Err(e);
        }
        if let Some(e) = self.create_script.lock().unwrap().pop_front() {
            return Err(e);
        }

        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.zone.lock().unwrap().insert(
            (record.name.clone(), record.record_type),
            RemoteRecord {
                id: id.clone(),
                name: record.name.clone(),
                record_type: record.record_type.as_str().to_string(),
                content: record.content.clone(),
                ttl: record.ttl,
                proxied: record.proxied,
            },
        );

        Ok(CreatedRecord {
            id,
            hostname: record.name.clone(),
        })
    }

    async fn get_by_composite_key(
        &self,
        _zone_id: &str,
        record_type: RecordType,
        name: &str,
    ) -> Result<RemoteRecord> {
        self.composite_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.lookup_error() {
            return Err(e);
        }
        self.zone
            .lock()
            .unwrap()
            .get(&(name.to_string(), record_type))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("{} ({})", name, record_type)))
    }

    async fn get_record_by_id(&self, _zone_id: &str, record_id: &str) -> Result<RemoteRecord> {
        self.by_id_calls.fetch_add(1, Ordering::SeqCst);
        self.by_id
            .lock()
            .unwrap()
            .get(record_id)
            .cloned()
            .ok_or_else(|| Error::not_found(record_id.to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Engine config with the default retry policy and the given strategy
pub fn engine_config(existence_check: ExistenceCheck) -> EngineConfig {
    EngineConfig {
        existence_check,
        ..EngineConfig::default()
    }
}

/// Reconciler over a shared scripted provider
pub fn reconciler(
    provider: &Arc<ScriptedProvider>,
    config: &EngineConfig,
) -> (Reconciler, mpsc::Receiver<dnsrec_core::engine::ReconcileEvent>) {
    let provider: Arc<dyn DnsProvider> = provider.clone();
    Reconciler::new(provider, ZONE_ID, config).expect("reconciler construction succeeds")
}

/// Batch runner over a memory source and a shared scripted provider
pub fn batch_runner(
    provider: &Arc<ScriptedProvider>,
    source: &MemoryRecordSource,
    config: &EngineConfig,
    record_types: &[&str],
) -> BatchRunner {
    let (reconciler, _events) = reconciler(provider, config);
    BatchRunner::new(
        Box::new(source.clone()),
        reconciler,
        record_types.iter().map(|t| t.to_string()).collect(),
    )
}

/// Batch runner with a shutdown signal attached
pub fn batch_runner_with_shutdown(
    provider: &Arc<ScriptedProvider>,
    source: &MemoryRecordSource,
    config: &EngineConfig,
    record_types: &[&str],
) -> (BatchRunner, watch::Sender<bool>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (reconciler, _events) = reconciler(provider, config);
    let runner = BatchRunner::new(
        Box::new(source.clone()),
        reconciler.with_shutdown(shutdown_rx),
        record_types.iter().map(|t| t.to_string()).collect(),
    );
    (runner, shutdown_tx)
}

/// A plain A record
pub fn a_record(name: &str, content: &str) -> CanonicalRecord {
    CanonicalRecord {
        name: name.to_string(),
        record_type: RecordType::A,
        content: content.to_string(),
        ttl: 300,
        proxied: false,
        comment: "Managed by dnsrec".to_string(),
        import_id: None,
    }
}

/// The transient sentinel
pub fn deadline() -> Error {
    Error::deadline_exceeded("provider communication deadline exceeded")
}
