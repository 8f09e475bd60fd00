//! Core reconciler
//!
//! The Reconciler is responsible for:
//! - Checking whether a canonical record already exists at the provider
//! - Creating it when it does not
//! - Retrying creation on transient provider failures with bounded backoff
//! - Reporting exactly one [`RecordOutcome`] per record
//!
//! ## State Machine
//!
//! ```text
//! Start ──▶ Checking ──found──▶ Skipped
//!              │
//!              ├──error──▶ Failed (no create call)
//!              │
//!              └──absent──▶ Creating ──ok──▶ Created
//!                              │  ▲
//!                  transient,  │  │ wait attempt × unit
//!                  attempts    ▼  │
//!                  left      RetryWait
//!                              │
//!                  permanent / exhausted / cancelled ──▶ Failed
//! ```
//!
//! Attempts for one record are strictly sequential and the wait after
//! attempt `n` is exactly `n × backoff_unit`, so behaviour is reproducible.

pub mod existence;

pub use existence::{Existence, ExistenceChecker};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::Error;
use crate::record::{CanonicalRecord, RecordType};
use crate::traits::{CreatedRecord, DnsProvider};

/// Why a record was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A record with the same name and type is already present
    AlreadyExists,
    /// The record's `import_id` matched an existing remote record
    Imported,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyExists => f.write_str("already exists"),
            SkipReason::Imported => f.write_str("imported"),
        }
    }
}

/// Final status of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// The provider created the record
    Created(CreatedRecord),
    /// No create call was made
    Skipped(SkipReason),
    /// The record could not be reconciled
    Failed(Error),
}

/// Result of reconciling one canonical record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    /// The record that was reconciled
    pub record: CanonicalRecord,
    /// What happened
    pub status: OutcomeStatus,
    /// Number of create calls made
    pub attempts: u32,
}

impl RecordOutcome {
    fn new(record: CanonicalRecord, status: OutcomeStatus, attempts: u32) -> Self {
        Self {
            record,
            status,
            attempts,
        }
    }

    /// Whether the record was created in this run
    pub fn is_created(&self) -> bool {
        matches!(self.status, OutcomeStatus::Created(_))
    }

    /// Whether the record was skipped
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, OutcomeStatus::Skipped(_))
    }

    /// Whether the record failed
    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed(_))
    }
}

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Existence check started
    CheckStarted {
        name: String,
        record_type: RecordType,
    },

    /// Record left alone
    Skipped {
        name: String,
        record_type: RecordType,
        reason: SkipReason,
    },

    /// Create call about to be made
    CreateAttempted {
        name: String,
        record_type: RecordType,
        attempt: u32,
    },

    /// Transient failure, waiting before the next attempt
    RetryScheduled {
        name: String,
        record_type: RecordType,
        attempt: u32,
        delay: Duration,
    },

    /// Record created
    Created {
        name: String,
        record_type: RecordType,
        id: String,
    },

    /// Record failed
    Failed {
        name: String,
        record_type: RecordType,
        error: String,
        attempts: u32,
    },
}

/// Bounded, linear retry schedule for create calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum create attempts, including the first
    pub max_attempts: u32,
    /// Wait after attempt `n` is `n` of these
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts,
            backoff_unit,
        }
    }

    /// Wait before the attempt following `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt)
    }

    /// Whether a failure on `attempt` (1-based) earns another try
    pub fn should_retry(&self, attempt: u32, error: &Error) -> bool {
        error.is_transient() && attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self::new(engine.max_attempts, engine.backoff_unit())
    }
}

impl From<&EngineConfig> for RetryPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self::new(config.max_attempts, config.backoff_unit())
    }
}

/// Per-record reconciliation core
///
/// Holds an explicit provider handle; there is no process-wide provider.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Optionally attach a shutdown signal with [`Reconciler::with_shutdown()`]
/// 3. Call [`Reconciler::reconcile()`] once per canonical record
pub struct Reconciler {
    /// DNS provider for queries and creation
    provider: Arc<dyn DnsProvider>,

    /// Existence checker (shares the provider handle)
    checker: ExistenceChecker,

    /// Retry schedule for create calls
    policy: RetryPolicy,

    /// Zone the records belong to
    zone_id: String,

    /// Shutdown signal; `true` means stop
    shutdown: Option<watch::Receiver<bool>>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `zone_id`: zone to reconcile into
    /// - `config`: engine settings (retry policy, existence strategy)
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields reconcile events
    pub fn new(
        provider: Arc<dyn DnsProvider>,
        zone_id: impl Into<String>,
        config: &EngineConfig,
    ) -> crate::Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let zone_id = zone_id.into();
        if zone_id.trim().is_empty() {
            return Err(Error::config("Zone ID cannot be empty"));
        }

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let reconciler = Self {
            checker: ExistenceChecker::new(Arc::clone(&provider), config.existence_check),
            provider,
            policy: RetryPolicy::from(config),
            zone_id,
            shutdown: None,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Attach a shutdown signal
    ///
    /// Once the watched value becomes `true`, pending backoff waits end
    /// early and new records are not started.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// The retry policy in use
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// The zone being reconciled
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Whether shutdown has been requested
    pub fn is_cancelled(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Reconcile one record
    ///
    /// Never returns an error: every failure ends up in the outcome.
    pub async fn reconcile(&self, record: CanonicalRecord) -> RecordOutcome {
        if self.is_cancelled() {
            return self.fail(record, Error::cancelled("shutdown requested before start"), 0);
        }

        self.emit_event(ReconcileEvent::CheckStarted {
            name: record.name.clone(),
            record_type: record.record_type,
        });

        match self.checker.check(&self.zone_id, &record).await {
            Ok(Existence::Found) => self.skip(record, SkipReason::AlreadyExists),
            Ok(Existence::Imported) => self.skip(record, SkipReason::Imported),
            Ok(Existence::Absent) => self.create_with_retry(record).await,
            Err(e) => {
                error!(
                    "Existence check failed for {} ({}), not creating: {}",
                    record.name, record.record_type, e
                );
                self.fail(record, e, 0)
            }
        }
    }

    /// Create a record, retrying transient failures
    async fn create_with_retry(&self, record: CanonicalRecord) -> RecordOutcome {
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);

            self.emit_event(ReconcileEvent::CreateAttempted {
                name: record.name.clone(),
                record_type: record.record_type,
                attempt,
            });

            match self.provider.create_record(&self.zone_id, &record).await {
                Ok(created) => {
                    info!(
                        "Created {} record {} -> {} (id: {}, attempt {})",
                        record.record_type, created.hostname, record.content, created.id, attempt
                    );
                    self.emit_event(ReconcileEvent::Created {
                        name: record.name.clone(),
                        record_type: record.record_type,
                        id: created.id.clone(),
                    });
                    return RecordOutcome::new(record, OutcomeStatus::Created(created), attempt);
                }
                Err(e) if self.policy.should_retry(attempt, &e) => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        "Create attempt {}/{} for {} failed transiently: {}. Retrying in {:?}",
                        attempt, self.policy.max_attempts, record.name, e, delay
                    );
                    self.emit_event(ReconcileEvent::RetryScheduled {
                        name: record.name.clone(),
                        record_type: record.record_type,
                        attempt,
                        delay,
                    });

                    if let Err(cancelled) = self.wait(delay).await {
                        warn!("Retry of {} abandoned: {}", record.name, cancelled);
                        return self.fail(record, cancelled, attempt);
                    }
                }
                Err(e) => {
                    if e.is_transient() {
                        error!(
                            "Giving up on {} after {} attempts: {}",
                            record.name, attempt, e
                        );
                    } else {
                        error!("Failed to create {}: {}", record.name, e);
                    }
                    return self.fail(record, e, attempt);
                }
            }
        }
    }

    /// Wait out a backoff delay, ending early on shutdown
    async fn wait(&self, delay: Duration) -> crate::Result<()> {
        let deadline = tokio::time::Instant::now() + delay;

        let Some(shutdown) = self.shutdown.as_ref() else {
            tokio::time::sleep_until(deadline).await;
            return Ok(());
        };

        let mut shutdown = shutdown.clone();
        let cancelled = tokio::select! {
            _ = tokio::time::sleep_until(deadline) => false,
            stopped = shutdown.wait_for(|stop| *stop) => stopped.is_ok(),
        };

        if cancelled {
            return Err(Error::cancelled("shutdown requested during retry backoff"));
        }

        // Sender gone before the deadline: nobody can cancel any more
        tokio::time::sleep_until(deadline).await;
        Ok(())
    }

    fn skip(&self, record: CanonicalRecord, reason: SkipReason) -> RecordOutcome {
        warn!(
            "{} record {} {}, skipping",
            record.record_type, record.name, reason
        );
        self.emit_event(ReconcileEvent::Skipped {
            name: record.name.clone(),
            record_type: record.record_type,
            reason,
        });
        RecordOutcome::new(record, OutcomeStatus::Skipped(reason), 0)
    }

    fn fail(&self, record: CanonicalRecord, error: Error, attempts: u32) -> RecordOutcome {
        self.emit_event(ReconcileEvent::Failed {
            name: record.name.clone(),
            record_type: record.record_type,
            error: error.to_string(),
            attempts,
        });
        RecordOutcome::new(record, OutcomeStatus::Failed(error), attempts)
    }

    /// Emit a reconcile event
    fn emit_event(&self, event: ReconcileEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, event discarded");
            }
        }
    }
}
