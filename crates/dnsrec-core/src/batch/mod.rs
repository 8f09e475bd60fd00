//! Batch aggregation
//!
//! [`BatchRunner`] drives a whole run: for every configured record type it
//! loads the desired specs, normalizes each one and hands it to the
//! [`Reconciler`], strictly in source order. No single record can abort the
//! run; the result is always a complete [`RunReport`].
//!
//! ## Reported conditions per record type
//!
//! | Condition      | Meaning                                        | Log level |
//! |----------------|------------------------------------------------|-----------|
//! | `SourceMissing`| nothing declared for the type                  | warn      |
//! | `SourceFailed` | declared but unreadable                        | error     |
//! | `NothingToDo`  | declared, zero specs                           | info      |
//! | `Created`      | at least one record created                    | info      |
//! | `NoneCreated`  | specs present, none created                    | warn      |

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::engine::{OutcomeStatus, RecordOutcome, Reconciler};
use crate::error::Error;
use crate::record::normalize;
use crate::traits::RecordSource;

/// Externally visible result for one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Record-type key (e.g. `arecord`)
    pub record_type: String,
    /// Number of records created in this run
    pub created_count: usize,
    /// Names of the created records, in source order
    pub created_names: Vec<String>,
    /// Provider IDs of the created records, parallel to `created_names`
    pub created_ids: Vec<String>,
    /// Fully qualified names the provider stored, parallel to `created_names`
    pub created_fqdns: Vec<String>,
}

/// A spec rejected by the normalizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntry {
    /// Position in the source (0-based)
    pub index: usize,
    /// Name as far as it could be read
    pub name: String,
    /// Why it was rejected
    pub error: Error,
}

/// How a record type's batch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchCondition {
    /// The source has nothing for this record type
    SourceMissing,
    /// The source exists but could not be loaded
    SourceFailed,
    /// The source declared zero records
    NothingToDo,
    /// At least one record was created
    Created {
        /// Records created
        created: usize,
    },
    /// Records were declared but none were created
    NoneCreated {
        /// Records skipped because they already exist
        skipped: usize,
        /// Records whose reconciliation failed
        failed: usize,
        /// Specs rejected by the normalizer
        invalid: usize,
    },
}

/// Full outcome for one record type
#[derive(Debug, Clone)]
pub struct TypeReport {
    /// Record-type key
    pub record_type: String,
    /// Number of specs the source supplied
    pub input_count: usize,
    /// One outcome per valid spec, in source order
    pub outcomes: Vec<RecordOutcome>,
    /// Specs rejected before reconciliation
    pub invalid: Vec<InvalidEntry>,
    /// Source load failure, if any
    pub source_error: Option<Error>,
    /// Overall condition
    pub condition: BatchCondition,
}

impl TypeReport {
    fn source_missing(record_type: &str) -> Self {
        Self {
            record_type: record_type.to_string(),
            input_count: 0,
            outcomes: Vec::new(),
            invalid: Vec::new(),
            source_error: None,
            condition: BatchCondition::SourceMissing,
        }
    }

    fn source_failed(record_type: &str, error: Error) -> Self {
        Self {
            record_type: record_type.to_string(),
            input_count: 0,
            outcomes: Vec::new(),
            invalid: Vec::new(),
            source_error: Some(error),
            condition: BatchCondition::SourceFailed,
        }
    }

    fn from_results(
        record_type: &str,
        input_count: usize,
        outcomes: Vec<RecordOutcome>,
        invalid: Vec<InvalidEntry>,
    ) -> Self {
        let created = outcomes.iter().filter(|o| o.is_created()).count();
        let condition = if input_count == 0 {
            BatchCondition::NothingToDo
        } else if created > 0 {
            BatchCondition::Created { created }
        } else {
            BatchCondition::NoneCreated {
                skipped: outcomes.iter().filter(|o| o.is_skipped()).count(),
                failed: outcomes.iter().filter(|o| o.is_failed()).count(),
                invalid: invalid.len(),
            }
        };

        Self {
            record_type: record_type.to_string(),
            input_count,
            outcomes,
            invalid,
            source_error: None,
            condition,
        }
    }

    /// Created-record tally for this type
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            record_type: self.record_type.clone(),
            created_count: 0,
            created_names: Vec::new(),
            created_ids: Vec::new(),
            created_fqdns: Vec::new(),
        };

        for outcome in &self.outcomes {
            if let OutcomeStatus::Created(created) = &outcome.status {
                summary.created_names.push(outcome.record.name.clone());
                summary.created_ids.push(created.id.clone());
                summary.created_fqdns.push(created.hostname.clone());
            }
        }
        summary.created_count = summary.created_names.len();
        summary
    }

    /// Whether anything in this type went wrong (not counting skips)
    pub fn has_failures(&self) -> bool {
        self.source_error.is_some()
            || !self.invalid.is_empty()
            || self.outcomes.iter().any(RecordOutcome::is_failed)
    }
}

/// Result of a whole run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Per-type reports in configured order
    pub types: Vec<TypeReport>,
    /// Whether the run was cut short by shutdown
    pub cancelled: bool,
}

impl RunReport {
    /// Summaries for every record type
    pub fn summaries(&self) -> Vec<BatchSummary> {
        self.types.iter().map(TypeReport::summary).collect()
    }

    /// Records created across all types
    pub fn total_created(&self) -> usize {
        self.types.iter().map(|t| t.summary().created_count).sum()
    }

    /// Whether any record type reported a failure
    pub fn has_failures(&self) -> bool {
        self.types.iter().any(TypeReport::has_failures)
    }

    /// Report for one record type
    pub fn get(&self, record_type: &str) -> Option<&TypeReport> {
        self.types.iter().find(|t| t.record_type == record_type)
    }

    /// Exported output values
    ///
    /// Per record type: `{type}_records_created`, `{type}_records` (names as
    /// declared), `{type}_record_ids` and `{type}_record_fqdns` (as the
    /// provider reported them). Plus `total_records_created` across all types.
    pub fn exports(&self) -> Map<String, Value> {
        let mut exports = Map::new();
        for summary in self.summaries() {
            exports.insert(
                format!("{}_records_created", summary.record_type),
                Value::from(summary.created_count),
            );
            exports.insert(
                format!("{}_records", summary.record_type),
                Value::from(summary.created_names),
            );
            exports.insert(
                format!("{}_record_ids", summary.record_type),
                Value::from(summary.created_ids),
            );
            exports.insert(
                format!("{}_record_fqdns", summary.record_type),
                Value::from(summary.created_fqdns),
            );
        }
        exports.insert(
            "total_records_created".to_string(),
            Value::from(self.total_created()),
        );
        exports
    }
}

/// Runs the reconciler over every configured record type
pub struct BatchRunner {
    source: Box<dyn RecordSource>,
    reconciler: Reconciler,
    record_types: Vec<String>,
}

impl BatchRunner {
    /// Create a new batch runner
    ///
    /// # Parameters
    ///
    /// - `source`: where desired records come from
    /// - `reconciler`: per-record core
    /// - `record_types`: record-type keys, processed in this order
    pub fn new(
        source: Box<dyn RecordSource>,
        reconciler: Reconciler,
        record_types: Vec<String>,
    ) -> Self {
        Self {
            source,
            reconciler,
            record_types,
        }
    }

    /// The reconciler in use
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Run every record type once
    pub async fn run(&self) -> RunReport {
        let started_at = Utc::now();
        info!(
            "Reconciling {} record type(s) in zone {} via {} (source: {})",
            self.record_types.len(),
            self.reconciler.zone_id(),
            self.reconciler.provider_name(),
            self.source.source_name()
        );

        let mut types = Vec::with_capacity(self.record_types.len());
        for record_type in &self.record_types {
            types.push(self.run_type(record_type).await);
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            types,
            cancelled: self.reconciler.is_cancelled(),
        };

        info!(
            "Run finished: {} record(s) created across {} type(s)",
            report.total_created(),
            report.types.len()
        );
        report
    }

    /// Run one record type
    pub async fn run_type(&self, record_type: &str) -> TypeReport {
        let specs = match self.source.load(record_type).await {
            Ok(Some(specs)) => specs,
            Ok(None) => {
                warn!("No desired records found for {}, nothing to reconcile", record_type);
                return TypeReport::source_missing(record_type);
            }
            Err(e) => {
                error!("Failed to load desired records for {}: {}", record_type, e);
                return TypeReport::source_failed(record_type, e);
            }
        };

        let mut outcomes = Vec::with_capacity(specs.len());
        let mut invalid = Vec::new();

        for (index, spec) in specs.iter().enumerate() {
            match normalize(spec, record_type) {
                Ok(record) => outcomes.push(self.reconciler.reconcile(record).await),
                Err(e) => {
                    error!(
                        "Skipping invalid {} entry #{} ({}): {}",
                        record_type,
                        index,
                        spec.display_name(),
                        e
                    );
                    invalid.push(InvalidEntry {
                        index,
                        name: spec.display_name().to_string(),
                        error: e,
                    });
                }
            }
        }

        let report = TypeReport::from_results(record_type, specs.len(), outcomes, invalid);
        match report.condition {
            BatchCondition::NothingToDo => {
                info!("{}: source declares no records", record_type);
            }
            BatchCondition::Created { created } => {
                info!("{}: created {} of {} record(s)", record_type, created, report.input_count);
            }
            BatchCondition::NoneCreated { skipped, failed, invalid } => {
                warn!(
                    "{}: no records processed successfully ({} skipped, {} failed, {} invalid)",
                    record_type, skipped, failed, invalid
                );
            }
            BatchCondition::SourceMissing | BatchCondition::SourceFailed => {}
        }
        report
    }
}
