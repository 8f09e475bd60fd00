//! Existence checking
//!
//! Answers one question before any create call: does the zone already hold a
//! record with this name and type? The answer comes from the provider on
//! every run; nothing is cached.
//!
//! A provider failure is returned as `Err`, never folded into
//! [`Existence::Absent`]. Reading an outage as "absent" would let the
//! reconciler create a duplicate.

use std::sync::Arc;

use tracing::debug;

use crate::config::ExistenceCheck;
use crate::error::Result;
use crate::record::CanonicalRecord;
use crate::traits::DnsProvider;

/// What the provider reported about a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    /// A record with this name and type exists
    Found,
    /// The record's `import_id` resolved to an existing remote record
    Imported,
    /// The provider answered and holds no such record (or checking is disabled)
    Absent,
}

/// Queries the provider for existing records
#[derive(Clone)]
pub struct ExistenceChecker {
    provider: Arc<dyn DnsProvider>,
    strategy: ExistenceCheck,
}

impl ExistenceChecker {
    /// Create a checker using the given strategy
    pub fn new(provider: Arc<dyn DnsProvider>, strategy: ExistenceCheck) -> Self {
        Self { provider, strategy }
    }

    /// The configured strategy
    pub fn strategy(&self) -> ExistenceCheck {
        self.strategy
    }

    /// Check whether `record` already exists in `zone_id`
    ///
    /// # Returns
    ///
    /// - `Ok(Existence)`: the provider gave a definite answer
    /// - `Err(Error)`: the provider could not answer
    pub async fn check(&self, zone_id: &str, record: &CanonicalRecord) -> Result<Existence> {
        if let Some(import_id) = record.import_id.as_deref() {
            match self.provider.get_record_by_id(zone_id, import_id).await {
                Ok(remote) => {
                    debug!(
                        "Import ID {} resolved to {} ({})",
                        import_id, remote.name, remote.record_type
                    );
                    return Ok(Existence::Imported);
                }
                Err(e) if e.is_not_found() => {
                    debug!(
                        "Import ID {} not found for {}, falling back to {:?} check",
                        import_id, record.name, self.strategy
                    );
                }
                Err(e) => return Err(e),
            }
        }

        match self.strategy {
            ExistenceCheck::Filter => {
                let found = self
                    .provider
                    .find_by_name_and_type(zone_id, &record.name, record.record_type)
                    .await?;
                Ok(if found { Existence::Found } else { Existence::Absent })
            }
            ExistenceCheck::CompositeKey => {
                match self
                    .provider
                    .get_by_composite_key(zone_id, record.record_type, &record.name)
                    .await
                {
                    Ok(_) => Ok(Existence::Found),
                    Err(e) if e.is_not_found() => Ok(Existence::Absent),
                    Err(e) => Err(e),
                }
            }
            ExistenceCheck::Disabled => {
                debug!("Existence check disabled for {}", record.name);
                Ok(Existence::Absent)
            }
        }
    }
}
