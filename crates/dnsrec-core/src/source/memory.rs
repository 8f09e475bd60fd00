// # Memory Record Source
//
// In-memory implementation of RecordSource.
//
// ## Purpose
//
// Holds desired records supplied programmatically. Useful for embedding the
// reconciler as a library and for tests.
//
// ## Semantics
//
// - A record type that was never inserted answers `None` (no source)
// - A record type inserted with an empty list answers `Some(vec![])`
// - Order of specs is insertion order

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::record::RawSpec;
use crate::traits::RecordSource;
use crate::Error;

/// In-memory record source implementation
///
/// # Example
///
/// ```rust,no_run
/// use dnsrec_core::source::MemoryRecordSource;
/// use dnsrec_core::traits::RecordSource;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = MemoryRecordSource::new();
///     source
///         .push("arecord", serde_json::json!({ "name": "www", "content": "192.0.2.1" }))
///         .await;
///
///     let specs = source.load("arecord").await?;
///     assert_eq!(specs.map(|s| s.len()), Some(1));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    inner: Arc<RwLock<HashMap<String, Vec<RawSpec>>>>,
}

impl MemoryRecordSource {
    /// Create a new empty memory record source
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all specs for a record type
    pub async fn set(&self, record_type: &str, specs: Vec<RawSpec>) {
        let mut guard = self.inner.write().await;
        guard.insert(record_type.to_string(), specs);
    }

    /// Append one spec to a record type
    pub async fn push(&self, record_type: &str, spec: impl Into<RawSpec>) {
        let mut guard = self.inner.write().await;
        guard
            .entry(record_type.to_string())
            .or_default()
            .push(spec.into());
    }

    /// Forget a record type entirely
    pub async fn remove(&self, record_type: &str) {
        let mut guard = self.inner.write().await;
        guard.remove(record_type);
    }

    /// Record types currently held
    pub async fn record_types(&self) -> Vec<String> {
        let guard = self.inner.read().await;
        guard.keys().cloned().collect()
    }
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn load(&self, record_type: &str) -> Result<Option<Vec<RawSpec>>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(record_type).cloned())
    }

    fn source_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unknown_type_is_none() {
        let source = MemoryRecordSource::new();
        assert_eq!(source.load("arecord").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_push_keeps_order() {
        let source = MemoryRecordSource::new();
        source.push("arecord", json!({ "name": "one", "content": "192.0.2.1" })).await;
        source.push("arecord", json!({ "name": "two", "content": "192.0.2.2" })).await;

        let specs = source.load("arecord").await.unwrap().unwrap();
        let names: Vec<&str> = specs.iter().map(RawSpec::display_name).collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_empty_list_is_some() {
        let source = MemoryRecordSource::new();
        source.set("cname", Vec::new()).await;

        assert_eq!(source.load("cname").await.unwrap(), Some(Vec::new()));

        source.remove("cname").await;
        assert_eq!(source.load("cname").await.unwrap(), None);
    }
}
