//! Record normalization
//!
//! Desired records arrive from a [`RecordSource`](crate::traits::RecordSource)
//! as untyped mappings ([`RawSpec`]). [`normalize`] is the only place they are
//! interpreted: it applies defaults, enforces the proxied/TTL rule and turns
//! every shape problem into [`Error::InvalidSpec`]. Nothing downstream of this
//! module sees a `RawSpec`.
//!
//! ```text
//! RawSpec + "arecord" ──normalize──▶ CanonicalRecord { type: A, ttl: 300, .. }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Comment attached to records that do not carry their own
pub const DEFAULT_COMMENT: &str = "Managed by dnsrec";

/// TTL used when the spec does not name one
pub const DEFAULT_TTL: u32 = 300;

/// The only TTL the provider accepts for proxied records ("automatic")
pub const PROXIED_TTL: u32 = 1;

/// Suffix stripped from a record-type context to derive the DNS type
const CONTEXT_QUALIFIER: &str = "record";

/// DNS record types the reconciler manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// Address record (IPv4)
    A,
    /// Canonical name (alias to another hostname)
    Cname,
}

impl RecordType {
    /// Wire name as used by provider APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Cname => "CNAME",
        }
    }

    /// Derive the record type from a record-type context such as `arecord`
    ///
    /// The context is upper-cased after dropping a trailing `record`
    /// qualifier, so `arecord` → `A` and `cname` → `CNAME`.
    pub fn from_context(context: &str) -> Result<Self> {
        let trimmed = context.trim();
        let lower = trimmed.to_ascii_lowercase();
        let base = lower
            .strip_suffix(CONTEXT_QUALIFIER)
            .filter(|rest| !rest.is_empty())
            .unwrap_or(&lower);

        base.parse()
            .map_err(|_| Error::invalid_spec(format!("Unsupported record type context: {}", context)))
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "CNAME" => Ok(RecordType::Cname),
            other => Err(Error::invalid_spec(format!(
                "Unsupported record type: {} (supported: A, CNAME)",
                other
            ))),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A desired record exactly as the source supplied it
///
/// Recognised keys: `name` (required), `content` or `value`, `ttl`,
/// `proxied`, `comment`, `type`, `import_id`. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSpec(Value);

impl RawSpec {
    /// Wrap an arbitrary value; shape is checked by [`normalize`]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Best-effort name for log lines, before validation
    pub fn display_name(&self) -> &str {
        self.0
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
    }

    fn optional_str(&self, key: &str) -> Result<Option<&str>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(Error::invalid_spec(format!(
                "'{}' must be a string, got {}",
                key, other
            ))),
        }
    }

    fn optional_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(Error::invalid_spec(format!(
                "'{}' must be a boolean, got {}",
                key, other
            ))),
        }
    }

    fn optional_ttl(&self) -> Result<Option<u32>> {
        match self.0.get("ttl") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|ttl| u32::try_from(ttl).ok())
                .filter(|ttl| *ttl >= 1)
                .map(Some)
                .ok_or_else(|| Error::invalid_spec(format!("'ttl' must be a positive integer, got {}", n))),
            Some(other) => Err(Error::invalid_spec(format!(
                "'ttl' must be a positive integer, got {}",
                other
            ))),
        }
    }
}

impl From<Value> for RawSpec {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// A validated desired record
///
/// Built once by [`normalize`] and never mutated. `proxied` implies
/// `ttl == 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Record name (FQDN or name relative to the zone)
    pub name: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Record content (address for A, target hostname for CNAME)
    pub content: String,
    /// Time-to-live in seconds (1 means "automatic")
    pub ttl: u32,
    /// Whether traffic is proxied through the provider
    pub proxied: bool,
    /// Free-form comment stored with the record
    pub comment: String,
    /// Identifier of an existing remote record to adopt instead of creating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_id: Option<String>,
}

/// Turn a raw spec into a canonical record
///
/// # Parameters
///
/// - `spec`: the raw mapping from the source
/// - `context`: the record-type context it was loaded under (e.g. `arecord`)
///
/// # Returns
///
/// - `Ok(CanonicalRecord)`: defaults applied, invariants hold
/// - `Err(Error::InvalidSpec)`: missing name/content or a badly shaped field
pub fn normalize(spec: &RawSpec, context: &str) -> Result<CanonicalRecord> {
    if !spec.as_value().is_object() {
        return Err(Error::invalid_spec(format!(
            "Record spec must be a mapping, got {}",
            spec.as_value()
        )));
    }

    let name = spec
        .optional_str("name")?
        .ok_or_else(|| Error::invalid_spec("Record spec is missing 'name'"))?;

    let content = match spec.optional_str("content")? {
        Some(content) => content,
        None => spec.optional_str("value")?.ok_or_else(|| {
            Error::invalid_spec(format!("Record '{}' is missing 'content' or 'value'", name))
        })?,
    };

    let record_type = match spec.optional_str("type")? {
        Some(explicit) => explicit.parse()?,
        None => RecordType::from_context(context)?,
    };

    // A proxied record ignores whatever ttl was supplied
    let proxied = spec.optional_bool("proxied")?.unwrap_or(false);
    let ttl = if proxied {
        PROXIED_TTL
    } else {
        spec.optional_ttl()?.unwrap_or(DEFAULT_TTL)
    };

    let comment = spec
        .optional_str("comment")?
        .unwrap_or(DEFAULT_COMMENT)
        .to_string();

    Ok(CanonicalRecord {
        name: name.trim().to_string(),
        record_type,
        content: content.trim().to_string(),
        ttl,
        proxied,
        comment,
        import_id: spec.optional_str("import_id")?.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_from_context() {
        assert_eq!(RecordType::from_context("arecord").unwrap(), RecordType::A);
        assert_eq!(RecordType::from_context("ARecord").unwrap(), RecordType::A);
        assert_eq!(RecordType::from_context("cname").unwrap(), RecordType::Cname);
        assert_eq!(RecordType::from_context("cnamerecord").unwrap(), RecordType::Cname);
        assert!(RecordType::from_context("mxrecord").is_err());
        assert!(RecordType::from_context("record").is_err());
    }

    #[test]
    fn test_defaults_applied() {
        let spec = RawSpec::new(json!({ "name": "www.example.com", "content": "203.0.113.10" }));
        let record = normalize(&spec, "arecord").unwrap();

        assert_eq!(record.record_type, RecordType::A);
        assert_eq!(record.ttl, DEFAULT_TTL);
        assert!(!record.proxied);
        assert_eq!(record.comment, DEFAULT_COMMENT);
        assert_eq!(record.import_id, None);
    }

    #[test]
    fn test_proxied_forces_ttl_one() {
        let spec = RawSpec::new(json!({
            "name": "api.example.com",
            "content": "203.0.113.5",
            "proxied": true,
            "ttl": 3600,
        }));
        let record = normalize(&spec, "arecord").unwrap();

        assert!(record.proxied);
        assert_eq!(record.ttl, 1);
    }

    #[test]
    fn test_proxied_ttl_holds_for_any_supplied_ttl() {
        for ttl in [
            json!(null),
            json!(0),
            json!(1),
            json!(120),
            json!(86400),
            json!(-5),
            json!("auto"),
        ] {
            let spec = RawSpec::new(json!({
                "name": "a.example.com",
                "content": "198.51.100.1",
                "proxied": true,
                "ttl": ttl,
            }));
            let record = normalize(&spec, "arecord").unwrap();
            assert_eq!(record.ttl, PROXIED_TTL, "ttl {} must collapse to 1", ttl);
        }
    }

    #[test]
    fn test_unproxied_keeps_supplied_ttl() {
        let spec = RawSpec::new(json!({ "name": "a.example.com", "content": "198.51.100.1", "ttl": 3600 }));
        assert_eq!(normalize(&spec, "arecord").unwrap().ttl, 3600);
    }

    #[test]
    fn test_unproxied_ttl_zero_is_invalid() {
        for proxied in [json!(false), json!(null)] {
            let spec = RawSpec::new(json!({
                "name": "a.example.com",
                "content": "198.51.100.1",
                "proxied": proxied,
                "ttl": 0,
            }));
            assert!(matches!(normalize(&spec, "arecord"), Err(Error::InvalidSpec(_))));
        }
    }

    #[test]
    fn test_value_is_content_fallback() {
        let spec = RawSpec::new(json!({ "name": "docs", "value": "docs.example.net" }));
        let record = normalize(&spec, "cname").unwrap();

        assert_eq!(record.record_type, RecordType::Cname);
        assert_eq!(record.content, "docs.example.net");
    }

    #[test]
    fn test_content_wins_over_value() {
        let spec = RawSpec::new(json!({ "name": "x", "content": "1.1.1.1", "value": "2.2.2.2" }));
        assert_eq!(normalize(&spec, "arecord").unwrap().content, "1.1.1.1");
    }

    #[test]
    fn test_explicit_type_overrides_context() {
        let spec = RawSpec::new(json!({ "name": "alias", "content": "target.example.com", "type": "cname" }));
        assert_eq!(normalize(&spec, "arecord").unwrap().record_type, RecordType::Cname);
    }

    #[test]
    fn test_missing_content_is_invalid() {
        let spec = RawSpec::new(json!({ "name": "empty.example.com" }));
        let err = normalize(&spec, "arecord").unwrap_err();
        assert!(matches!(err, Error::InvalidSpec(_)));

        let blank = RawSpec::new(json!({ "name": "blank.example.com", "content": "  " }));
        assert!(matches!(normalize(&blank, "arecord"), Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_missing_name_is_invalid() {
        let spec = RawSpec::new(json!({ "content": "203.0.113.1" }));
        assert!(matches!(normalize(&spec, "arecord"), Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_wrong_shapes_are_invalid() {
        let cases = [
            json!("just-a-string"),
            json!({ "name": "a", "content": "1.2.3.4", "ttl": "soon" }),
            json!({ "name": "a", "content": "1.2.3.4", "ttl": 0 }),
            json!({ "name": "a", "content": "1.2.3.4", "proxied": "yes" }),
            json!({ "name": 42, "content": "1.2.3.4" }),
            json!({ "name": "a", "content": "1.2.3.4", "type": "MX" }),
        ];

        for case in cases {
            let spec = RawSpec::new(case.clone());
            assert!(
                matches!(normalize(&spec, "arecord"), Err(Error::InvalidSpec(_))),
                "expected InvalidSpec for {}",
                case
            );
        }
    }

    #[test]
    fn test_import_id_carried() {
        let spec = RawSpec::new(json!({
            "name": "legacy.example.com",
            "content": "192.0.2.1",
            "import_id": "372e67954025e0ba6aaa6d586b9e0b59",
        }));
        let record = normalize(&spec, "arecord").unwrap();
        assert_eq!(record.import_id.as_deref(), Some("372e67954025e0ba6aaa6d586b9e0b59"));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(RawSpec::new(json!({ "name": "n" })).display_name(), "n");
        assert_eq!(RawSpec::new(json!([])).display_name(), "<unnamed>");
    }
}
