// # YAML Record Source
//
// Reads desired records from a directory of YAML files, one file per
// record-type key:
//
// ```text
// records/
// ├── arecord.yaml
// └── cname.yml
// ```
//
// Each file holds a sequence of mappings:
//
// ```yaml
// - name: api.example.com
//   content: 203.0.113.5
//   proxied: true
// - name: mail.example.com
//   value: 198.51.100.25
//   ttl: 3600
// ```
//
// ## Semantics
//
// - No file for the type: `None` (nothing declared, not an error)
// - Empty file or a bare `null`/`~`: `Some(vec![])`
// - Unreadable file, invalid YAML, or a document that is not a sequence:
//   `Error::Source`
//
// Entries are passed through untouched; validating their fields is the
// normalizer's job. An entry that has no JSON shape (a mapping with a
// sequence as key, say) is replaced by a string describing it, which the
// normalizer then rejects on its own without failing its neighbours.

use async_trait::async_trait;
use dnsrec_core::config::SourceConfig;
use dnsrec_core::record::RawSpec;
use dnsrec_core::traits::{RecordSource, RecordSourceFactory};
use dnsrec_core::{Error, ProviderRegistry, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File extensions tried, in order
const EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Record source backed by a directory of YAML files
#[derive(Debug, Clone)]
pub struct YamlRecordSource {
    directory: PathBuf,
}

impl YamlRecordSource {
    /// Create a source reading from `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Directory being read
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Read the first existing file for a record type
    async fn read_file(&self, record_type: &str) -> Result<Option<(PathBuf, String)>> {
        for ext in EXTENSIONS {
            let path = self.directory.join(format!("{}.{}", record_type, ext));
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => return Ok(Some((path, content))),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(Error::source(format!(
                        "failed to read {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
        Ok(None)
    }
}

/// Parse a YAML document into raw specs
fn parse_specs(content: &str, path: &Path) -> Result<Vec<RawSpec>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: Option<Vec<serde_yaml::Value>> = serde_yaml::from_str(content)
        .map_err(|e| Error::source(format!("{}: {}", path.display(), e)))?;

    Ok(entries
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, entry)| convert_entry(index, entry, path))
        .collect())
}

/// Convert one YAML entry, keeping unconvertible entries as a rejectable marker
fn convert_entry(index: usize, entry: &serde_yaml::Value, path: &Path) -> RawSpec {
    match serde_json::to_value(entry) {
        Ok(value) => RawSpec::new(value),
        Err(e) => {
            tracing::warn!(
                "Entry {} in {} cannot be represented: {}",
                index,
                path.display(),
                e
            );
            RawSpec::new(serde_json::Value::String(format!(
                "unrepresentable entry {}: {}",
                index, e
            )))
        }
    }
}

#[async_trait]
impl RecordSource for YamlRecordSource {
    async fn load(&self, record_type: &str) -> Result<Option<Vec<RawSpec>>> {
        if record_type.is_empty()
            || record_type.contains(['/', '\\'])
            || record_type.contains("..")
        {
            return Err(Error::source(format!(
                "record type '{}' is not a valid file name",
                record_type
            )));
        }

        let Some((path, content)) = self.read_file(record_type).await? else {
            tracing::debug!(
                "No {} file for {} in {}",
                EXTENSIONS.join("/"),
                record_type,
                self.directory.display()
            );
            return Ok(None);
        };

        let specs = parse_specs(&content, &path)?;
        tracing::debug!("Loaded {} spec(s) from {}", specs.len(), path.display());
        Ok(Some(specs))
    }

    fn source_name(&self) -> &'static str {
        "yaml"
    }
}

/// Factory for creating YAML record sources
pub struct YamlFactory;

impl RecordSourceFactory for YamlFactory {
    fn create(&self, config: &SourceConfig) -> Result<Box<dyn RecordSource>> {
        match config {
            SourceConfig::Yaml { directory } => {
                if directory.is_empty() {
                    return Err(Error::config("YAML source directory cannot be empty"));
                }
                Ok(Box::new(YamlRecordSource::new(directory)))
            }
            _ => Err(Error::config("Invalid config for YAML record source")),
        }
    }
}

/// Register the YAML record source with a registry
pub fn register(registry: &ProviderRegistry) -> Result<()> {
    registry.register_source("yaml", Box::new(YamlFactory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, file: &str, content: &str) {
        std::fs::write(dir.join(file), content).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let source = YamlRecordSource::new(dir.path());

        assert_eq!(source.load("arecord").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_loads_sequence_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "arecord.yaml",
            "- name: api.example.com\n  content: 203.0.113.5\n  proxied: true\n\
             - name: mail.example.com\n  value: 198.51.100.25\n  ttl: 3600\n",
        );
        let source = YamlRecordSource::new(dir.path());

        let specs = source.load("arecord").await.unwrap().unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(
            specs[0].as_value(),
            &json!({ "name": "api.example.com", "content": "203.0.113.5", "proxied": true })
        );
        assert_eq!(specs[1].display_name(), "mail.example.com");
        assert_eq!(specs[1].as_value()["ttl"], json!(3600));
    }

    #[tokio::test]
    async fn test_yml_extension() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "cname.yml", "- name: www.example.com\n  value: example.com\n");
        let source = YamlRecordSource::new(dir.path());

        let specs = source.load("cname").await.unwrap().unwrap();
        assert_eq!(specs.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_and_null_files_are_empty_lists() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "arecord.yaml", "");
        write(dir.path(), "cname.yaml", "~\n");
        let source = YamlRecordSource::new(dir.path());

        assert_eq!(source.load("arecord").await.unwrap(), Some(Vec::new()));
        assert_eq!(source.load("cname").await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_mapping_document_is_source_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "arecord.yaml", "name: api.example.com\ncontent: 203.0.113.5\n");
        let source = YamlRecordSource::new(dir.path());

        let err = source.load("arecord").await.unwrap_err();
        assert!(matches!(err, Error::Source(_)));
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_source_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "arecord.yaml", "- name: [unclosed\n");
        let source = YamlRecordSource::new(dir.path());

        assert!(matches!(source.load("arecord").await, Err(Error::Source(_))));
    }

    #[tokio::test]
    async fn test_malformed_entries_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "arecord.yaml", "- just a string\n- name: ok.example.com\n");
        let source = YamlRecordSource::new(dir.path());

        let specs = source.load("arecord").await.unwrap().unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].as_value(), &json!("just a string"));
    }

    #[tokio::test]
    async fn test_unrepresentable_entry_does_not_sink_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "arecord.yaml",
            "- name: ok.example.com\n  content: 203.0.113.5\n\
             - name: odd.example.com\n  content:\n    ? [a, b]\n    : c\n\
             - name: tail.example.com\n  content: 203.0.113.6\n",
        );
        let source = YamlRecordSource::new(dir.path());

        let specs = source.load("arecord").await.unwrap().unwrap();
        assert_eq!(specs.len(), 3);

        assert!(dnsrec_core::record::normalize(&specs[0], "arecord").is_ok());
        assert!(matches!(
            dnsrec_core::record::normalize(&specs[1], "arecord"),
            Err(Error::InvalidSpec(_))
        ));
        assert_eq!(
            dnsrec_core::record::normalize(&specs[2], "arecord")
                .unwrap()
                .name,
            "tail.example.com"
        );
    }

    #[tokio::test]
    async fn test_tagged_entry_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "arecord.yaml",
            "- !custom x\n- name: ok.example.com\n  content: 203.0.113.5\n",
        );
        let source = YamlRecordSource::new(dir.path());

        let specs = source.load("arecord").await.unwrap().unwrap();
        assert_eq!(specs.len(), 2);
        assert!(dnsrec_core::record::normalize(&specs[0], "arecord").is_err());
        assert!(dnsrec_core::record::normalize(&specs[1], "arecord").is_ok());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = YamlRecordSource::new(dir.path());

        assert!(source.load("../secrets").await.is_err());
        assert!(source.load("").await.is_err());
    }

    #[test]
    fn test_factory_creation() {
        let config = SourceConfig::Yaml {
            directory: "records".to_string(),
        };

        let source = YamlFactory.create(&config);
        assert!(source.is_ok());
        assert_eq!(source.unwrap().source_name(), "yaml");
    }

    #[test]
    fn test_register() {
        let registry = ProviderRegistry::new();
        register(&registry).unwrap();

        assert!(registry.has_source("yaml"));
        assert!(registry.create_source(&SourceConfig::default()).is_ok());
    }
}
