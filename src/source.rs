//! Configured extraction sources
//!
//! A source pairs a compiled template with the list of config files it should
//! be applied to. Only the first file that extracts cleanly is used.

use crate::config::SourceConfig;
use crate::extract::{Engine, ExtractError, Record};
use crate::fs::FileSystem;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const DEFAULT_MAX_DOCUMENT_SIZE: usize = 1_048_576;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read template {path:?} for source {name}: {error}")]
    TemplateRead {
        name: String,
        path: PathBuf,
        error: String,
    },

    #[error("Template {path:?} for source {name} is invalid: {source}")]
    TemplateInvalid {
        name: String,
        path: PathBuf,
        #[source]
        source: ExtractError,
    },
}

/// A successful extraction and the file it came from.
#[derive(Debug)]
pub struct Extraction {
    pub path: PathBuf,
    pub record: Record,
}

#[derive(Debug)]
pub struct YamlSource {
    name: String,
    weight: i64,
    engine: Engine,
    max_document_size: usize,
}

impl YamlSource {
    pub fn new(name: impl Into<String>, weight: i64, engine: Engine) -> Self {
        Self {
            name: name.into(),
            weight,
            engine,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
        }
    }

    /// Reads and compiles the configured template.
    pub fn from_config(config: &SourceConfig, fs: &dyn FileSystem) -> Result<Self, SourceError> {
        let template = fs
            .read(&config.template)
            .map_err(|e| SourceError::TemplateRead {
                name: config.name.clone(),
                path: config.template.clone(),
                error: e.to_string(),
            })?;

        let engine = Engine::new(&template).map_err(|source| SourceError::TemplateInvalid {
            name: config.name.clone(),
            path: config.template.clone(),
            source,
        })?;

        debug!(
            source = %config.name,
            leaves = engine.tree().leaf_count(),
            "loaded source template"
        );
        Ok(Self::new(config.name.clone(), config.weight, engine))
    }

    pub fn with_max_document_size(mut self, max_document_size: usize) -> Self {
        self.max_document_size = max_document_size;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured priority. Carried for callers that rank sources.
    pub fn weight(&self) -> i64 {
        self.weight
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn extract(&self, document: &[u8]) -> Result<Record, ExtractError> {
        self.engine.extract(document)
    }

    /// Tries each candidate under `root` in order and returns the first clean extraction.
    ///
    /// Missing, unreadable, oversized and failing documents are skipped.
    pub fn extract_first(
        &self,
        fs: &dyn FileSystem,
        root: &Path,
        candidates: &[String],
    ) -> Option<Extraction> {
        for candidate in candidates {
            let path = root.join(candidate);
            if !fs.is_file(&path) {
                debug!(source = %self.name, path = %path.display(), "candidate not found");
                continue;
            }

            match fs.metadata(&path) {
                Ok(meta) if meta.len() > self.max_document_size as u64 => {
                    warn!(
                        source = %self.name,
                        path = %path.display(),
                        size = meta.len(),
                        limit = self.max_document_size,
                        "document too large, skipping"
                    );
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(source = %self.name, path = %path.display(), error = %e, "cannot stat document, skipping");
                    continue;
                }
            }

            let bytes = match fs.read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(source = %self.name, path = %path.display(), error = %e, "cannot read document, skipping");
                    continue;
                }
            };

            match self.extract(&bytes) {
                Ok(record) => {
                    info!(
                        source = %self.name,
                        path = %path.display(),
                        warnings = record.warnings().len(),
                        "extracted document"
                    );
                    return Some(Extraction { path, record });
                }
                Err(e) => {
                    warn!(source = %self.name, path = %path.display(), error = %e, "extraction failed, skipping");
                }
            }
        }

        None
    }

    /// Runs [`extract_first`](Self::extract_first) over the configured paths.
    pub fn extract_configured(
        &self,
        config: &SourceConfig,
        fs: &dyn FileSystem,
        root: &Path,
    ) -> Option<Extraction> {
        self.extract_first(fs, root, &config.paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    const TEMPLATE: &str = r#"
kafka:
  brokers: {{ parse .kafka.host:.kafka.port }}
  topics:
    - name: {{ all.kafka.queue.name }}
      type: {{ all.kafka.queue.type }}
"#;

    fn source_config() -> SourceConfig {
        SourceConfig {
            name: "kafka".to_string(),
            template: PathBuf::from("/mock/templates/kafka.yaml"),
            weight: 3,
            paths: vec!["first.yaml".to_string(), "second.yaml".to_string()],
        }
    }

    fn mock_fs() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("templates/kafka.yaml", TEMPLATE);
        fs
    }

    #[test]
    fn test_from_config_compiles_template() {
        let fs = mock_fs();
        let source = YamlSource::from_config(&source_config(), &fs).unwrap();

        assert_eq!(source.name(), "kafka");
        assert_eq!(source.weight(), 3);
        assert_eq!(source.engine().tree().leaf_count(), 3);
    }

    #[test]
    fn test_from_config_missing_template() {
        let fs = MockFileSystem::new();
        let err = YamlSource::from_config(&source_config(), &fs).unwrap_err();
        assert!(matches!(err, SourceError::TemplateRead { .. }));
    }

    #[test]
    fn test_from_config_invalid_template() {
        let fs = MockFileSystem::new();
        fs.add_file("templates/kafka.yaml", "host: {{ all.kafka.hostname }}\n");

        match YamlSource::from_config(&source_config(), &fs).unwrap_err() {
            SourceError::TemplateInvalid { source, .. } => assert!(source.is_compile_time()),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_extract_first_skips_missing_and_failing_documents() {
        let fs = mock_fs();
        fs.add_file("repo/second.yaml", "kafka:\n  brokers: broker:notaport\n");
        fs.add_file(
            "repo/third.yaml",
            "kafka:\n  brokers: broker:9092\n  topics:\n    - name: orders\n      type: producer\n",
        );

        let source = YamlSource::from_config(&source_config(), &fs).unwrap();
        let candidates = vec![
            "first.yaml".to_string(),
            "second.yaml".to_string(),
            "third.yaml".to_string(),
        ];
        let extraction = source
            .extract_first(&fs, Path::new("/mock/repo"), &candidates)
            .unwrap();

        assert_eq!(extraction.path, PathBuf::from("/mock/repo/third.yaml"));
        let kafka = &extraction.record.kafka().instances()[0];
        assert_eq!(kafka.host.as_deref(), Some("broker"));
        assert_eq!(kafka.port, Some(9092));
        assert_eq!(kafka.queues.instances()[0].name.as_deref(), Some("orders"));
    }

    #[test]
    fn test_extract_first_skips_oversized_documents() {
        let fs = mock_fs();
        fs.add_file("repo/first.yaml", format!("kafka:\n  brokers: {}:1\n", "b".repeat(200)));
        fs.add_file("repo/second.yaml", "kafka:\n  brokers: small:2\n");

        let source = YamlSource::from_config(&source_config(), &fs)
            .unwrap()
            .with_max_document_size(100);
        let extraction = source
            .extract_configured(&source_config(), &fs, Path::new("/mock/repo"))
            .unwrap();

        assert_eq!(extraction.path, PathBuf::from("/mock/repo/second.yaml"));
        assert_eq!(extraction.record.kafka().instances()[0].port, Some(2));
    }

    #[test]
    fn test_extract_first_none_when_nothing_matches() {
        let fs = mock_fs();
        fs.add_dir("repo/first.yaml");
        let source = YamlSource::from_config(&source_config(), &fs).unwrap();

        assert!(source
            .extract_configured(&source_config(), &fs, Path::new("/mock/repo"))
            .is_none());
    }
}
