//! Runtime configuration for stackmap
//!
//! # Environment Variables
//!
//! - `STACKMAP_LOG_LEVEL`: Logging level - default: "info"
//! - `STACKMAP_MAX_DOCUMENT_SIZE`: Largest document a source will parse, in bytes - default: 1 MiB
//! - `STACKMAP_SOURCES`: Path to a sources file - optional
//!
//! # Sources file
//!
//! ```yaml
//! sources:
//!   - name: service-config
//!     template: templates/service.yaml
//!     weight: 10
//!     paths: [".service.yaml", "deploy/values.yaml"]
//! ```

use crate::fs::FileSystem;
use crate::util::logging::{parse_level, LOG_LEVEL_ENV, VALID_LEVELS};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MAX_DOCUMENT_SIZE: usize = 1_048_576; // 1MiB
const MIN_DOCUMENT_SIZE: usize = 64;
const MAX_DOCUMENT_SIZE: usize = 67_108_864; // 64MiB

pub const MAX_DOCUMENT_SIZE_ENV: &str = "STACKMAP_MAX_DOCUMENT_SIZE";
pub const SOURCES_ENV: &str = "STACKMAP_SOURCES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("Failed to read {path:?}: {error}")]
    ReadFailed { path: PathBuf, error: String },
}

#[derive(Debug, Clone)]
pub struct StackmapConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Documents larger than this are skipped without parsing
    pub max_document_size: usize,

    /// Sources file, if configured
    pub sources_file: Option<PathBuf>,
}

impl Default for StackmapConfig {
    /// Reads `STACKMAP_*` variables, falling back to defaults for anything unset or unparsable.
    fn default() -> Self {
        let log_level = env::var(LOG_LEVEL_ENV)
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let max_document_size = env::var(MAX_DOCUMENT_SIZE_ENV)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_DOCUMENT_SIZE);

        let sources_file = env::var(SOURCES_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            log_level,
            max_document_size,
            sources_file,
        }
    }
}

impl StackmapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_document_size < MIN_DOCUMENT_SIZE {
            return Err(ConfigError::ValidationFailed(format!(
                "Max document size must be at least {} bytes",
                MIN_DOCUMENT_SIZE
            )));
        }
        if self.max_document_size > MAX_DOCUMENT_SIZE {
            return Err(ConfigError::ValidationFailed(
                "Max document size cannot exceed 64MiB".to_string(),
            ));
        }

        if parse_level(&self.log_level).is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}. Valid options: {}",
                self.log_level,
                VALID_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Loads the configured sources file, if any.
    pub fn load_sources(&self, fs: &dyn FileSystem) -> Result<Option<SourcesConfig>, ConfigError> {
        match &self.sources_file {
            Some(path) => SourcesConfig::load(fs, path).map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Display for StackmapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stackmap Configuration:")?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Max Document Size: {} bytes", self.max_document_size)?;
        match &self.sources_file {
            Some(path) => writeln!(f, "  Sources: {}", path.display())?,
            None => writeln!(f, "  Sources: (none)")?,
        }
        Ok(())
    }
}

/// One configured extraction source.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub name: String,

    /// Template file, relative to the sources file directory unless absolute
    pub template: PathBuf,

    #[serde(default)]
    pub weight: i64,

    /// Candidate documents, tried in order
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourcesConfig {
    pub sources: Vec<SourceConfig>,
}

impl SourcesConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| ConfigError::ParseError {
            field: "sources".to_string(),
            error: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a sources file. Relative template paths are
    /// resolved against the directory holding the file.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, ConfigError> {
        let text = fs.read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut config = Self::from_yaml(&text)?;
        if let Some(base) = path.parent() {
            for source in &mut config.sources {
                if source.template.is_relative() {
                    source.template = base.join(&source.template);
                }
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "Source name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "Duplicate source name: {}",
                    source.name
                )));
            }
            if source.template.as_os_str().is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "Source {} has no template",
                    source.name
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use serial_test::serial;

    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    const SOURCES: &str = r#"
sources:
  - name: service-config
    template: templates/service.yaml
    weight: 10
    paths: [".service.yaml", "deploy/values.yaml"]
  - name: migrations
    template: /etc/stackmap/migrations.yaml
"#;

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = vec![
            EnvGuard::unset(LOG_LEVEL_ENV),
            EnvGuard::unset(MAX_DOCUMENT_SIZE_ENV),
            EnvGuard::unset(SOURCES_ENV),
        ];

        let config = StackmapConfig::default();

        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.max_document_size, DEFAULT_MAX_DOCUMENT_SIZE);
        assert_eq!(config.sources_file, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set(LOG_LEVEL_ENV, "DEBUG"),
            EnvGuard::set(MAX_DOCUMENT_SIZE_ENV, "4096"),
            EnvGuard::set(SOURCES_ENV, "/etc/stackmap/sources.yaml"),
        ];

        let config = StackmapConfig::default();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.max_document_size, 4096);
        assert_eq!(
            config.sources_file,
            Some(PathBuf::from("/etc/stackmap/sources.yaml"))
        );
    }

    #[test]
    #[serial]
    fn test_unparsable_size_falls_back_to_default() {
        let _guard = EnvGuard::set(MAX_DOCUMENT_SIZE_ENV, "lots");
        let config = StackmapConfig::default();
        assert_eq!(config.max_document_size, DEFAULT_MAX_DOCUMENT_SIZE);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = StackmapConfig {
            log_level: "loud".to_string(),
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            sources_file: None,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));

        let config = StackmapConfig {
            log_level: "info".to_string(),
            max_document_size: 10,
            sources_file: None,
        };
        assert!(config.validate().is_err());

        let config = StackmapConfig {
            log_level: "info".to_string(),
            max_document_size: MAX_DOCUMENT_SIZE + 1,
            sources_file: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_display() {
        let config = StackmapConfig {
            log_level: "info".to_string(),
            max_document_size: 2048,
            sources_file: None,
        };
        let display = config.to_string();
        assert!(display.contains("Stackmap Configuration:"));
        assert!(display.contains("2048 bytes"));
    }

    #[test]
    fn test_sources_from_yaml() {
        let config = SourcesConfig::from_yaml(SOURCES).unwrap();

        assert_eq!(config.sources.len(), 2);
        let service = config.get("service-config").unwrap();
        assert_eq!(service.weight, 10);
        assert_eq!(service.paths, vec![".service.yaml", "deploy/values.yaml"]);

        let migrations = config.get("migrations").unwrap();
        assert_eq!(migrations.weight, 0);
        assert!(migrations.paths.is_empty());
    }

    #[test]
    fn test_sources_validation() {
        let duplicate = "sources:\n  - {name: a, template: t.yaml}\n  - {name: a, template: u.yaml}\n";
        assert!(matches!(
            SourcesConfig::from_yaml(duplicate),
            Err(ConfigError::ValidationFailed(_))
        ));

        let unnamed = "sources:\n  - {name: ' ', template: t.yaml}\n";
        assert!(SourcesConfig::from_yaml(unnamed).is_err());

        let no_template = "sources:\n  - {name: a, template: ''}\n";
        assert!(SourcesConfig::from_yaml(no_template).is_err());

        assert!(matches!(
            SourcesConfig::from_yaml("sources: 5\n"),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_load_resolves_relative_templates() {
        let fs = MockFileSystem::new();
        fs.add_file("conf/sources.yaml", SOURCES);

        let config = SourcesConfig::load(&fs, Path::new("/mock/conf/sources.yaml")).unwrap();
        assert_eq!(
            config.get("service-config").unwrap().template,
            PathBuf::from("/mock/conf/templates/service.yaml")
        );
        assert_eq!(
            config.get("migrations").unwrap().template,
            PathBuf::from("/etc/stackmap/migrations.yaml")
        );
    }

    #[test]
    fn test_load_sources_through_config() {
        let fs = MockFileSystem::new();
        fs.add_file("sources.yaml", SOURCES);

        let config = StackmapConfig {
            log_level: "info".to_string(),
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            sources_file: Some(PathBuf::from("/mock/sources.yaml")),
        };
        let sources = config.load_sources(&fs).unwrap().unwrap();
        assert_eq!(sources.sources.len(), 2);

        let missing = StackmapConfig {
            sources_file: Some(PathBuf::from("/mock/nope.yaml")),
            ..config
        };
        assert!(matches!(
            missing.load_sources(&fs),
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}
