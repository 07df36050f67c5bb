//! Translator configuration, loaded from a JSON file.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::MAX_NESTING_DEPTH;
use crate::sql_compiler::Dialect;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse config {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Every field is optional in the JSON document.
///
/// ```json
/// {
///   "max_nesting_depth": 10,
///   "max_filter_length": 65536,
///   "reserved_keywords": ["truncate", "grant"],
///   "dialect": "postgres",
///   "table_mapping": { "User": "users" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorConfig {
    pub max_nesting_depth: usize,
    /// Longest accepted filter after trimming, in bytes. Unlimited when unset.
    pub max_filter_length: Option<usize>,
    /// Rejected in field and value position, in addition to the built-in list
    pub reserved_keywords: Vec<String>,
    pub dialect: Dialect,
    /// Entity name to table name
    pub table_mapping: HashMap<String, String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: MAX_NESTING_DEPTH,
            max_filter_length: None,
            reserved_keywords: Vec::new(),
            dialect: Dialect::default(),
            table_mapping: HashMap::new(),
        }
    }
}

impl TranslatorConfig {
    /// Loads the configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded translator config");
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            origin: "<inline>".to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("filter_sql_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_load_valid_json_config() {
        let path = temp_path("valid.json");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"{{
                "max_nesting_depth": 4,
                "reserved_keywords": ["truncate"],
                "dialect": "sqlite",
                "table_mapping": {{ "User": "users" }}
            }}"#
        )
        .unwrap();

        let config = TranslatorConfig::from_json_file(&path).unwrap();
        assert_eq!(config.max_nesting_depth, 4);
        assert_eq!(config.max_filter_length, None);
        assert_eq!(config.reserved_keywords, vec!["truncate".to_string()]);
        assert_eq!(config.dialect, Dialect::Sqlite);
        assert_eq!(config.table_mapping.get("User").map(String::as_str), Some("users"));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_invalid_json_config() {
        let path = temp_path("invalid.json");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "invalid json").unwrap();

        let result = TranslatorConfig::from_json_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file() {
        let result = TranslatorConfig::from_json_file("non_existent_filter_sql_config.json");
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = TranslatorConfig::from_json_str("{}").unwrap();
        assert_eq!(config, TranslatorConfig::default());
        assert_eq!(config.max_nesting_depth, 10);
        assert_eq!(config.dialect, Dialect::Postgres);
    }

    #[test]
    fn test_length_limit_is_opt_in() {
        let config = TranslatorConfig::from_json_str(r#"{ "max_filter_length": 64 }"#).unwrap();
        assert_eq!(config.max_filter_length, Some(64));

        let config = TranslatorConfig::from_json_str(r#"{ "max_filter_length": null }"#).unwrap();
        assert_eq!(config.max_filter_length, None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = TranslatorConfig::from_json_str(r#"{ "max_depth": 3 }"#).unwrap_err();
        assert!(err.to_string().contains("max_depth"), "{err}");
    }

    #[test]
    fn test_unknown_dialect_is_rejected() {
        assert!(TranslatorConfig::from_json_str(r#"{ "dialect": "oracle" }"#).is_err());
    }
}
