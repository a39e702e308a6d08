//! Configuration loader for the `tealeaf` CLI. The file is plain JSON with
//! camelCase keys; every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(String),
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Config {
    /// JSON document holding admin and customer credential hashes.
    pub store_path: PathBuf,
    /// `tracing-subscriber` filter directive, overridden by `RUST_LOG`.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("credentials.json"),
            log_filter: "info".to_string(),
        }
    }
}

/// Reads the config at `path`. Relative `storePath` values stay relative to
/// the working directory.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(format!("{e}")))
}

#[cfg(test)]
mod tests {
    use super::{load_config, Config, ConfigError};
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_config() {
        let payload = json!({
            "storePath": "/var/lib/tealeaf/credentials.json",
            "logFilter": "tealeaf=debug"
        });
        let file = NamedTempFile::new().expect("temp file");
        fs::write(file.path(), serde_json::to_vec(&payload).unwrap()).unwrap();

        let config = load_config(file.path()).expect("config should load");
        assert_eq!(config.store_path, PathBuf::from("/var/lib/tealeaf/credentials.json"));
        assert_eq!(config.log_filter, "tealeaf=debug");
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let file = NamedTempFile::new().expect("temp file");
        fs::write(file.path(), "{}").unwrap();
        assert_eq!(load_config(file.path()).unwrap(), Config::default());
    }

    #[test]
    fn rejects_unknown_keys() {
        let file = NamedTempFile::new().expect("temp file");
        fs::write(file.path(), r#"{ "iterations": 1 }"#).unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn reports_missing_files() {
        let err = load_config("/nonexistent/tealeaf.json").unwrap_err();
        assert!(format!("{err}").contains("config file unreadable"));
    }
}
