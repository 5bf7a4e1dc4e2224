//! Configuration error types.
//!
//! Shared by `site.toml`, the manifest and the translation sources: all of
//! them are loaded once at startup and any failure is fatal.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("YAML parsing error in `{0}`")]
    Yaml(PathBuf, #[source] serde_yaml::Error),

    #[error("JSON parsing error in `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("TOML parsing error in `{0}`")]
    Toml(PathBuf, #[source] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("manifest.yaml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("manifest.yaml"));
        assert!(io_err.source().is_some());

        let validation_err = ConfigError::Validation("no translations declared".to_string());
        assert!(format!("{validation_err}").contains("no translations declared"));
    }

    #[test]
    fn test_yaml_error_keeps_source() {
        let yaml_err = serde_yaml::from_str::<Vec<String>>("{").unwrap_err();
        let err = ConfigError::Yaml(PathBuf::from("i18n/en.yaml"), yaml_err);
        assert!(format!("{err}").contains("i18n/en.yaml"));
        assert!(err.source().is_some());
    }
}
