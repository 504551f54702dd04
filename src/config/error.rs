//! Errors surfaced while loading `lingon.toml`.

use std::path::PathBuf;
use thiserror::Error;

/// Failure modes of configuration loading and validation.
///
/// All of these abort startup; a site is never served against a config
/// that failed to load or validate.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid TOML in config file")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_error_names_the_file() {
        let err = ConfigError::Io(
            "lingon.toml".into(),
            Error::new(ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("lingon.toml"));
    }

    #[test]
    fn test_toml_error_from_parse_failure() {
        let parse_err = toml::from_str::<toml::Value>("not = = toml").unwrap_err();
        assert!(matches!(ConfigError::from(parse_err), ConfigError::Toml(_)));
    }

    #[test]
    fn test_validation_error_carries_message() {
        let err = ConfigError::Validation("variant needs a backend".into());
        assert!(err.to_string().contains("variant needs a backend"));
    }
}
