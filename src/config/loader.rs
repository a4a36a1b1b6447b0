//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ShellConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ShellConfig, ConfigError> {
    let config: ShellConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ShellConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.shutdown.grace_secs, 10);
        assert_eq!(config.request.timeout_ms, 500);
        assert_eq!(config.request.shell_id, "appshell-1");
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [shutdown]
            grace_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.shutdown.grace().as_secs(), 3);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = parse_config("[shutdown]\ngrace_secs = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation(ref errors) if errors == &[ValidationError::ZeroGrace]
        ));
        assert!(err.to_string().contains("grace_secs"));
    }

    #[test]
    fn huge_grace_is_rejected() {
        let err = parse_config("[shutdown]\ngrace_secs = 9223372036854775807\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation(ref errors)
                if errors == &[ValidationError::GraceTooLong(9_223_372_036_854_775_807)]
        ));
    }

    #[test]
    fn listener_limits_have_defaults() {
        let config = parse_config("[listener]\nmax_header_bytes = 16384\n").unwrap();
        assert_eq!(config.listener.max_header_bytes, 16_384);
        assert_eq!(config.listener.read_timeout().as_secs(), 10);
        assert_eq!(config.listener.write_timeout().as_secs(), 10);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(parse_config("[listener"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
