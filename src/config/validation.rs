//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (grace within bounds, timeouts > 0, header limit)
//! - Check addresses and header values parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ShellConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::ShellConfig;

/// Longest accepted shutdown grace period.
pub const MAX_GRACE_SECS: u64 = 3_600;

/// Smallest header limit the HTTP/1 codec accepts.
pub const MIN_HEADER_BYTES: usize = 8_192;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),
    #[error("listener.read_timeout_secs must be greater than zero")]
    ZeroReadTimeout,
    #[error("listener.write_timeout_secs must be greater than zero")]
    ZeroWriteTimeout,
    #[error("listener.max_header_bytes {0} is below the minimum of 8192")]
    HeaderLimit(usize),
    #[error("shutdown.grace_secs must be greater than zero")]
    ZeroGrace,
    #[error("shutdown.grace_secs {0} exceeds the maximum of 3600")]
    GraceTooLong(u64),
    #[error("request.timeout_ms must be greater than zero")]
    ZeroRequestTimeout,
    #[error("request.shell_id `{0}` is not a valid header value")]
    ShellId(String),
    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &ShellConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.read_timeout_secs == 0 {
        errors.push(ValidationError::ZeroReadTimeout);
    }
    if config.listener.write_timeout_secs == 0 {
        errors.push(ValidationError::ZeroWriteTimeout);
    }
    if config.listener.max_header_bytes < MIN_HEADER_BYTES {
        errors.push(ValidationError::HeaderLimit(config.listener.max_header_bytes));
    }
    match config.shutdown.grace_secs {
        0 => errors.push(ValidationError::ZeroGrace),
        secs if secs > MAX_GRACE_SECS => errors.push(ValidationError::GraceTooLong(secs)),
        _ => {}
    }
    if config.request.timeout_ms == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if HeaderValue::from_str(&config.request.shell_id).is_err() {
        errors.push(ValidationError::ShellId(config.request.shell_id.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ShellConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ShellConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.shutdown.grace_secs = 0;
        config.request.shell_id = "bad\nvalue".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("not-an-address".into()),
                ValidationError::ZeroGrace,
                ValidationError::ShellId("bad\nvalue".into()),
            ]
        );
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = ShellConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MetricsAddress("nowhere".into())])
        );
    }

    #[test]
    fn grace_has_an_upper_bound() {
        let mut config = ShellConfig::default();
        config.shutdown.grace_secs = MAX_GRACE_SECS;
        assert!(validate_config(&config).is_ok());

        config.shutdown.grace_secs = u64::MAX;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::GraceTooLong(u64::MAX)])
        );
    }

    #[test]
    fn listener_limits_are_checked() {
        let mut config = ShellConfig::default();
        config.listener.read_timeout_secs = 0;
        config.listener.write_timeout_secs = 0;
        config.listener.max_header_bytes = 512;

        assert_eq!(
            validate_config(&config),
            Err(vec![
                ValidationError::ZeroReadTimeout,
                ValidationError::ZeroWriteTimeout,
                ValidationError::HeaderLimit(512),
            ])
        );
    }
}
