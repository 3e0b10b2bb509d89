//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, mount point shape and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HubConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::HubConfig;

/// Longest accepted session timeout: one year.
pub const MAX_SESSION_TIMEOUT_SECS: i64 = 365 * 24 * 60 * 60;

/// One semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("listener.base_path: '{0}' must be empty or start with '/' and not end with '/'")]
    InvalidBasePath(String),

    #[error("listener.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("session.reap_interval_secs ({interval}) exceeds session.timeout_secs ({timeout})")]
    ReapIntervalTooLong { interval: u64, timeout: i64 },

    #[error("session.timeout_secs ({0}) exceeds the maximum of {max}", max = MAX_SESSION_TIMEOUT_SECS)]
    SessionTimeoutTooLong(i64),

    #[error("resources.static_dir must not be empty")]
    EmptyStaticDir,
}

pub fn validate_config(config: &HubConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    let base = &config.listener.base_path;
    if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
        errors.push(ValidationError::InvalidBasePath(base.clone()));
    }

    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let session = &config.session;
    if session.timeout_secs > MAX_SESSION_TIMEOUT_SECS {
        errors.push(ValidationError::SessionTimeoutTooLong(session.timeout_secs));
    }
    if session.timeout_secs > 0 && session.reap_interval_secs as i128 > session.timeout_secs as i128 {
        errors.push(ValidationError::ReapIntervalTooLong {
            interval: session.reap_interval_secs,
            timeout: session.timeout_secs,
        });
    }

    if config.resources.static_dir.trim().is_empty() {
        errors.push(ValidationError::EmptyStaticDir);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
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
    fn test_default_config_is_valid() {
        assert!(validate_config(&HubConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = HubConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.listener.base_path = "wd/hub/".into();
        config.session.timeout_secs = 10;
        config.session.reap_interval_secs = 60;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "bad".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidBasePath("wd/hub/".into())));
        assert!(errors.contains(&ValidationError::ReapIntervalTooLong {
            interval: 60,
            timeout: 10
        }));
    }

    #[test]
    fn test_session_timeout_upper_bound() {
        let mut config = HubConfig::default();
        config.session.timeout_secs = MAX_SESSION_TIMEOUT_SECS;
        assert!(validate_config(&config).is_ok());

        config.session.timeout_secs = MAX_SESSION_TIMEOUT_SECS + 1;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::SessionTimeoutTooLong(MAX_SESSION_TIMEOUT_SECS + 1)]
        );

        config.session.timeout_secs = i64::MAX;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_interval_ignored_when_reaping_disabled() {
        let mut config = HubConfig::default();
        config.session.timeout_secs = 0;
        config.session.reap_interval_secs = 60;
        assert!(validate_config(&config).is_ok());
    }
}
