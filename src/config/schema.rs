//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the hub.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the hub.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HubConfig {
    /// Listener configuration (bind address, mount point).
    pub listener: ListenerConfig,

    /// Session lifetime settings.
    pub session: SessionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Static resources served under `/static/resource/`.
    pub resources: ResourceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4444").
    pub bind_address: String,

    /// Mount point, e.g. "/wd/hub". Empty mounts at the root.
    pub base_path: String,

    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4444".to_string(),
            base_path: String::new(),
            max_body_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Session expiry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle time after which a session is reaped. Zero or negative
    /// disables reaping.
    pub timeout_secs: i64,

    /// Sweep period in seconds. Zero means "same as the timeout".
    pub reap_interval_secs: u64,
}

impl SessionConfig {
    /// The idle timeout, or `None` when reaping is disabled.
    pub fn timeout(&self) -> Option<Duration> {
        u64::try_from(self.timeout_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// How often the reaper sweeps.
    pub fn reap_interval(&self) -> Option<Duration> {
        let timeout = self.timeout()?;
        if self.reap_interval_secs == 0 {
            Some(timeout)
        } else {
            Some(Duration::from_secs(self.reap_interval_secs))
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 1800,
            reap_interval_secs: 0,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 300 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Directory static resources are read from.
    pub static_dir: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            static_dir: "static".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: HubConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:4444");
        assert_eq!(config.session.timeout(), Some(Duration::from_secs(1800)));
        assert_eq!(config.session.reap_interval(), Some(Duration::from_secs(1800)));
        assert_eq!(config.resources.static_dir, "static");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_non_positive_timeout_disables_reaping() {
        for timeout_secs in [0, -5] {
            let session = SessionConfig {
                timeout_secs,
                reap_interval_secs: 10,
            };
            assert_eq!(session.timeout(), None);
            assert_eq!(session.reap_interval(), None);
        }
    }

    #[test]
    fn test_partial_sections() {
        let config: HubConfig = toml::from_str(
            r#"
            [listener]
            base_path = "/wd/hub"

            [session]
            timeout_secs = 60
            reap_interval_secs = 15

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.base_path, "/wd/hub");
        assert_eq!(config.listener.max_body_bytes, 4 * 1024 * 1024);
        assert_eq!(config.session.reap_interval(), Some(Duration::from_secs(15)));
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
