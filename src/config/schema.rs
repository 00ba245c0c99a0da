//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Placeholder admin key shipped in the defaults. Validation refuses it when
/// the admin API is enabled.
pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the submission gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Submission handling settings.
    pub gateway: SubmissionConfig,

    /// Namespaces accepted by the gateway. At least one is required.
    pub namespaces: Vec<NamespaceConfig>,

    /// Backing log settings.
    pub producer: ProducerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Shutdown behaviour.
    pub shutdown: ShutdownConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Submission handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Maximum request body size in bytes. Larger bodies are answered with 413.
    pub max_body_size: usize,

    /// Maximum length of a document id.
    pub max_id_length: usize,

    /// Header carrying the originating client address when the gateway sits
    /// behind a trusted proxy. Empty disables it.
    pub trusted_forward_header: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
            max_id_length: 128,
            trusted_forward_header: "X-Forwarded-For".to_string(),
        }
    }
}

/// Per-namespace policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NamespaceConfig {
    /// Namespace name as it appears in the request path.
    pub name: String,

    /// Whether clients may retract documents in this namespace, either with
    /// DELETE or through the obsolete-document header.
    #[serde(default = "default_allow_delete")]
    pub allow_delete: bool,
}

fn default_allow_delete() -> bool {
    true
}

/// Backing log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// File the log producer appends canonical messages to.
    pub log_path: String,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            log_path: "submissions.log".to_string(),
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

    /// Log output format.
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
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_API_KEY.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long to wait for open connections to finish, in seconds.
    pub drain_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.gateway.max_body_size, 1024 * 1024);
        assert_eq!(config.gateway.trusted_forward_header, "X-Forwarded-For");
        assert!(config.namespaces.is_empty());
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn namespaces_parse_with_default_policy() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [[namespaces]]
            name = "telemetry"

            [[namespaces]]
            name = "crashes"
            allow_delete = false
            "#,
        )
        .unwrap();

        assert_eq!(config.namespaces.len(), 2);
        assert_eq!(config.namespaces[0].name, "telemetry");
        assert!(config.namespaces[0].allow_delete);
        assert!(!config.namespaces[1].allow_delete);
    }

    #[test]
    fn json_log_format_parses() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
