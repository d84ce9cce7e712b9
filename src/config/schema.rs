//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! dispatcher. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration for the dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DispatchConfig {
    /// Listener configuration (bind address, concurrency).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request dispatch behaviour.
    pub dispatch: DispatchSettings,

    /// Pattern index construction.
    pub index: IndexConfig,

    /// Backend definitions and overrides.
    pub backends: Vec<BackendConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4566").
    pub bind_address: String,

    /// Maximum requests processed concurrently (backpressure).
    pub max_concurrent_requests: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:4566".to_string(),
            max_concurrent_requests: 1_024,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// How requests are scoped and what happens when nothing matches.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Region used when neither the signature nor the host names one.
    pub default_region: String,

    /// Account every request is scoped to.
    pub default_account_id: String,

    /// Resolve unmatched URLs through the SigV4 credential scope.
    pub infer_from_signature: bool,

    /// Backend that receives requests no pattern claims. Unset means 404.
    pub fallback_backend: Option<String>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            default_region: "us-east-1".to_string(),
            default_account_id: "123456789012".to_string(),
            infer_from_signature: true,
            fallback_backend: None,
        }
    }
}

/// Pattern index construction settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Start from the builtin service table.
    pub include_builtin: bool,

    /// Apply the builtin exclusion set.
    pub default_exclusions: bool,

    /// Additional backends to exclude.
    pub exclusions: Vec<String>,

    /// Additional renames applied before lookup (listed name → qualified name).
    pub aliases: BTreeMap<String, String>,

    /// Where to persist the built index as a JSON artifact.
    pub artifact_path: Option<String>,

    /// Load the artifact at startup instead of building, when it exists.
    pub prefer_artifact: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            include_builtin: true,
            default_exclusions: true,
            exclusions: Vec::new(),
            aliases: BTreeMap::new(),
            artifact_path: None,
            prefer_artifact: false,
        }
    }
}

/// Upstream selection strategy for a backend.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStrategy {
    #[default]
    RoundRobin,
    LeastConnections,
}

/// Backend definition or override.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Backend identifier.
    pub name: String,

    /// URL base patterns. Non-empty replaces (or adds) the registry
    /// definition for this backend.
    #[serde(default)]
    pub url_bases: Vec<String>,

    /// Upstream addresses (e.g., "127.0.0.1:7001") serving this backend.
    /// Empty means the builtin stub answers.
    #[serde(default)]
    pub upstreams: Vec<String>,

    /// Upstream selection strategy.
    #[serde(default)]
    pub balance: BalanceStrategy,

    /// Maximum concurrent connections per upstream.
    #[serde(default = "default_max_upstream_conns")]
    pub max_connections: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            url_bases: Vec::new(),
            upstreams: Vec::new(),
            balance: BalanceStrategy::default(),
            max_connections: default_max_upstream_conns(),
        }
    }
}

fn default_max_upstream_conns() -> usize {
    100
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
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
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:4567".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: DispatchConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:4566");
        assert!(config.index.include_builtin);
        assert!(config.dispatch.infer_from_signature);
        assert!(config.backends.is_empty());
    }

    #[test]
    fn test_full_toml() {
        let config: DispatchConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "0.0.0.0:5000"

            [dispatch]
            default_region = "eu-west-1"
            fallback_backend = "s3"

            [index]
            exclusions = ["kinesis"]
            artifact_path = "target/backend_index.json"

            [index.aliases]
            legacy_sqs = "sqs"

            [[backends]]
            name = "ledger"
            url_bases = ['https?://ledger\.(.+)\.amazonaws\.com']

            [[backends]]
            name = "sqs"
            upstreams = ["127.0.0.1:7001", "127.0.0.1:7002"]
            balance = "least_connections"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
        assert_eq!(config.listener.max_concurrent_requests, 1_024);
        assert_eq!(config.dispatch.fallback_backend.as_deref(), Some("s3"));
        assert_eq!(config.index.aliases.get("legacy_sqs").map(String::as_str), Some("sqs"));
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[0].url_bases.len(), 1);
        assert_eq!(config.backends[1].balance, BalanceStrategy::LeastConnections);
        assert_eq!(config.backends[1].max_connections, 100);
    }
}
