//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check backend definitions (unique names, usable upstreams)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DispatchConfig → Result<(), Vec<ValidationError>>
//! - Pattern syntax is left to the index build, which reports backend and
//!   pattern together
//! - Configured backends are checked against the exclusions the index build
//!   applies (defaults, explicit entries and renamed names)

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::DispatchConfig;
use crate::index::IndexBuilder;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: `{value}` is not a valid socket address")]
    InvalidAddress { field: String, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: String },

    #[error("{field} must not be empty")]
    Empty { field: String },

    #[error("backend `{0}` is defined more than once")]
    DuplicateBackend(String),

    #[error("backend `{0}` declares neither url_bases nor upstreams")]
    EmptyBackend(String),

    #[error("backend `{backend}` is excluded but also configured")]
    ExcludedBackend { backend: String },

    #[error("admin API enabled with the placeholder api_key")]
    PlaceholderApiKey,
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

fn check_not_empty(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::Empty {
            field: field.to_string(),
        });
    }
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &DispatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.listener.max_concurrent_requests == 0 {
        errors.push(ValidationError::Zero {
            field: "listener.max_concurrent_requests".into(),
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "timeouts.request_secs".into(),
        });
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "timeouts.connect_secs".into(),
        });
    }

    check_not_empty(&mut errors, "dispatch.default_region", &config.dispatch.default_region);
    check_not_empty(&mut errors, "dispatch.default_account_id", &config.dispatch.default_account_id);
    if let Some(fallback) = &config.dispatch.fallback_backend {
        check_not_empty(&mut errors, "dispatch.fallback_backend", fallback);
    }

    for (i, exclusion) in config.index.exclusions.iter().enumerate() {
        check_not_empty(&mut errors, &format!("index.exclusions[{i}]"), exclusion);
    }
    for (from, to) in &config.index.aliases {
        check_not_empty(&mut errors, "index.aliases (key)", from);
        check_not_empty(&mut errors, &format!("index.aliases.{from}"), to);
    }
    if let Some(path) = &config.index.artifact_path {
        check_not_empty(&mut errors, "index.artifact_path", path);
    }

    let index_builder = IndexBuilder::from_config(&config.index);
    let mut seen = HashSet::new();
    for (i, backend) in config.backends.iter().enumerate() {
        if backend.name.trim().is_empty() {
            errors.push(ValidationError::Empty {
                field: format!("backends[{i}].name"),
            });
            continue;
        }
        if !seen.insert(backend.name.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.name.clone()));
        }
        if backend.url_bases.is_empty() && backend.upstreams.is_empty() {
            errors.push(ValidationError::EmptyBackend(backend.name.clone()));
        }
        if index_builder.excludes(&backend.name) {
            errors.push(ValidationError::ExcludedBackend {
                backend: backend.name.clone(),
            });
        }
        for (j, pattern) in backend.url_bases.iter().enumerate() {
            check_not_empty(&mut errors, &format!("backends.{}.url_bases[{j}]", backend.name), pattern);
        }
        for upstream in &backend.upstreams {
            check_address(&mut errors, &format!("backends.{}.upstreams", backend.name), upstream);
        }
        if !backend.upstreams.is_empty() && backend.max_connections == 0 {
            errors.push(ValidationError::Zero {
                field: format!("backends.{}.max_connections", backend.name),
            });
        }
    }

    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key == crate::config::AdminConfig::default().api_key {
            errors.push(ValidationError::PlaceholderApiKey);
        }
        check_not_empty(&mut errors, "admin.api_key", &config.admin.api_key);
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
    use crate::config::BackendConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&DispatchConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = DispatchConfig::default();
        config.listener.bind_address = "bad".into();
        config.timeouts.request_secs = 0;
        config.backends = vec![
            BackendConfig {
                name: "sqs".into(),
                upstreams: vec!["127.0.0.1:7001".into()],
                ..BackendConfig::default()
            },
            BackendConfig {
                name: "sqs".into(),
                upstreams: vec!["nope".into()],
                ..BackendConfig::default()
            },
            BackendConfig {
                name: "empty".into(),
                ..BackendConfig::default()
            },
        ];
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidAddress {
            field: "listener.bind_address".into(),
            value: "bad".into(),
        }));
        assert!(errors.contains(&ValidationError::Zero {
            field: "timeouts.request_secs".into()
        }));
        assert!(errors.contains(&ValidationError::DuplicateBackend("sqs".into())));
        assert!(errors.contains(&ValidationError::EmptyBackend("empty".into())));
        assert!(errors.contains(&ValidationError::PlaceholderApiKey));
        assert!(errors.iter().any(|e| matches!(e,
            ValidationError::InvalidAddress { value, .. } if value == "nope")));
    }

    #[test]
    fn test_configured_backend_cannot_be_excluded() {
        let mut config = DispatchConfig::default();
        config.index.exclusions = vec!["ledger".into()];
        config.backends.push(BackendConfig {
            name: "ledger".into(),
            url_bases: vec![r"https?://ledger\.local".into()],
            ..BackendConfig::default()
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::ExcludedBackend {
                backend: "ledger".into()
            }]
        );
    }

    #[test]
    fn test_default_exclusions_apply_to_configured_backends() {
        let mut config = DispatchConfig::default();
        config.backends.push(BackendConfig {
            name: "opensearch".into(),
            url_bases: vec![r"https?://search\.local".into()],
            ..BackendConfig::default()
        });
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::ExcludedBackend {
                backend: "opensearch".into()
            }]
        );

        config.index.default_exclusions = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_exclusion_of_renamed_backend_applies() {
        let mut config = DispatchConfig::default();
        config.index.aliases.insert("legacy_queue".into(), "retired_queue".into());
        config.index.exclusions = vec!["retired_queue".into()];
        config.backends.push(BackendConfig {
            name: "legacy_queue".into(),
            url_bases: vec![r"https?://queue\.local".into()],
            ..BackendConfig::default()
        });
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::ExcludedBackend {
                backend: "legacy_queue".into()
            }]
        );
    }
}
