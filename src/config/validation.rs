//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//! - Detect duplicate or malformed namespaces
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, PLACEHOLDER_API_KEY};
use crate::submission::validator::is_valid_namespace;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("namespace {0:?} is not a valid namespace name")]
    InvalidNamespace(String),

    #[error("namespace {0:?} is configured more than once")]
    DuplicateNamespace(String),

    #[error("trusted_forward_header {0:?} is not a valid header name")]
    InvalidHeader(String),

    #[error("admin.api_key must be changed when the admin API is enabled")]
    PlaceholderApiKey,

    #[error("at least one [[namespaces]] entry is required")]
    NoNamespaces,

    #[error("producer.log_path must not be empty")]
    EmptyLogPath,
}

/// Check a parsed configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_connections" });
    }
    if config.gateway.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "gateway.max_body_size" });
    }
    if config.gateway.max_id_length == 0 {
        errors.push(ValidationError::Zero { field: "gateway.max_id_length" });
    }

    let header = &config.gateway.trusted_forward_header;
    if !header.is_empty() && axum::http::HeaderName::from_bytes(header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeader(header.clone()));
    }

    if config.namespaces.is_empty() {
        errors.push(ValidationError::NoNamespaces);
    }
    let mut seen = HashSet::new();
    for ns in &config.namespaces {
        if !is_valid_namespace(&ns.name) {
            errors.push(ValidationError::InvalidNamespace(ns.name.clone()));
        } else if !seen.insert(ns.name.as_str()) {
            errors.push(ValidationError::DuplicateNamespace(ns.name.clone()));
        }
    }

    if config.producer.log_path.trim().is_empty() {
        errors.push(ValidationError::EmptyLogPath);
    }

    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key == PLACEHOLDER_API_KEY || config.admin.api_key.is_empty() {
            errors.push(ValidationError::PlaceholderApiKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
