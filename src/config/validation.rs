//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds and timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MatcherConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::MatcherConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check every semantic constraint and report all violations.
pub fn validate_config(config: &MatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.gate.failure_threshold == 0 {
        errors.push(ValidationError::new("gate.failure_threshold", "must be at least 1"));
    }
    if config.gate.reset_timeout_secs == 0 {
        errors.push(ValidationError::new("gate.reset_timeout_secs", "must be greater than 0"));
    }

    match Url::parse(&config.directory.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "directory.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("directory.base_url", e.to_string())),
    }
    if config.directory.timeout_ms == 0 {
        errors.push(ValidationError::new("directory.timeout_ms", "must be greater than 0"));
    }
    if config.directory.username.is_some() != config.directory.password.is_some() {
        errors.push(ValidationError::new(
            "directory.username",
            "username and password must be set together",
        ));
    }

    if !is_positive(config.matching.default_radius_km) {
        errors.push(ValidationError::new("matching.default_radius_km", "must be a positive number"));
    }
    if !is_positive(config.matching.average_speed_kmh) {
        errors.push(ValidationError::new("matching.average_speed_kmh", "must be a positive number"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    } else if config.directory.timeout_ms >= config.timeouts.request_secs.saturating_mul(1000) {
        // Directory deadline fires before the request timeout.
        errors.push(ValidationError::new(
            "directory.timeout_ms",
            format!(
                "must be shorter than timeouts.request_secs ({}s)",
                config.timeouts.request_secs
            ),
        ));
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("'{}' is not one of pretty, json", config.observability.log_format),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::new("admin.api_key", "required when admin is enabled"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
