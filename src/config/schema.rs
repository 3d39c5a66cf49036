//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the matcher.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the ride matcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MatcherConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Circuit breaker guarding the Location Directory.
    pub gate: GateSettings,

    /// Location Directory endpoint and credentials.
    pub directory: DirectoryConfig,

    /// Matching behavior.
    pub matching: MatchingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin endpoints.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8081").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8081".to_string(),
        }
    }
}

/// Circuit breaker settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GateSettings {
    /// Consecutive failures before the gate opens.
    pub failure_threshold: u32,

    /// Seconds the gate stays open before a trial call.
    pub reset_timeout_secs: u64,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_secs: 10,
        }
    }
}

/// Location Directory client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Base URL of the driver location service.
    pub base_url: String,

    /// Deadline for one directory exchange (login + lookup) in milliseconds.
    pub timeout_ms: u64,

    /// Login username; used together with `password`.
    pub username: Option<String>,

    /// Login password.
    pub password: Option<String>,

    /// Static bearer token, used when no credentials are set.
    pub api_token: Option<String>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 2000,
            username: None,
            password: None,
            api_token: None,
        }
    }
}

/// Matching behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Search radius when a request does not give one.
    pub default_radius_km: f64,

    /// Average driving speed for arrival estimates.
    pub average_speed_kmh: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_radius_km: 5.0,
            average_speed_kmh: 40.0,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,

    /// "pretty" for humans, "json" for log shipping.
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Expose `/admin/*` routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}
