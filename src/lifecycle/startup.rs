//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the gate, directory client and matching engine in dependency order
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Exactly one gate per protected dependency, created here

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{load_config, ConfigError, MatcherConfig};
use crate::directory::{DirectoryError, HttpLocationDirectory};
use crate::matching::MatchingEngine;
use crate::resilience::{Gate, GateConfig};

/// Name under which the directory gate reports.
pub const DIRECTORY_RESOURCE: &str = "location-directory";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("location directory client: {0}")]
    Directory(#[from] DirectoryError),
}

/// Config from `path`, or defaults when no path is given.
pub fn load_or_default(path: Option<&Path>) -> Result<MatcherConfig, StartupError> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(MatcherConfig::default()),
    }
}

/// Wire the HTTP directory client behind its gate.
pub fn build_engine(config: &MatcherConfig) -> Result<MatchingEngine, StartupError> {
    let gate = Arc::new(Gate::new(DIRECTORY_RESOURCE, GateConfig::from(&config.gate)));
    let directory = Arc::new(HttpLocationDirectory::from_config(&config.directory)?);

    tracing::info!(
        base_url = %directory.base_url(),
        failure_threshold = config.gate.failure_threshold,
        reset_timeout_secs = config.gate.reset_timeout_secs,
        timeout_ms = config.directory.timeout_ms,
        "Location directory client ready"
    );

    Ok(MatchingEngine::new(
        directory,
        gate,
        Duration::from_millis(config.directory.timeout_ms),
    ))
}
