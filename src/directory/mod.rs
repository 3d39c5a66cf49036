//! Location Directory access.
//!
//! # Data Flow
//! ```text
//! MatchingEngine
//!     → LocationDirectory::find_candidates(origin, radius, deadline)
//!         → http.rs (login if configured, POST /locations/nearby)
//!         → wire.rs (GeoJSON records → Candidate)
//!     ← Vec<Candidate> in directory order, or DirectoryError
//! ```
//!
//! # Design Decisions
//! - The directory is injected as `Arc<dyn LocationDirectory>`; tests substitute
//!   in-process fakes instead of swapping a global client
//! - Every error is opaque to the matching core beyond success/failure
//! - Returned order is preserved; it decides distance ties

pub mod http;
pub mod wire;

use async_trait::async_trait;
use std::time::Instant;
use thiserror::Error;

use crate::geo::Coordinate;
use crate::matching::Candidate;
use crate::resilience::timeouts::TimeoutError;

pub use http::{DirectoryAuth, HttpLocationDirectory};

/// Errors from the Location Directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("non-success status {0}")]
    Status(u16),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

impl From<TimeoutError> for DirectoryError {
    fn from(_: TimeoutError) -> Self {
        DirectoryError::Timeout
    }
}

impl From<reqwest::Error> for DirectoryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DirectoryError::Timeout
        } else if e.is_decode() {
            DirectoryError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            DirectoryError::Status(status.as_u16())
        } else {
            DirectoryError::Transport(e.to_string())
        }
    }
}

/// Black-box geospatial lookup of drivers near a point.
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    /// Candidates within `radius_km` of `origin`, answered before `deadline`.
    async fn find_candidates(
        &self,
        origin: Coordinate,
        radius_km: f64,
        deadline: Instant,
    ) -> Result<Vec<Candidate>, DirectoryError>;
}
