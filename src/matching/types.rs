//! Matching data model and error taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::directory::DirectoryError;
use crate::geo::{Coordinate, CoordinateError};

/// A driver returned by the Location Directory as potentially eligible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Directory record identifier (may be empty).
    #[serde(default)]
    pub id: String,
    pub driver_id: String,
    pub location: Coordinate,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
}

/// The selected candidate and its distance from the origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestMatch {
    pub driver: Candidate,
    pub distance_km: f64,
}

/// Reasons a nearest-driver lookup can fail.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Origin failed range checks; rejected before touching the gate.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),

    /// Radius must be positive and finite.
    #[error("invalid search radius: {0}")]
    InvalidRadius(f64),

    /// The gate denied the call; the directory was not contacted.
    #[error("location directory temporarily unavailable")]
    DownstreamUnavailable,

    /// The directory call failed and was recorded against the gate.
    #[error("location directory error: {0}")]
    DownstreamError(#[from] DirectoryError),

    #[error("no drivers found within the specified radius")]
    NoCandidatesFound,
}

impl MatchError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MatchError::InvalidCoordinate(_) => "invalid_coordinate",
            MatchError::InvalidRadius(_) => "invalid_radius",
            MatchError::DownstreamUnavailable => "downstream_unavailable",
            MatchError::DownstreamError(_) => "downstream_error",
            MatchError::NoCandidatesFound => "no_candidates",
        }
    }
}
