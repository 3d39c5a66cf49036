//! Matching engine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::directory::{DirectoryError, LocationDirectory};
use crate::geo::{distance, Coordinate};
use crate::matching::types::{Candidate, MatchError, NearestMatch};
use crate::observability::metrics;
use crate::resilience::timeouts;
use crate::resilience::Gate;

/// Selects the closest available driver through a gated directory.
pub struct MatchingEngine {
    directory: Arc<dyn LocationDirectory>,
    gate: Arc<Gate>,
    call_timeout: Duration,
}

impl MatchingEngine {
    /// `call_timeout` bounds every directory exchange.
    pub fn new(directory: Arc<dyn LocationDirectory>, gate: Arc<Gate>, call_timeout: Duration) -> Self {
        Self {
            directory,
            gate,
            call_timeout,
        }
    }

    /// The gate protecting the directory.
    pub fn gate(&self) -> &Arc<Gate> {
        &self.gate
    }

    /// Nearest eligible candidate to `origin` within `radius_km`.
    pub async fn find_nearest(
        &self,
        origin: Coordinate,
        radius_km: f64,
    ) -> Result<NearestMatch, MatchError> {
        let start = Instant::now();
        let result = self.lookup(origin, radius_km).await;

        let outcome = match &result {
            Ok(_) => "matched",
            Err(e) => e.kind(),
        };
        metrics::record_match(outcome, start);
        result
    }

    async fn lookup(&self, origin: Coordinate, radius_km: f64) -> Result<NearestMatch, MatchError> {
        origin.validate()?;
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(MatchError::InvalidRadius(radius_km));
        }

        // Held across the call: if this future is dropped mid-flight the
        // permit records a failure.
        let Some(permit) = self.gate.try_acquire() else {
            tracing::debug!(resource = %self.gate.resource(), "Directory call rejected by gate");
            return Err(MatchError::DownstreamUnavailable);
        };

        let candidates = match self.call_directory(origin, radius_km).await {
            Ok(candidates) => {
                permit.succeed();
                metrics::record_directory_call("success");
                candidates
            }
            Err(e) => {
                permit.fail();
                metrics::record_directory_call(directory_failure_label(&e));
                tracing::warn!(
                    resource = %self.gate.resource(),
                    error = %e,
                    "Location directory call failed"
                );
                return Err(MatchError::DownstreamError(e));
            }
        };

        tracing::debug!(
            latitude = origin.latitude,
            longitude = origin.longitude,
            radius_km,
            candidates = candidates.len(),
            "Ranking candidates"
        );
        nearest(origin, candidates).ok_or(MatchError::NoCandidatesFound)
    }

    async fn call_directory(
        &self,
        origin: Coordinate,
        radius_km: f64,
    ) -> Result<Vec<Candidate>, DirectoryError> {
        let deadline = timeouts::deadline_after(self.call_timeout);
        timeouts::with_deadline(
            deadline,
            self.directory.find_candidates(origin, radius_km, deadline),
        )
        .await?
    }
}

fn directory_failure_label(e: &DirectoryError) -> &'static str {
    match e {
        DirectoryError::Timeout => "timeout",
        DirectoryError::Status(_) => "status",
        DirectoryError::Auth(_) => "auth",
        DirectoryError::Decode(_) => "decode",
        DirectoryError::Transport(_) | DirectoryError::Endpoint(_) => "transport",
    }
}

/// Pair each candidate with its distance from `origin`, closest first.
///
/// The sort is stable, so equal distances keep the input order. Candidates
/// with invalid coordinates are dropped.
pub fn rank_candidates(origin: Coordinate, candidates: Vec<Candidate>) -> Vec<NearestMatch> {
    let mut ranked: Vec<NearestMatch> = candidates
        .into_iter()
        .filter_map(|candidate| {
            if let Err(e) = candidate.location.validate() {
                tracing::warn!(driver_id = %candidate.driver_id, error = %e, "Skipping candidate with invalid location");
                return None;
            }
            let distance_km = distance(origin, candidate.location);
            Some(NearestMatch {
                driver: candidate,
                distance_km,
            })
        })
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked
}

/// Closest candidate to `origin`, first in input order on ties.
pub fn nearest(origin: Coordinate, candidates: Vec<Candidate>) -> Option<NearestMatch> {
    rank_candidates(origin, candidates).into_iter().next()
}
