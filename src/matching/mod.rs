//! Nearest-driver matching.
//!
//! # Data Flow
//! ```text
//! find_nearest(origin, radius)
//!     → validate origin and radius (no gate interaction on bad input)
//!     → Gate::allow_request (denied → DownstreamUnavailable)
//!     → LocationDirectory::find_candidates under a deadline
//!     → Gate::record_success / record_failure
//!     → rank candidates by haversine distance (stable), take the head
//! ```
//!
//! # Design Decisions
//! - Stateless across calls; the only shared state is the injected gate
//! - An empty result is a business outcome, not a downstream failure
//! - Distance ties resolve to the directory's returned order

pub mod engine;
pub mod types;

pub use engine::{nearest, rank_candidates, MatchingEngine};
pub use types::{Candidate, MatchError, NearestMatch};
