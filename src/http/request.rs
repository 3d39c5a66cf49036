//! Request identification and body types.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID when the client did not send one
//! - Define the JSON bodies accepted by the API
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - An incoming `x-request-id` is kept so callers can correlate

use axum::http::{HeaderValue, Request};
use serde::Deserialize;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID generator producing random UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID header, if present and printable.
pub fn request_id_of<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Body of `POST /api/v1/match`.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Search radius in kilometers.
    #[serde(default)]
    pub radius: Option<f64>,
}

/// Body of `POST /api/v1/match/estimate`.
#[derive(Debug, Clone, Deserialize)]
pub struct EstimateRequest {
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub driver_latitude: f64,
    pub driver_longitude: f64,
}
