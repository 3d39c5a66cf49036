//! Error responses.
//!
//! # Design Decisions
//! - Every error body is `{"error": "<message>"}`
//! - Gate denials become 503 with `Retry-After`; directory failures become 502
//! - Precondition violations are the client's fault (400)

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::time::Duration;

use crate::matching::MatchError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Failures surfaced by the API.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable { message: String, retry_after: Duration },
    BadGateway(String),
    Unauthorized,
    Internal(String),
}

impl ApiError {
    /// Map a matching failure; `retry_after` is the gate's reset timeout.
    pub fn from_match(error: MatchError, retry_after: Duration) -> Self {
        let message = error.to_string();
        match error {
            MatchError::InvalidCoordinate(_) | MatchError::InvalidRadius(_) => {
                ApiError::BadRequest(message)
            }
            MatchError::NoCandidatesFound => ApiError::NotFound(message),
            MatchError::DownstreamUnavailable => ApiError::Unavailable {
                message,
                retry_after,
            },
            MatchError::DownstreamError(_) => ApiError::BadGateway(message),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, retry_after) = match self {
            ApiError::BadRequest(m)
            | ApiError::NotFound(m)
            | ApiError::BadGateway(m)
            | ApiError::Internal(m) => (m, None),
            ApiError::Unavailable {
                message,
                retry_after,
            } => (message, Some(retry_after)),
            ApiError::Unauthorized => ("unauthorized".to_string(), None),
        };

        let mut response = (status, Json(ErrorBody { error: message })).into_response();
        if let Some(retry_after) = retry_after {
            // Whole seconds, rounded up.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
