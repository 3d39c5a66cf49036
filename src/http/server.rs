//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Bind server to listener and drain on shutdown
//! - Translate API bodies into matching calls

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, MatchedPath, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::{AdminConfig, MatcherConfig, MatchingConfig};
use crate::geo::{distance, estimate_travel_minutes, Coordinate};
use crate::http::request::{request_id_of, EstimateRequest, MakeRequestUuidV4, MatchRequest};
use crate::http::response::ApiError;
use crate::lifecycle::startup::{build_engine, StartupError};
use crate::matching::{MatchingEngine, NearestMatch};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchingEngine>,
    pub matching: MatchingConfig,
    pub admin: AdminConfig,
}

/// HTTP server for the matching API.
pub struct HttpServer {
    router: Router,
    config: MatcherConfig,
}

impl HttpServer {
    /// Build the server and its directory client from configuration.
    pub fn new(config: MatcherConfig) -> Result<Self, StartupError> {
        let engine = Arc::new(build_engine(&config)?);
        Ok(Self::with_engine(config, engine))
    }

    /// Build the server around an existing engine.
    pub fn with_engine(config: MatcherConfig, engine: Arc<MatchingEngine>) -> Self {
        let state = AppState {
            engine,
            matching: config.matching.clone(),
            admin: config.admin.clone(),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &MatcherConfig, state: AppState) -> Router {
        let mut api = Router::new()
            .route("/health", get(health))
            .route("/api/v1/match", post(find_nearest_driver))
            .route("/api/v1/match/estimate", post(estimate_time));

        if config.admin.enabled {
            api = api.merge(setup_admin_router(state.clone()));
        }

        api.route_layer(middleware::from_fn(track_http_metrics))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "http",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request_id_of(request),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Router with all layers, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }
}

async fn track_http_metrics(request: Request<Body>, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let response = next.run(request).await;
    metrics::record_http_response(&route, response.status().as_u16());
    response
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Find the nearest available driver to the posted location.
async fn find_nearest_driver(
    State(state): State<AppState>,
    body: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<NearestMatch>, ApiError> {
    let Json(request) = body.map_err(|e| {
        tracing::debug!(error = %e, "Rejected match request body");
        ApiError::BadRequest("invalid request body".to_string())
    })?;

    let origin = Coordinate {
        latitude: request.latitude,
        longitude: request.longitude,
    };
    let radius_km = request.radius.unwrap_or(state.matching.default_radius_km);

    match state.engine.find_nearest(origin, radius_km).await {
        Ok(found) => {
            tracing::debug!(
                driver_id = %found.driver.driver_id,
                distance_km = found.distance_km,
                "Driver matched"
            );
            Ok(Json(found))
        }
        Err(e) => {
            tracing::info!(error = %e, kind = e.kind(), "Match failed");
            let retry_after = state.engine.gate().config().reset_timeout;
            Err(ApiError::from_match(e, retry_after))
        }
    }
}

#[derive(Debug, Serialize)]
struct EstimateResponse {
    distance_km: f64,
    estimated_time_minutes: f64,
}

/// Distance and driving time between a pickup point and a driver.
async fn estimate_time(
    State(state): State<AppState>,
    body: Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let Json(request) = body.map_err(|_| ApiError::BadRequest("invalid request body".to_string()))?;

    let pickup = Coordinate::new(request.pickup_latitude, request.pickup_longitude)
        .map_err(|e| ApiError::BadRequest(format!("pickup: {}", e)))?;
    let driver = Coordinate::new(request.driver_latitude, request.driver_longitude)
        .map_err(|e| ApiError::BadRequest(format!("driver: {}", e)))?;

    let distance_km = distance(pickup, driver);
    let estimated_time_minutes = estimate_travel_minutes(distance_km, state.matching.average_speed_kmh)
        .ok_or_else(|| ApiError::Internal("average speed is not configured".to_string()))?;

    Ok(Json(EstimateResponse {
        distance_km,
        estimated_time_minutes,
    }))
}
