//! Admin endpoints.
//!
//! Read-only diagnostics behind a static bearer key.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::{get_gate, get_status};
use crate::http::server::AppState;

/// Routes mounted under `/admin`, merged into the main router.
pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/gate", get(get_gate))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
