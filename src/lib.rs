//! Ride Matcher Library
//!
//! Nearest-driver matching over a remote location directory, guarded by a
//! circuit breaker.

pub mod admin;
pub mod config;
pub mod directory;
pub mod geo;
pub mod http;
pub mod import;
pub mod lifecycle;
pub mod matching;
pub mod observability;
pub mod resilience;

pub use config::schema::MatcherConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use matching::MatchingEngine;
pub use resilience::Gate;
