//! Geographic primitives.
//!
//! # Data Flow
//! ```text
//! Raw latitude/longitude (request body, directory record)
//!     → coordinate.rs (range-checked Coordinate)
//!     → distance.rs (haversine great-circle distance in km)
//! ```
//!
//! # Design Decisions
//! - Distances are kilometers on a sphere of mean Earth radius
//! - Distance is a pure function; malformed input yields NaN, never a panic

pub mod coordinate;
pub mod distance;

pub use coordinate::{Coordinate, CoordinateError};
pub use distance::{distance, estimate_travel_minutes, EARTH_RADIUS_KM};
