//! Great-circle distance.

use crate::geo::Coordinate;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Haversine distance between `a` and `b`, in kilometers.
///
/// Symmetric, zero for identical points and bounded by `π · R`. Out-of-range
/// input is not checked here; non-finite input produces NaN.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = lat_b - lat_a;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lon = (d_lon / 2.0).sin();
    // Rounding can push h a hair past 1 for antipodal points.
    let h = (sin_lat * sin_lat + lat_a.cos() * lat_b.cos() * sin_lon * sin_lon).clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Minutes needed to cover `distance_km` at `speed_kmh`.
///
/// Returns `None` for a non-positive or non-finite speed.
pub fn estimate_travel_minutes(distance_km: f64, speed_kmh: f64) -> Option<f64> {
    if !speed_kmh.is_finite() || speed_kmh <= 0.0 {
        return None;
    }
    Some(distance_km / speed_kmh * 60.0)
}
