//! Wire format of the driver location service.
//!
//! Locations travel as GeoJSON points, so coordinates are `[longitude, latitude]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::DirectoryError;
use crate::geo::Coordinate;
use crate::matching::Candidate;

/// GeoJSON `Point`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: vec![coordinate.longitude, coordinate.latitude],
        }
    }

    /// Unchecked coordinate; range validation is left to the consumer.
    pub fn to_coordinate(&self) -> Result<Coordinate, DirectoryError> {
        match self.coordinates.as_slice() {
            [longitude, latitude] => Ok(Coordinate {
                latitude: *latitude,
                longitude: *longitude,
            }),
            other => Err(DirectoryError::Decode(format!(
                "expected [longitude, latitude], got {} values",
                other.len()
            ))),
        }
    }
}

/// One driver location record as stored by the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverLocationRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub driver_id: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<DriverLocationRecord> for Candidate {
    type Error = DirectoryError;

    fn try_from(record: DriverLocationRecord) -> Result<Self, Self::Error> {
        let location = record.location.to_coordinate()?;
        Ok(Candidate {
            id: record.id,
            driver_id: record.driver_id,
            location,
            status: record.status,
            timestamp: record.timestamp,
        })
    }
}

impl From<&Candidate> for DriverLocationRecord {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id.clone(),
            driver_id: candidate.driver_id.clone(),
            location: GeoPoint::from_coordinate(candidate.location),
            status: candidate.status.clone(),
            timestamp: candidate.timestamp,
        }
    }
}

/// Body of `POST /api/v1/locations/nearby`. Radius is in meters.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
}

impl NearbyRequest {
    pub fn new(origin: Coordinate, radius_km: f64) -> Self {
        Self {
            latitude: origin.latitude,
            longitude: origin.longitude,
            radius: radius_km * 1000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
