//! Driver location batch import.
//!
//! # Responsibilities
//! - Parse a CSV of `latitude,longitude` rows (header row required)
//! - Turn each row into a fresh active driver record
//!
//! # Design Decisions
//! - Any bad row aborts the import and names its line
//! - Extra columns are ignored

use chrono::{DateTime, Utc};
use std::io::Read;
use thiserror::Error;
use uuid::Uuid;

use crate::geo::Coordinate;
use crate::matching::Candidate;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: {message}")]
    Row { line: u64, message: String },
}

/// Parse driver locations, stamping each with `now` and a new driver ID.
pub fn read_locations<R: Read>(reader: R, now: DateTime<Utc>) -> Result<Vec<Candidate>, ImportError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut locations = Vec::new();
    for record in csv.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let latitude = parse_field(&record, 0, "latitude", line)?;
        let longitude = parse_field(&record, 1, "longitude", line)?;
        let location = Coordinate::new(latitude, longitude).map_err(|e| ImportError::Row {
            line,
            message: e.to_string(),
        })?;

        locations.push(Candidate {
            id: String::new(),
            driver_id: Uuid::new_v4().to_string(),
            location,
            status: "active".to_string(),
            timestamp: now,
        });
    }
    Ok(locations)
}

fn parse_field(record: &csv::StringRecord, index: usize, name: &str, line: u64) -> Result<f64, ImportError> {
    let raw = record.get(index).ok_or_else(|| ImportError::Row {
        line,
        message: format!("missing {}", name),
    })?;
    raw.parse::<f64>().map_err(|e| ImportError::Row {
        line,
        message: format!("{} '{}': {}", name, raw, e),
    })
}
