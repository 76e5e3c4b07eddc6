//! Decoded trip record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TripError;

/// One recorded trip: a named, ordered sequence of location fixes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub locations: Vec<TrackPoint>,
}

/// A single location fix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,

    /// Meters above sea level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    /// Meters per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    /// Degrees from true north
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_accuracy: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, ..Default::default() }
    }

    fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl TripRecord {
    /// Check every fix has WGS84 coordinates
    pub fn validate(&self) -> Result<(), TripError> {
        match self.locations.iter().position(|point| !point.is_valid()) {
            Some(index) => Err(TripError::InvalidPoint {
                index,
                latitude: self.locations[index].latitude,
                longitude: self.locations[index].longitude,
            }),
            None => Ok(()),
        }
    }
}
