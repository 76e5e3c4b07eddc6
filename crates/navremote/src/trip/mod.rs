//! Trip decoding and GPX export.
//!
//! A [`TripDecoder`] turns the bytes of a history file into a [`TripRecord`]
//! and writes a record out as a GPX document.

pub mod gpx;
pub mod record;

pub use record::{TrackPoint, TripRecord};

/// Error decoding a history file or writing GPX
#[derive(Debug, thiserror::Error)]
pub enum TripError {
    #[error("malformed history record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("track point {index} has invalid coordinates ({latitude}, {longitude})")]
    InvalidPoint { index: usize, latitude: f64, longitude: f64 },
    #[error("failed to write GPX: {0}")]
    Gpx(#[from] std::fmt::Error),
}

/// Decoder for one history file format
pub trait TripDecoder: Send + Sync {
    /// Parse the raw contents of a history file
    fn decode(&self, bytes: &[u8]) -> Result<TripRecord, TripError>;

    /// Serialize a decoded record as GPX text
    fn encode_gpx(&self, record: &TripRecord) -> Result<String, TripError> {
        gpx::write_gpx(record)
    }
}

/// Decoder for history records stored as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTripDecoder;

impl TripDecoder for JsonTripDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<TripRecord, TripError> {
        let record: TripRecord = serde_json::from_slice(bytes)?;
        record.validate()?;
        Ok(record)
    }
}
