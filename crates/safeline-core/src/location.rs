//! Validated geographic coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Latitude/longitude pair in decimal degrees.
///
/// Always finite and within range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

/// Wire shape of [`Coordinates`], checked before it becomes one.
#[derive(Deserialize)]
struct RawCoordinates {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = InputError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lon)
    }
}

impl Coordinates {
    /// Validate and build coordinates.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InputError> {
        if !lat.is_finite()
            || !lon.is_finite()
            || !(-90.0..=90.0).contains(&lat)
            || !(-180.0..=180.0).contains(&lon)
        {
            return Err(InputError::InvalidCoordinates { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Latitude.
    pub fn lat(self) -> f64 {
        self.lat
    }

    /// Longitude.
    pub fn lon(self) -> f64 {
        self.lon
    }

    /// Map link for these coordinates.
    pub fn maps_url(self) -> String {
        format!("https://maps.google.com/?q={},{}", self.lat, self.lon)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}
