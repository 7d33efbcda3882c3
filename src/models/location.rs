// Coordinate model representing a point on the earth's surface

use crate::error::{Error, Result};
use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};

/// A (latitude, longitude) pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Creates a new coordinate from latitude and longitude in degrees
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Returns `InvalidInput` when the coordinate is out of range
    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::invalid_input(format!(
                "coordinate ({}, {}) is out of range",
                self.lat, self.lng
            )))
        }
    }

    /// Converts to a `geo` point (x = longitude, y = latitude)
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }

    /// Great-circle distance to another coordinate, in meters
    pub fn haversine_distance_to(&self, other: &Coordinate) -> f64 {
        if self == other {
            return 0.0;
        }
        self.to_point().haversine_distance(&other.to_point())
    }
}
