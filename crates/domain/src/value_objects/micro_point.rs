//! Integer-encoded coordinate (microdegrees)
//!
//! Map overlays store positions as whole microdegrees. Conversion from a
//! [`Coordinate`] multiplies by one million and truncates toward zero; it
//! never rounds.
//!
//! ```
//! use domain::value_objects::{Coordinate, MicroPoint};
//!
//! let c = Coordinate::new(30.9999995, -50.0000006).expect("valid");
//! let p = MicroPoint::from(c);
//! assert_eq!(p.lat_e6(), 30_999_999);
//! assert_eq!(p.lon_e6(), -50_000_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Coordinate;
use crate::errors::DomainError;

/// Scale factor between decimal degrees and microdegrees
pub const MICRODEGREES: f64 = 1e6;

/// A coordinate stored as `degrees * 1e6`, truncated toward zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MicroPoint {
    lat_e6: i32,
    lon_e6: i32,
}

impl MicroPoint {
    /// Create a point from raw microdegree values
    #[must_use]
    pub const fn new(lat_e6: i32, lon_e6: i32) -> Self {
        Self { lat_e6, lon_e6 }
    }

    /// Encode decimal degrees, truncating toward zero
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // truncation is the encoding rule
    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Self {
            lat_e6: (latitude * MICRODEGREES) as i32,
            lon_e6: (longitude * MICRODEGREES) as i32,
        }
    }

    /// Latitude in microdegrees
    #[must_use]
    pub const fn lat_e6(&self) -> i32 {
        self.lat_e6
    }

    /// Longitude in microdegrees
    #[must_use]
    pub const fn lon_e6(&self) -> i32 {
        self.lon_e6
    }

    /// Decode back to decimal degrees
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCoordinates` when the stored integers lie
    /// outside the valid latitude/longitude range.
    pub fn try_to_coordinate(&self) -> Result<Coordinate, DomainError> {
        Coordinate::new(
            f64::from(self.lat_e6) / MICRODEGREES,
            f64::from(self.lon_e6) / MICRODEGREES,
        )
    }
}

impl From<Coordinate> for MicroPoint {
    fn from(coordinate: Coordinate) -> Self {
        Self::from_degrees(coordinate.latitude(), coordinate.longitude())
    }
}

impl TryFrom<MicroPoint> for Coordinate {
    type Error = DomainError;

    fn try_from(point: MicroPoint) -> Result<Self, Self::Error> {
        point.try_to_coordinate()
    }
}

impl fmt::Display for MicroPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat_e6, self.lon_e6)
    }
}
