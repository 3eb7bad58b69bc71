//! Service-area geometry and coordinate validation.
//!
//! The gateway only answers for a fixed rectangle around Kristiansand.
//! Every entry point that takes a coordinate or a box goes through
//! [`GeoValidator`] before any provider is consulted.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// An axis-aligned lat/lon rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, coord: Coordinate) -> bool {
        coord.lat >= self.min_lat
            && coord.lat <= self.max_lat
            && coord.lon >= self.min_lon
            && coord.lon <= self.max_lon
    }

    pub fn south_west(&self) -> Coordinate {
        Coordinate::new(self.min_lat, self.min_lon)
    }

    pub fn north_east(&self) -> Coordinate {
        Coordinate::new(self.max_lat, self.max_lon)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}, {}-{}",
            self.min_lat, self.max_lat, self.min_lon, self.max_lon
        )
    }
}

/// Hard-coded service area (Kristiansand).
pub const SERVICE_AREA: BoundingBox = BoundingBox {
    min_lat: 58.05,
    max_lat: 58.25,
    min_lon: 7.85,
    max_lon: 8.25,
};

/// Which edge of the service area a coordinate fell outside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    MinLat,
    MaxLat,
    MinLon,
    MaxLon,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Bound::MinLat => "latitude below minimum",
            Bound::MaxLat => "latitude above maximum",
            Bound::MinLon => "longitude below minimum",
            Bound::MaxLon => "longitude above maximum",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("Invalid coordinates: NaN")]
    NotANumber,
    #[error("Coordinates out of bounds ({area}): {bound} {limit} (got {value})")]
    OutOfBounds {
        bound: Bound,
        value: f64,
        limit: f64,
        area: BoundingBox,
    },
}

/// Stateless gate for the fixed service area.
pub struct GeoValidator;

impl GeoValidator {
    pub fn is_in_bounds(coord: Coordinate) -> bool {
        SERVICE_AREA.contains(coord)
    }

    /// Validate a raw lat/lon pair, returning the accepted coordinate.
    pub fn validate(lat: f64, lon: f64) -> Result<Coordinate, GeoError> {
        if lat.is_nan() || lon.is_nan() {
            return Err(GeoError::NotANumber);
        }

        let area = SERVICE_AREA;
        let violation = if lat < area.min_lat {
            Some((Bound::MinLat, lat, area.min_lat))
        } else if lat > area.max_lat {
            Some((Bound::MaxLat, lat, area.max_lat))
        } else if lon < area.min_lon {
            Some((Bound::MinLon, lon, area.min_lon))
        } else if lon > area.max_lon {
            Some((Bound::MaxLon, lon, area.max_lon))
        } else {
            None
        };

        match violation {
            Some((bound, value, limit)) => Err(GeoError::OutOfBounds {
                bound,
                value,
                limit,
                area,
            }),
            None => Ok(Coordinate::new(lat, lon)),
        }
    }

    /// Validate both corners of a requested box independently.
    pub fn validate_box(
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    ) -> Result<BoundingBox, GeoError> {
        Self::validate(min_lat, min_lon)?;
        Self::validate(max_lat, max_lon)?;
        Ok(BoundingBox {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }
}
