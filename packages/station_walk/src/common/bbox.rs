//! Defines a struct to represent a bounding box, which is used to represent
//! a 2d square(ish) on the planet's surface. This is used to scope the data
//! which is requested from Overpass, and is echoed back to the frontend so
//! that it can set the viewport on the map

use geo::Point;
use serde::Serialize;
use std::str::FromStr;

use crate::common::error::InputError;

/// Approximate number of metres covered by one degree of latitude
pub const METRES_PER_DEGREE: f64 = 111_320.0;

/// Latitudes are clamped to this value before the longitude span is derived,
/// so that cos(lat) never reaches zero
const MAX_ABS_LAT: f64 = 89.9;

/// A bounding box for geographical data. Contains the minimum and maximum
/// latitudes & longitudes, defining a 'rectangle' on the surface of the Earth
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct BBox {
    #[serde(rename = "south")]
    pub min_lat: f64,
    #[serde(rename = "west")]
    pub min_lon: f64,
    #[serde(rename = "north")]
    pub max_lat: f64,
    #[serde(rename = "east")]
    pub max_lon: f64,
}

impl BBox {
    /// Expand a centre point by the requested radius in every direction. The
    /// half-height is radius / 111320 degrees of latitude, and the half-width
    /// is scaled by the cosine of the latitude to account for meridians
    /// converging towards the poles
    pub fn from_point_radius(centre: &Point, radius_m: f64) -> Self {
        let lat = centre.y();
        let lon = centre.x();

        let clamped = lat.clamp(-MAX_ABS_LAT, MAX_ABS_LAT);
        let d_lat = radius_m / METRES_PER_DEGREE;
        let d_lon = radius_m / (METRES_PER_DEGREE * clamped.to_radians().cos());

        BBox {
            min_lat: lat - d_lat,
            min_lon: lon - d_lon,
            max_lat: lat + d_lat,
            max_lon: lon + d_lon,
        }
    }

    /// Check whether a point falls within (or on the edge of) the box
    #[cfg(test)]
    pub fn contains(&self, point: &Point) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.y())
            && (self.min_lon..=self.max_lon).contains(&point.x())
    }

    /// Render the box in the south,west,north,east order which Overpass
    /// expects for its bbox filter
    pub fn to_overpass(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

impl FromStr for BBox {
    type Err = InputError;

    /// Parse a box from a "south,west,north,east" string
    fn from_str(input: &str) -> Result<BBox, Self::Err> {
        let parts: Vec<f64> = input
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| InputError::InvalidBBox(input.to_string()))?;

        match parts.as_slice() {
            [south, west, north, east]
                if parts.iter().all(|val| val.is_finite())
                    && south <= north
                    && west <= east =>
            {
                Ok(BBox {
                    min_lat: *south,
                    min_lon: *west,
                    max_lat: *north,
                    max_lon: *east,
                })
            }
            _ => Err(InputError::InvalidBBox(input.to_string())),
        }
    }
}
