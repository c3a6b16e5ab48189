//! Great-circle helpers shared by the graph builders, the nearest node lookup
//! and the route assembler. Coordinates are held as `geo::Point`, which stores
//! longitude as x and latitude as y.

use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean radius of the Earth in metres
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate the haversine distance in metres between two points. No
/// ellipsoidal correction is applied.
pub fn distance(a: &Point, b: &Point) -> f64 {
    let phi_1 = a.y().to_radians();
    let phi_2 = b.y().to_radians();
    let d_phi = (b.y() - a.y()).to_radians();
    let d_lambda = (b.x() - a.x()).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi_1.cos() * phi_2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Sum of the haversine distances between consecutive points of a polyline
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|pair| distance(&pair[0], &pair[1])).sum()
}

/// Midpoint of two coordinates, taken as the plain average of latitude and
/// longitude. Only used to centre a fetch window, so no great-circle
/// correction is needed.
pub fn midpoint(a: &Point, b: &Point) -> Point {
    Point::new((a.x() + b.x()) / 2.0, (a.y() + b.y()) / 2.0)
}

/// A coordinate as it is sent to the frontend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<Point> for LatLng {
    fn from(point: Point) -> LatLng {
        LatLng {
            lat: point.y(),
            lng: point.x(),
        }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

impl From<LatLng> for Point {
    fn from(coord: LatLng) -> Point {
        Point::new(coord.lng, coord.lat)
    }
}
