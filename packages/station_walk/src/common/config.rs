//! This module contains structs which represent the configuration options
//! selected by the end user for each request, along with the service-level
//! settings which control how routes are found. User configs are received
//! exactly as they arrive from the API, and converted into validated configs
//! with try_into.

use geo::Point;
use serde::Deserialize;
use std::str::FromStr;

use crate::common::bbox::BBox;
use crate::common::error::{InputError, SettingsError};
use crate::common::geometry::{distance, midpoint};

/// Radius used around the route midpoint when none is requested
pub const DEFAULT_NAVIGATION_RADIUS_M: f64 = 2000.0;

/// Radius used around the catalog centre when none is requested
pub const DEFAULT_CATALOG_RADIUS_M: f64 = 600.0;

/// Parse a "lat,lng" string into a point, validating that both values are
/// within the range of real coordinates
fn parse_coordinate(
    name: &'static str,
    value: Option<&str>,
) -> Result<Point, InputError> {
    let value = value.ok_or(InputError::MissingParameter(name))?;
    let invalid = || InputError::InvalidCoordinate {
        name,
        value: value.to_string(),
    };

    let parts: Vec<f64> = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| invalid())?;

    match parts.as_slice() {
        [lat, lng]
            if (-90.0..=90.0).contains(lat) && (-180.0..=180.0).contains(lng) =>
        {
            Ok(Point::new(*lng, *lat))
        }
        _ => Err(invalid()),
    }
}

/// Validate a user provided radius, falling back to the default if none was
/// provided
fn parse_radius(radius_m: Option<f64>, default: f64) -> Result<f64, InputError> {
    match radius_m {
        Some(radius) if radius.is_finite() && radius > 0.0 => Ok(radius),
        Some(radius) => Err(InputError::InvalidRadius(radius)),
        None => Ok(default),
    }
}

/// Stores the user's requested route exactly as it is received from the API
#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct UserRouteConfig {
    pub origin: Option<String>,
    pub dest: Option<String>,
    pub radius_m: Option<f64>,
}

impl TryFrom<UserRouteConfig> for RouteConfig {
    type Error = InputError;

    fn try_from(user: UserRouteConfig) -> Result<RouteConfig, Self::Error> {
        let origin = parse_coordinate("origin", user.origin.as_deref())?;
        let destination = parse_coordinate("dest", user.dest.as_deref())?;
        let radius_m = parse_radius(user.radius_m, DEFAULT_NAVIGATION_RADIUS_M)?;

        Ok(RouteConfig {
            origin,
            destination,
            radius_m,
        })
    }
}

/// Stores a validated route request. It is not expected that this struct will
/// be built from the API directly, a UserRouteConfig should be converted
/// with try_into
#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    pub origin: Point,
    pub destination: Point,
    pub radius_m: f64,
}

/// The area which geodata will be requested for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchArea {
    pub bbox: BBox,
    pub radius_m: f64,
}

impl RouteConfig {
    /// Generate a bounding box around the midpoint of the route. The radius is
    /// grown beyond the requested one when the endpoints are far apart, so
    /// that the box always covers both of them with some buffer
    pub fn get_search_area(&self, expansion: f64) -> SearchArea {
        let centre = midpoint(&self.origin, &self.destination);
        let separation = distance(&self.origin, &self.destination);
        let radius_m = self.radius_m.max(separation * expansion);

        SearchArea {
            bbox: BBox::from_point_radius(&centre, radius_m),
            radius_m,
        }
    }
}

/// Stores the user's requested catalog area exactly as it is received from
/// the API. If a bbox is provided it takes priority over the centre point
#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct UserPathsConfig {
    pub center: Option<String>,
    pub bbox: Option<String>,
    pub radius_m: Option<f64>,
}

/// A validated catalog request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathsConfig {
    pub bbox: BBox,
}

impl TryFrom<UserPathsConfig> for PathsConfig {
    type Error = InputError;

    fn try_from(user: UserPathsConfig) -> Result<PathsConfig, Self::Error> {
        if let Some(bbox) = user.bbox.as_deref() {
            return Ok(PathsConfig {
                bbox: BBox::from_str(bbox)?,
            });
        }

        let centre = match user.center.as_deref() {
            Some(center) => parse_coordinate("center", Some(center))?,
            None => return Err(InputError::MissingParameter("bbox or center")),
        };
        let radius_m = parse_radius(user.radius_m, DEFAULT_CATALOG_RADIUS_M)?;

        Ok(PathsConfig {
            bbox: BBox::from_point_radius(&centre, radius_m),
        })
    }
}

/// Service-level settings which control how the graph is weighted and how far
/// the planner will look for the nearest graph node to each endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingSettings {
    pub pedestrian_weight: f64,
    pub road_weight: f64,
    pub search_radii: Vec<f64>,
    pub bbox_expansion: f64,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        RoutingSettings {
            pedestrian_weight: 1.0,
            road_weight: 3.0,
            search_radii: vec![200.0, 500.0, 1000.0],
            bbox_expansion: 1.5,
        }
    }
}

impl RoutingSettings {
    /// Create settings with custom edge weights, keeping the default search
    /// radii. Weights which would let roads undercut footpaths are rejected
    pub fn new(
        pedestrian_weight: f64,
        road_weight: f64,
    ) -> Result<RoutingSettings, SettingsError> {
        RoutingSettings {
            pedestrian_weight,
            road_weight,
            ..RoutingSettings::default()
        }
        .validate()
    }

    pub fn validate(self) -> Result<RoutingSettings, SettingsError> {
        if !(self.pedestrian_weight.is_finite() && self.pedestrian_weight > 0.0) {
            return Err(SettingsError::PedestrianWeight(self.pedestrian_weight));
        }
        if !(self.road_weight.is_finite() && self.road_weight >= 1.0) {
            return Err(SettingsError::RoadWeight(self.road_weight));
        }

        let radii_ok = !self.search_radii.is_empty()
            && self.search_radii.iter().all(|radius| *radius > 0.0)
            && self.search_radii.windows(2).all(|pair| pair[0] < pair[1]);
        if !radii_ok {
            return Err(SettingsError::SearchRadii);
        }

        Ok(self)
    }
}
