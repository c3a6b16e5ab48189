//! Error types for every stage of a request. Input and fetch errors are
//! wrapped by RoutingFailure, which is what the planner hands back to the
//! request-handling layer.

use serde_json::{Value, json};
use thiserror::Error;

use crate::common::bbox::BBox;
use crate::common::geometry::LatLng;

/// Problems with the parameters supplied by the user, these are reported
/// before any data is fetched
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid {name} format '{value}', expected lat,lng")]
    InvalidCoordinate { name: &'static str, value: String },
    #[error("Invalid bbox '{0}', expected south,west,north,east")]
    InvalidBBox(String),
    #[error("Invalid radius {0}, must be a positive number of metres")]
    InvalidRadius(f64),
    #[error("Unable to parse query string: {0}")]
    InvalidQuery(String),
}

/// Service-level routing settings which cannot produce sensible routes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Road weight {0} must be at least 1.0")]
    RoadWeight(f64),
    #[error("Pedestrian weight {0} must be positive")]
    PedestrianWeight(f64),
    #[error("Search radii must be positive and in increasing order")]
    SearchRadii,
}

/// Failures of the geodata fetch itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("No geodata endpoints have been configured")]
    NoEndpoints,
    #[error("Unable to prepare geodata query: {0}")]
    Query(String),
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("Unable to decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("All {attempts} geodata endpoints failed, last error: {last}")]
    AllEndpointsFailed { attempts: usize, last: Box<FetchError> },
}

/// Every way in which a routing (or catalog) request can fail. Each variant
/// carries enough context for the user to decide whether retrying with a
/// larger radius is worthwhile
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingFailure {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Geodata fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error(
        "No pedestrian footpaths found in area (searched {radius_m:.0}m radius). Try increasing radius_m parameter."
    )]
    NoPedestrianData { radius_m: f64, bbox: BBox },
    #[error(
        "Failed to build routing graph from footpaths (searched {radius_m:.0}m radius). Try increasing radius_m parameter."
    )]
    EmptyGraph {
        radius_m: f64,
        bbox: BBox,
        ways: usize,
        nodes: usize,
    },
    #[error(
        "Could not find footpath within {:.0}m of origin ({point}). The area may not have mapped footpaths.",
        max_radius(.radii)
    )]
    OriginUnresolved {
        point: LatLng,
        radii: Vec<f64>,
        ways: usize,
        nodes: usize,
    },
    #[error(
        "Could not find footpath within {:.0}m of destination ({point}). The area may not have mapped footpaths.",
        max_radius(.radii)
    )]
    DestinationUnresolved {
        point: LatLng,
        radii: Vec<f64>,
        ways: usize,
        nodes: usize,
    },
    #[error(
        "No route found between points. Even with highway connectors, no path exists."
    )]
    Unreachable {
        origin_node: i64,
        dest_node: i64,
        /// Radius at which each endpoint was snapped to the pedestrian graph
        origin_radius_m: f64,
        dest_radius_m: f64,
        graph_size: usize,
        ways: usize,
        tried_hybrid: bool,
    },
    #[error("Request did not complete within {timeout_secs}s")]
    TimedOut { timeout_secs: f64 },
    #[error("Request could not be handled: {0}")]
    Service(String),
}

fn max_radius(radii: &[f64]) -> f64 {
    radii.iter().copied().fold(0.0, f64::max)
}

impl RoutingFailure {
    /// Diagnostic details to be returned alongside the error message
    pub fn debug_context(&self) -> Value {
        match self {
            RoutingFailure::Input(_) => json!({}),
            RoutingFailure::Fetch(_) => json!({ "retryable": true }),
            RoutingFailure::NoPedestrianData { radius_m, bbox } => json!({
                "bbox": bbox,
                "radius_m": radius_m,
            }),
            RoutingFailure::EmptyGraph {
                radius_m,
                bbox,
                ways,
                nodes,
            } => json!({
                "bbox": bbox,
                "radius_m": radius_m,
                "ways_count": ways,
                "nodes_count": nodes,
            }),
            RoutingFailure::OriginUnresolved {
                point,
                radii,
                ways,
                nodes,
            } => json!({
                "origin": point,
                "radii_m": radii,
                "ways_found": ways,
                "nodes_found": nodes,
                "suggestion": "Try a different starting point or increase radius_m parameter",
            }),
            RoutingFailure::DestinationUnresolved {
                point,
                radii,
                ways,
                nodes,
            } => json!({
                "dest": point,
                "radii_m": radii,
                "ways_found": ways,
                "nodes_found": nodes,
                "suggestion": "Try a different destination or increase radius_m parameter",
            }),
            RoutingFailure::Unreachable {
                origin_node,
                dest_node,
                origin_radius_m,
                dest_radius_m,
                graph_size,
                ways,
                tried_hybrid,
            } => json!({
                "origin_node": origin_node,
                "dest_node": dest_node,
                "origin_search_radius_m": origin_radius_m,
                "dest_search_radius_m": dest_radius_m,
                "graph_size": graph_size,
                "ways_in_area": ways,
                "tried_hybrid": tried_hybrid,
            }),
            RoutingFailure::TimedOut { timeout_secs } => json!({
                "timeout_s": timeout_secs,
                "retryable": true,
            }),
            RoutingFailure::Service(_) => json!({}),
        }
    }
}
