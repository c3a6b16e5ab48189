pub mod geometry;
pub mod metrics;

use crate::routing::structs::geometry::{CandidateGeometry, NetworkFeature, RouteGeometry};
use crate::routing::structs::metrics::{CandidateMetrics, RouteMetrics};

use serde::Serialize;

use crate::common::graph_data::{Category, NodeData};
use crate::loading::petgraph::WalkGraph;

/// Category used for a step whose pair of nodes has no recorded category
const DEFAULT_CATEGORY: Category = Category::Footway;

/// Container for a route which is being assembled from a node path
#[derive(Debug, Clone)]
pub struct Candidate {
    // Tracked using identifiers from OSM, so that categories can be looked up
    // for each step
    pub points: Vec<i64>,
    pub geometry: CandidateGeometry,
    pub metrics: CandidateMetrics,
}

impl Candidate {
    pub fn new(start: &NodeData) -> Candidate {
        Candidate {
            points: vec![start.id],
            geometry: CandidateGeometry::new(start.point),
            metrics: CandidateMetrics::new(),
        }
    }

    /// Move the candidate on to the next node, using the provided category to
    /// colour the step
    pub fn take_step(&mut self, next: &NodeData, category: Option<Category>) {
        let category = category.unwrap_or(DEFAULT_CATEGORY);

        if let Some(segment) = self.geometry.take_step(next.point, category) {
            self.metrics.take_step(segment);
        }
        self.points.push(next.id);
    }

    pub fn finalize(self) -> Route {
        let total = self.geometry.get_length();

        Route {
            geometry: self.geometry.finalize(),
            metrics: self.metrics.finalize(total),
        }
    }
}

/// A fully assembled route, with the polyline, the coloured segments and the
/// distance totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    #[serde(flatten)]
    pub geometry: RouteGeometry,
    pub metrics: RouteMetrics,
}

/// Convert a path of node IDs into a route, looking up each node in the graph
/// which was searched. Returns None for an empty path, or one which visits a
/// node that isn't in the graph
pub fn assemble_route(graph: &WalkGraph, path: &[i64]) -> Option<Route> {
    let (first, rest) = path.split_first()?;
    let mut candidate = Candidate::new(graph.node(*first)?);

    for next_id in rest {
        let next = graph.node(*next_id)?;
        let prev_id = *candidate.points.last()?;
        candidate.take_step(next, graph.category(prev_id, *next_id));
    }

    Some(candidate.finalize())
}

/// Whether the route was found on footpaths alone, or needed roads to
/// connect its endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    PedestrianOnly,
    Hybrid,
}

/// Summary statistics for a planned route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStats {
    /// Nodes fetched for the request, including road nodes if the hybrid
    /// graph was used
    pub nodes: usize,
    /// Pedestrian ways fetched for the request
    pub ways: usize,
    #[serde(flatten)]
    pub metrics: RouteMetrics,
    pub uses_highways: bool,
    pub routing_mode: RoutingMode,
}

/// Everything returned to the user for a successfully planned route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    #[serde(flatten)]
    pub geometry: RouteGeometry,
    pub network: Vec<NetworkFeature>,
    pub meta: RouteStats,
}

impl RouteResult {
    pub fn new(
        route: Route,
        network: Vec<NetworkFeature>,
        nodes: usize,
        ways: usize,
        mode: RoutingMode,
    ) -> RouteResult {
        RouteResult {
            geometry: route.geometry,
            network,
            meta: RouteStats {
                nodes,
                ways,
                metrics: route.metrics,
                uses_highways: mode == RoutingMode::Hybrid,
                routing_mode: mode,
            },
        }
    }
}
