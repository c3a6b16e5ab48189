//! Snaps arbitrary coordinates onto the routing graph. Only nodes which are
//! part of the graph are candidates, so an endpoint can never be snapped to a
//! node which has no edges.

use geo::Point;
use petgraph::visit::IntoNodeReferences;

use crate::common::geometry::distance;
use crate::loading::petgraph::WalkGraph;

/// A graph node which an endpoint has been snapped to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapped {
    pub node: i64,
    pub distance: f64,
    /// The search radius at which the node was first found
    pub radius: f64,
}

/// Identifies which endpoint could not be placed on the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    Origin,
    Destination,
}

/// Determine the closest graph node to the provided point, along with its
/// distance in metres. Returns None if the closest node is further away than
/// max_distance_m, or if the graph is empty. Where several nodes are equally
/// close, the first one encountered is kept
pub fn nearest_node(
    point: &Point,
    graph: &WalkGraph,
    max_distance_m: f64,
) -> Option<(i64, f64)> {
    // Set variables to keep track of the current closest node
    let mut smallest_dist = f64::MAX;
    let mut closest_id: Option<i64> = None;

    for (_, node_data) in graph.graph.node_references() {
        let dist = distance(point, &node_data.point);

        if dist < smallest_dist {
            smallest_dist = dist;
            closest_id = Some(node_data.id);
        }
    }

    match closest_id {
        Some(id) if smallest_dist <= max_distance_m => Some((id, smallest_dist)),
        _ => None,
    }
}

/// Snap both endpoints of a route to the graph, trying each search radius in
/// turn until both have been found. An endpoint which is found at a smaller
/// radius keeps that match while the search widens for the other one. If an
/// endpoint is still unresolved after the largest radius, the origin is
/// reported ahead of the destination
pub fn resolve_endpoints(
    origin: &Point,
    destination: &Point,
    graph: &WalkGraph,
    radii: &[f64],
) -> Result<(Snapped, Snapped), Unresolved> {
    let mut origin_match: Option<Snapped> = None;
    let mut dest_match: Option<Snapped> = None;

    for radius in radii.iter().copied() {
        if origin_match.is_none() {
            origin_match = nearest_node(origin, graph, radius)
                .map(|(node, distance)| Snapped { node, distance, radius });
        }
        if dest_match.is_none() {
            dest_match = nearest_node(destination, graph, radius)
                .map(|(node, distance)| Snapped { node, distance, radius });
        }
        if origin_match.is_some() && dest_match.is_some() {
            break;
        }
    }

    match (origin_match, dest_match) {
        (Some(origin), Some(dest)) => Ok((origin, dest)),
        (None, _) => Err(Unresolved::Origin),
        (Some(_), None) => Err(Unresolved::Destination),
    }
}
