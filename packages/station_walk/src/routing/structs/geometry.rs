//! Defines the structs which contain all of the details about the physical
//! geometry of a route (i.e. the points it visits and how each step between
//! them should be drawn)
use geo::Point;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::common::geometry::{LatLng, polyline_length};
use crate::common::graph_data::Category;
use crate::loading::classify::Way;

/// A single step between two consecutive nodes of a route. The highway field
/// repeats the category, and is kept for frontends which colour by it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub from: LatLng,
    pub to: LatLng,
    pub category: Category,
    pub highway: Category,
    pub is_highway: bool,
}

impl Segment {
    pub fn new(from: &Point, to: &Point, category: Category) -> Segment {
        Segment {
            from: LatLng::from(*from),
            to: LatLng::from(*to),
            category,
            highway: category,
            is_highway: category.is_road(),
        }
    }
}

/// Stores the geometry of a route while it is being assembled
#[derive(Debug, Clone, Default)]
pub struct CandidateGeometry {
    points: Vec<Point>,
    segments: Vec<Segment>,
}

impl CandidateGeometry {
    pub fn new(start: Point) -> CandidateGeometry {
        CandidateGeometry {
            points: vec![start],
            segments: Vec::new(),
        }
    }

    pub fn get_pos(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Extend the route to the provided point, returning the segment which
    /// was added so that metrics can be updated to match
    pub fn take_step(&mut self, next: Point, category: Category) -> Option<&Segment> {
        let prev = *self.get_pos()?;

        self.segments.push(Segment::new(&prev, &next, category));
        self.points.push(next);

        self.segments.last()
    }

    /// Ground distance covered by the route so far
    pub fn get_length(&self) -> f64 {
        polyline_length(&self.points)
    }

    pub fn finalize(self) -> RouteGeometry {
        RouteGeometry {
            route: self.points.into_iter().map(LatLng::from).collect(),
            route_colored: self.segments,
        }
    }
}

/// Stores the geometry of each route in a format which can easily be rendered
/// in the frontend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteGeometry {
    pub route: Vec<LatLng>,
    pub route_colored: Vec<Segment>,
}

/// One way from the fetched network, drawn behind the route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkFeature {
    pub category: Category,
    pub highway: String,
    pub coords: Vec<LatLng>,
}

/// Re-express each way as a polyline for background rendering. Nodes missing
/// from the table are skipped, and ways which end up with fewer than two
/// points are left out
pub fn network_geometries(
    nodes: &FxHashMap<i64, Point>,
    ways: &[Way],
) -> Vec<NetworkFeature> {
    ways.iter()
        .filter_map(|way| {
            let coords: Vec<LatLng> = way
                .nodes
                .iter()
                .filter_map(|id| nodes.get(id))
                .map(|point| LatLng::from(*point))
                .collect();

            if coords.len() < 2 {
                return None;
            }

            Some(NetworkFeature {
                category: way.category,
                highway: way.highway.clone(),
                coords,
            })
        })
        .collect()
}
