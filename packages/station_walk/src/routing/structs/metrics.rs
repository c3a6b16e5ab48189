//! Defines the structs which contain high level information about a route
//! (i.e. total distance, and how much of it is spent on roads)

use geo::Point;
use serde::Serialize;

use crate::common::geometry::distance;
use crate::routing::structs::geometry::Segment;

/// Container for the running totals of a route while it is being assembled
#[derive(Debug, Clone, Default)]
pub struct CandidateMetrics {
    pub pedestrian_dist: f64,
    pub highway_dist: f64,
}

impl CandidateMetrics {
    pub fn new() -> CandidateMetrics {
        CandidateMetrics::default()
    }

    /// Update the metrics to reflect their state after traversing the
    /// provided segment. Distances are measured on the ground, so the road
    /// penalty used during search has no effect here
    pub fn take_step(&mut self, segment: &Segment) {
        let dist = distance(&Point::from(segment.from), &Point::from(segment.to));

        if segment.is_highway {
            self.highway_dist += dist;
        } else {
            self.pedestrian_dist += dist;
        }
    }

    /// Produce the final metrics, total_dist should be the length of the full
    /// polyline for the route
    pub fn finalize(self, total_dist: f64) -> RouteMetrics {
        RouteMetrics {
            distance_m: total_dist,
            pedestrian_distance_m: self.pedestrian_dist,
            highway_distance_m: self.highway_dist,
        }
    }
}

/// Container for the overall metrics of a completed route
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteMetrics {
    pub distance_m: f64,
    pub pedestrian_distance_m: f64,
    pub highway_distance_m: f64,
}
