//! Everything required to turn a graph into a route. Endpoints are snapped to
//! the graph, the cheapest path between them is found, and the path is
//! converted back into coordinates and distance totals.

pub mod catalog;
pub mod dijkstra;
pub mod nearest;
pub mod planner;
pub mod structs;
