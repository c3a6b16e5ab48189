use crate::common::geometry::distance;
use crate::common::graph_data::{Category, EdgeData, EdgeKey, NodeData};
use crate::loading::classify::Way;
use geo::Point;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry::{Occupied, Vacant};

/// Controls what happens when an edge is added between two nodes which
/// already have a category recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CategoryPolicy {
    /// Keep whichever category has the higher rank
    HighestRank,
    /// Only record the category if the pair has none yet
    KeepExisting,
}

/// An undirected, weighted graph of walkable edges. Alongside the petgraph
/// graph, a mapping from OSM node IDs to node indexes is held, as well as the
/// category to display for each pair of connected nodes. Nodes are only ever
/// added to the graph along with an edge, so every node has at least one
/// neighbour.
#[derive(Debug, Clone, Default)]
pub struct WalkGraph {
    pub graph: UnGraph<NodeData, EdgeData>,
    pub id_inx_map: FxHashMap<i64, NodeIndex>,
    pub edge_categories: FxHashMap<EdgeKey, Category>,
}

impl WalkGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    pub fn contains(&self, id: i64) -> bool {
        self.id_inx_map.contains_key(&id)
    }

    pub fn node_index(&self, id: i64) -> Option<NodeIndex> {
        self.id_inx_map.get(&id).copied()
    }

    pub fn node(&self, id: i64) -> Option<&NodeData> {
        self.node_index(id)
            .and_then(|inx| self.graph.node_weight(inx))
    }

    /// Retrieve the category to display for the edge between two nodes,
    /// regardless of the direction it is travelled in
    pub fn category(&self, u: i64, v: i64) -> Option<Category> {
        self.edge_categories.get(&EdgeKey::new(u, v)).copied()
    }

    /// Every (neighbour, weight) pair reachable from a node in a single step.
    /// Where several ways join the same pair of nodes, each contributes its
    /// own entry
    pub fn neighbours(&self, id: i64) -> Vec<(i64, f64)> {
        let inx = match self.node_index(id) {
            Some(inx) => inx,
            None => return Vec::new(),
        };

        self.graph
            .edges(inx)
            .filter_map(|edge| {
                let other = if edge.source() == inx {
                    edge.target()
                } else {
                    edge.source()
                };
                self.graph
                    .node_weight(other)
                    .map(|data| (data.id, edge.weight().weight))
            })
            .collect()
    }

    /// Fetch the index for a node, adding it to the graph if this is the first
    /// edge which touches it
    fn get_or_add_node(&mut self, id: i64, point: Point) -> NodeIndex {
        match self.id_inx_map.entry(id) {
            Occupied(entry) => *entry.get(),
            Vacant(entry) => {
                let inx = self.graph.add_node(NodeData { id, point });
                *entry.insert(inx)
            }
        }
    }

    /// Record the category for a pair of nodes according to the provided
    /// policy
    fn set_category(&mut self, key: EdgeKey, category: Category, policy: CategoryPolicy) {
        match self.edge_categories.entry(key) {
            Vacant(entry) => {
                entry.insert(category);
            }
            Occupied(mut entry) => {
                if policy == CategoryPolicy::HighestRank
                    && category.rank() > entry.get().rank()
                {
                    entry.insert(category);
                }
            }
        }
    }

    /// Add one edge for every consecutive pair of nodes in a way. The weight of
    /// each edge is the ground distance between its nodes multiplied by the
    /// provided multiplier. Pairs where either node is missing from the node
    /// table are skipped
    fn add_way(
        &mut self,
        way: &Way,
        nodes: &FxHashMap<i64, Point>,
        multiplier: f64,
        policy: CategoryPolicy,
    ) {
        for pair in way.nodes.windows(2) {
            let (u, v) = (pair[0], pair[1]);
            if u == v {
                continue;
            }

            let (u_point, v_point) = match (nodes.get(&u), nodes.get(&v)) {
                (Some(u_point), Some(v_point)) => (*u_point, *v_point),
                _ => continue,
            };

            let dist = distance(&u_point, &v_point);
            let u_inx = self.get_or_add_node(u, u_point);
            let v_inx = self.get_or_add_node(v, v_point);

            self.graph.add_edge(
                u_inx,
                v_inx,
                EdgeData {
                    weight: dist * multiplier,
                },
            );

            self.set_category(EdgeKey::new(u, v), way.category, policy);
        }
    }
}

/// Based on the pedestrian ways which have been fetched for an area, generate
/// a graph which can be used for route plotting. Edge weights are the ground
/// distance in metres. Where more than one way joins the same pair of nodes,
/// the category with the highest rank is kept for display, so the outcome
/// does not depend on the order of the ways.
pub fn build_graph(nodes: &FxHashMap<i64, Point>, ways: &[Way]) -> WalkGraph {
    let mut graph = WalkGraph::default();

    for way in ways {
        graph.add_way(way, nodes, 1.0, CategoryPolicy::HighestRank);
    }

    graph
}

/// Generate a graph containing both pedestrian ways and roads. Pedestrian
/// ways are added exactly as in build_graph, scaled by pedestrian_weight.
/// Roads are added afterwards, scaled by road_weight so that they are only
/// used where no reasonable pedestrian alternative exists. A road never
/// replaces the category of a pair which is already joined by a pedestrian
/// way, although both edges remain available to the search
pub fn build_hybrid_graph(
    nodes: &FxHashMap<i64, Point>,
    pedestrian_ways: &[Way],
    road_ways: &[Way],
    pedestrian_weight: f64,
    road_weight: f64,
) -> WalkGraph {
    let mut graph = WalkGraph::default();

    for way in pedestrian_ways {
        graph.add_way(way, nodes, pedestrian_weight, CategoryPolicy::HighestRank);
    }

    for way in road_ways {
        graph.add_way(way, nodes, road_weight, CategoryPolicy::KeepExisting);
    }

    graph
}
