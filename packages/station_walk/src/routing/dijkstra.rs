use std::{cmp::Ordering, collections::BinaryHeap};

use petgraph::{graph::NodeIndex, visit::EdgeRef};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::loading::petgraph::WalkGraph;

#[derive(Copy, Clone, Debug)]
struct State {
    cost: f64,
    node: NodeIndex,
}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

/// Dijkstra's algorithm between a single pair of nodes, identified by their
/// OSM IDs. The search stops as soon as the goal is taken from the frontier.
/// Returns the total weight of the path along with the IDs of every node on
/// it, or None if the goal can't be reached from the start
pub fn shortest_path_with_cost(
    graph: &WalkGraph,
    start: i64,
    goal: i64,
) -> Option<(f64, Vec<i64>)> {
    let start_inx = graph.node_index(start)?;
    let goal_inx = graph.node_index(goal)?;

    let mut distances: FxHashMap<NodeIndex, f64> = FxHashMap::default();
    let mut predecessors: FxHashMap<NodeIndex, NodeIndex> = FxHashMap::default();
    let mut settled: FxHashSet<NodeIndex> = FxHashSet::default();
    let mut heap = BinaryHeap::new();

    // Start node has distance 0
    heap.push(State {
        cost: 0.0,
        node: start_inx,
    });
    distances.insert(start_inx, 0.0);

    let mut goal_cost: Option<f64> = None;
    while let Some(State { cost, node }) = heap.pop() {
        // Stale entries for nodes which have already been finalised
        if !settled.insert(node) {
            continue;
        }

        if node == goal_inx {
            goal_cost = Some(cost);
            break;
        }

        for edge in graph.graph.edges(node) {
            let next = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            if settled.contains(&next) {
                continue;
            }

            let next_cost = cost + edge.weight().weight;
            let improved = match distances.get(&next) {
                Some(&best) => next_cost < best,
                None => true,
            };

            if improved {
                distances.insert(next, next_cost);
                predecessors.insert(next, node);
                heap.push(State {
                    cost: next_cost,
                    node: next,
                });
            }
        }
    }

    let total = goal_cost?;

    // Follow predecessors backward from goal to start
    let mut node_path = vec![goal_inx];
    let mut current = goal_inx;
    while current != start_inx {
        current = *predecessors.get(&current)?;
        node_path.push(current);
    }
    node_path.reverse();

    let ids = node_path
        .into_iter()
        .filter_map(|inx| graph.graph.node_weight(inx).map(|data| data.id))
        .collect();

    Some((total, ids))
}

/// Find the cheapest sequence of node IDs from start to goal. An empty vector
/// is returned if no path exists, while a path from a node to itself contains
/// just that node
pub fn shortest_path(graph: &WalkGraph, start: i64, goal: i64) -> Vec<i64> {
    if start == goal {
        return vec![start];
    }

    match shortest_path_with_cost(graph, start, goal) {
        Some((_, path)) => path,
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {

    use approx::assert_relative_eq;
    use geo::Point;

    use super::*;
    use crate::common::geometry::distance;
    use crate::common::graph_data::{Category, EdgeKey};
    use crate::loading::classify::Way;
    use crate::loading::petgraph::tests::{get_test_nodes, get_test_way};
    use crate::loading::petgraph::{build_graph, build_hybrid_graph};

    /// A square of nodes 1-2-3-4 with ~111m sides, plus a diagonal 1-3
    fn get_square_nodes() -> FxHashMap<i64, Point> {
        let mut nodes = FxHashMap::default();
        nodes.insert(1, Point::new(0.0, 0.0));
        nodes.insert(2, Point::new(0.001, 0.0));
        nodes.insert(3, Point::new(0.001, 0.001));
        nodes.insert(4, Point::new(0.0, 0.001));
        nodes
    }

    fn get_square_ways() -> Vec<Way> {
        vec![
            get_test_way(1, vec![1, 2, 3], Category::Footway),
            get_test_way(2, vec![3, 4, 1], Category::Sidewalk),
        ]
    }

    /// Confirm that every consecutive pair of a path is joined by an edge
    fn assert_path_is_connected(graph: &WalkGraph, path: &[i64]) {
        for pair in path.windows(2) {
            let joined = graph
                .neighbours(pair[0])
                .iter()
                .any(|(id, _)| *id == pair[1]);
            assert!(joined, "{} and {} are not joined", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_same_start_and_goal() {
        let graph = build_graph(&get_square_nodes(), &get_square_ways());

        assert_eq!(shortest_path(&graph, 2, 2), vec![2]);
    }

    #[test]
    fn test_follows_edges() {
        let graph = build_graph(&get_square_nodes(), &get_square_ways());

        let result = shortest_path(&graph, 1, 3);

        assert_eq!(result.len(), 3);
        assert_eq!(result.first(), Some(&1));
        assert_eq!(result.last(), Some(&3));
        assert_path_is_connected(&graph, &result);
    }

    #[test]
    fn test_prefers_shorter_route() {
        let nodes = get_square_nodes();
        let mut ways = get_square_ways();
        ways.push(get_test_way(3, vec![1, 3], Category::Path));

        let graph = build_graph(&nodes, &ways);

        let result = shortest_path_with_cost(&graph, 1, 3);

        match result {
            Some((cost, path)) => {
                assert_eq!(path, vec![1, 3]);
                assert_relative_eq!(cost, distance(&nodes[&1], &nodes[&3]));
            }
            None => panic!("Should have found a path"),
        }
    }

    /// No node appears twice in a returned path
    #[test]
    fn test_path_has_no_repeats() {
        let nodes = get_square_nodes();
        let mut ways = get_square_ways();
        ways.push(get_test_way(3, vec![2, 4], Category::Path));

        let graph = build_graph(&nodes, &ways);
        let result = shortest_path(&graph, 1, 4);

        let unique: FxHashSet<i64> = result.iter().copied().collect();

        assert_eq!(unique.len(), result.len());
    }

    #[test]
    fn test_disconnected() {
        let nodes = get_test_nodes();
        let ways = vec![
            get_test_way(1, vec![1, 2], Category::Footway),
            get_test_way(2, vec![3, 4], Category::Footway),
        ];

        let graph = build_graph(&nodes, &ways);

        assert!(shortest_path(&graph, 1, 4).is_empty());
        assert_eq!(shortest_path_with_cost(&graph, 1, 4), None);
    }

    #[test]
    fn test_unknown_nodes() {
        let graph = build_graph(&get_square_nodes(), &get_square_ways());

        assert!(shortest_path(&graph, 1, 99).is_empty());
        assert!(shortest_path(&graph, 99, 1).is_empty());
    }

    /// Removing the only link between two halves of a graph leaves no path
    #[test]
    fn test_removed_bridge() {
        let nodes = get_test_nodes();
        let ways = vec![get_test_way(1, vec![1, 2, 3], Category::Footway)];
        let mut graph = build_graph(&nodes, &ways);

        assert_eq!(shortest_path(&graph, 1, 3), vec![1, 2, 3]);

        let (u_inx, v_inx) = match (graph.node_index(2), graph.node_index(3)) {
            (Some(u), Some(v)) => (u, v),
            _ => panic!("Nodes missing from the graph"),
        };
        match graph.graph.find_edge(u_inx, v_inx) {
            Some(edge) => {
                graph.graph.remove_edge(edge);
            }
            None => panic!("Edge missing from the graph"),
        }
        graph.edge_categories.remove(&EdgeKey::new(2, 3));

        assert!(shortest_path(&graph, 1, 3).is_empty());
    }

    /// Diagonal roads only win while their penalised weight undercuts the
    /// two sides of the square
    #[test]
    fn test_hybrid_cost_with_road_penalty() {
        let nodes = get_square_nodes();
        let pedestrian = get_square_ways();
        let roads = vec![
            get_test_way(10, vec![1, 3], Category::Road),
            get_test_way(11, vec![2, 4], Category::Road),
        ];

        let plain = build_graph(&nodes, &pedestrian);

        for road_weight in [1.0, 1.5, 3.0] {
            let hybrid =
                build_hybrid_graph(&nodes, &pedestrian, &roads, 1.0, road_weight);

            for (start, goal) in [(1, 3), (2, 4), (1, 2)] {
                let plain_cost = match shortest_path_with_cost(&plain, start, goal) {
                    Some((cost, _)) => cost,
                    None => panic!("Pedestrian path should exist"),
                };
                let hybrid_cost = match shortest_path_with_cost(&hybrid, start, goal)
                {
                    Some((cost, _)) => cost,
                    None => panic!("Hybrid path should exist"),
                };

                // Roads here are shorter on the ground, so only the penalty
                // keeps the pedestrian route competitive
                let road_ground = distance(&nodes[&start], &nodes[&goal]);
                let expected = plain_cost.min(road_ground * road_weight);
                assert_relative_eq!(hybrid_cost, expected, max_relative = 1e-9);
            }
        }
    }

    /// A road which covers the same ground as a footway is never preferred
    #[test]
    fn test_hybrid_cost_matches_pedestrian_for_equal_ground() {
        let nodes = get_square_nodes();
        let pedestrian = get_square_ways();
        let roads = vec![get_test_way(10, vec![1, 2, 3], Category::Road)];

        let plain = build_graph(&nodes, &pedestrian);
        let hybrid = build_hybrid_graph(&nodes, &pedestrian, &roads, 1.0, 3.0);

        let plain_cost = shortest_path_with_cost(&plain, 1, 3).map(|(cost, _)| cost);
        let hybrid_cost =
            shortest_path_with_cost(&hybrid, 1, 3).map(|(cost, _)| cost);

        match (plain_cost, hybrid_cost) {
            (Some(plain_cost), Some(hybrid_cost)) => {
                assert!(hybrid_cost >= plain_cost - 1e-9);
                assert_relative_eq!(hybrid_cost, plain_cost);
            }
            _ => panic!("Both searches should succeed"),
        }
    }
}
