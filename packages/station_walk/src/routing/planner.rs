//! Plans a single route from start to finish. Pedestrian ways are fetched and
//! searched first, and only if they cannot connect the two endpoints are roads
//! fetched and merged into a hybrid graph which is searched again.

use geo::Point;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::common::config::{RouteConfig, RoutingSettings, SearchArea};
use crate::common::error::RoutingFailure;
use crate::common::geometry::LatLng;
use crate::loading::classify::{ExtractMode, Way, extract_ways};
use crate::loading::overpass::{GeoData, GeoDataSource, Layer};
use crate::loading::petgraph::{WalkGraph, build_graph, build_hybrid_graph};
use crate::routing::dijkstra::shortest_path;
use crate::routing::nearest::{Snapped, Unresolved, resolve_endpoints};
use crate::routing::structs::geometry::network_geometries;
use crate::routing::structs::{RouteResult, RoutingMode, assemble_route};

/// The pedestrian network for a request, along with the data it was built
/// from
struct PedestrianNetwork {
    data: GeoData,
    ways: Vec<Way>,
    graph: WalkGraph,
}

/// Fetch the pedestrian ways for the search area, and build them into a
/// routing graph
async fn load_pedestrian_network<S: GeoDataSource>(
    source: &S,
    area: &SearchArea,
) -> Result<PedestrianNetwork, RoutingFailure> {
    let data = source.fetch(Layer::Pedestrian, &area.bbox).await?;
    let ways = extract_ways(&data.ways, &data.nodes, ExtractMode::Navigation);

    info!(
        "Fetched {} pedestrian ways ({} navigable) and {} nodes",
        data.ways.len(),
        ways.len(),
        data.nodes.len()
    );

    if ways.is_empty() {
        return Err(RoutingFailure::NoPedestrianData {
            radius_m: area.radius_m,
            bbox: area.bbox,
        });
    }

    let graph = build_graph(&data.nodes, &ways);
    if graph.is_empty() {
        return Err(RoutingFailure::EmptyGraph {
            radius_m: area.radius_m,
            bbox: area.bbox,
            ways: ways.len(),
            nodes: data.nodes.len(),
        });
    }

    debug!(
        "Pedestrian graph has {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(PedestrianNetwork { data, ways, graph })
}

/// Resolve the endpoints of a route within the pedestrian graph, converting
/// any failure into the matching diagnostic
fn resolve_pedestrian(
    network: &PedestrianNetwork,
    config: &RouteConfig,
    settings: &RoutingSettings,
) -> Result<(Snapped, Snapped), RoutingFailure> {
    let radii = &settings.search_radii;
    let ways = network.ways.len();
    let nodes = network.data.nodes.len();

    match resolve_endpoints(&config.origin, &config.destination, &network.graph, radii) {
        Ok(snapped) => Ok(snapped),
        Err(Unresolved::Origin) => Err(RoutingFailure::OriginUnresolved {
            point: LatLng::from(config.origin),
            radii: radii.clone(),
            ways,
            nodes,
        }),
        Err(Unresolved::Destination) => Err(RoutingFailure::DestinationUnresolved {
            point: LatLng::from(config.destination),
            radii: radii.clone(),
            ways,
            nodes,
        }),
    }
}

/// A route found on the hybrid graph, along with the merged node table it
/// was found on
struct HybridRoute {
    graph: WalkGraph,
    nodes: FxHashMap<i64, Point>,
    path: Vec<i64>,
}

/// Fetch roads for the search area and search again over a graph which
/// contains both pedestrian ways and roads. Returns None if there are no
/// roads, or if the roads still don't connect the two endpoints
async fn search_hybrid<S: GeoDataSource>(
    source: &S,
    area: &SearchArea,
    network: &PedestrianNetwork,
    config: &RouteConfig,
    settings: &RoutingSettings,
) -> Result<Option<HybridRoute>, RoutingFailure> {
    let roads = source.fetch(Layer::Road, &area.bbox).await?;
    let nodes = network.data.merge_nodes(&roads);
    let road_ways = extract_ways(&roads.ways, &nodes, ExtractMode::Roads);

    info!("Fetched {} road ways for hybrid routing", road_ways.len());

    if road_ways.is_empty() {
        return Ok(None);
    }

    let graph = build_hybrid_graph(
        &nodes,
        &network.ways,
        &road_ways,
        settings.pedestrian_weight,
        settings.road_weight,
    );

    debug!(
        "Hybrid graph has {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    let (origin, dest) = match resolve_endpoints(
        &config.origin,
        &config.destination,
        &graph,
        &settings.search_radii,
    ) {
        Ok(snapped) => snapped,
        Err(side) => {
            warn!("Unable to resolve {side:?} in hybrid graph");
            return Ok(None);
        }
    };

    let path = shortest_path(&graph, origin.node, dest.node);
    if path.is_empty() {
        return Ok(None);
    }

    Ok(Some(HybridRoute { graph, nodes, path }))
}

/// Plan a walking route between the origin and destination of the provided
/// config. The pedestrian network is always tried first, roads are only
/// brought in (at a penalty) if the pedestrian network alone has no path
/// between the two endpoints
pub async fn plan_route<S: GeoDataSource>(
    source: &S,
    config: &RouteConfig,
    settings: &RoutingSettings,
) -> Result<RouteResult, RoutingFailure> {
    let area = config.get_search_area(settings.bbox_expansion);

    info!(
        "Planning route from {} to {} within {:.0}m",
        LatLng::from(config.origin),
        LatLng::from(config.destination),
        area.radius_m
    );

    let network = load_pedestrian_network(source, &area).await?;
    let (origin, dest) = resolve_pedestrian(&network, config, settings)?;

    debug!(
        "Resolved origin to {} ({:.1}m, within {:.0}m) and destination to {} ({:.1}m, within {:.0}m)",
        origin.node, origin.distance, origin.radius, dest.node, dest.distance, dest.radius
    );

    let background = network_geometries(&network.data.nodes, &network.ways);
    let ways = network.ways.len();

    let path = shortest_path(&network.graph, origin.node, dest.node);
    if !path.is_empty() {
        info!("Found pedestrian route with {} nodes", path.len());
        let route = assemble_route(&network.graph, &path).ok_or_else(|| {
            unreachable_failure(&network, &origin, &dest, false)
        })?;
        return Ok(RouteResult::new(
            route,
            background,
            network.data.nodes.len(),
            ways,
            RoutingMode::PedestrianOnly,
        ));
    }

    info!("No pedestrian route found, falling back to hybrid routing");

    match search_hybrid(source, &area, &network, config, settings).await? {
        Some(hybrid) => {
            info!("Found hybrid route with {} nodes", hybrid.path.len());
            let route = assemble_route(&hybrid.graph, &hybrid.path)
                .ok_or_else(|| unreachable_failure(&network, &origin, &dest, true))?;
            Ok(RouteResult::new(
                route,
                background,
                hybrid.nodes.len(),
                ways,
                RoutingMode::Hybrid,
            ))
        }
        None => Err(unreachable_failure(&network, &origin, &dest, true)),
    }
}

fn unreachable_failure(
    network: &PedestrianNetwork,
    origin: &Snapped,
    dest: &Snapped,
    tried_hybrid: bool,
) -> RoutingFailure {
    RoutingFailure::Unreachable {
        origin_node: origin.node,
        dest_node: dest.node,
        origin_radius_m: origin.radius,
        dest_radius_m: dest.radius,
        graph_size: network.graph.node_count(),
        ways: network.ways.len(),
        tried_hybrid,
    }
}

#[cfg(test)]
pub(crate) mod tests {

    use std::sync::Mutex;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::common::bbox::BBox;
    use crate::common::error::FetchError;
    use crate::loading::overpass::{RawWay, Tags};

    /// Metres per degree of latitude for the haversine radius
    const METRES_PER_DEGREE_LAT: f64 = 111_194.926_644_558_7;

    /// In-memory geodata, returning fixed data for each layer and recording
    /// the layers which were requested
    pub(crate) struct FakeSource {
        pub pedestrian: Result<GeoData, FetchError>,
        pub road: Result<GeoData, FetchError>,
        pub calls: Mutex<Vec<Layer>>,
    }

    impl FakeSource {
        pub(crate) fn new(pedestrian: GeoData, road: GeoData) -> FakeSource {
            FakeSource {
                pedestrian: Ok(pedestrian),
                road: Ok(road),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn layers_requested(&self) -> Vec<Layer> {
            match self.calls.lock() {
                Ok(calls) => calls.clone(),
                Err(_) => panic!("Call log was poisoned"),
            }
        }
    }

    impl GeoDataSource for FakeSource {
        async fn fetch(&self, layer: Layer, _bbox: &BBox) -> Result<GeoData, FetchError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(layer);
            }
            match layer {
                Layer::Pedestrian => self.pedestrian.clone(),
                Layer::Road => self.road.clone(),
            }
        }
    }

    pub(crate) fn raw_way(id: i64, nodes: Vec<i64>, pairs: &[(&str, &str)]) -> RawWay {
        let tags: Tags = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RawWay { id, nodes, tags }
    }

    /// Point a given number of metres north of the base coordinate
    pub(crate) fn north_of_base(metres: f64) -> Point {
        Point::new(72.0, 19.0 + metres / METRES_PER_DEGREE_LAT)
    }

    /// Two nodes 100m apart, joined by a single footway
    pub(crate) fn get_single_footway() -> GeoData {
        let mut data = GeoData::default();
        data.nodes.insert(1, north_of_base(0.0));
        data.nodes.insert(2, north_of_base(100.0));
        data.ways
            .push(raw_way(10, vec![1, 2], &[("highway", "footway")]));
        data
    }

    /// Two 100m footways, separated by a 50m gap which is only covered by a
    /// residential road
    fn get_split_clusters() -> (GeoData, GeoData) {
        let mut pedestrian = GeoData::default();
        pedestrian.nodes.insert(1, north_of_base(0.0));
        pedestrian.nodes.insert(2, north_of_base(100.0));
        pedestrian.nodes.insert(3, north_of_base(150.0));
        pedestrian.nodes.insert(4, north_of_base(250.0));
        pedestrian
            .ways
            .push(raw_way(10, vec![1, 2], &[("highway", "footway")]));
        pedestrian.ways.push(raw_way(
            11,
            vec![3, 4],
            &[("highway", "footway"), ("footway", "sidewalk")],
        ));

        let mut road = GeoData::default();
        road.nodes.insert(2, north_of_base(100.0));
        road.nodes.insert(3, north_of_base(150.0));
        road.ways
            .push(raw_way(20, vec![2, 3], &[("highway", "residential")]));

        (pedestrian, road)
    }

    fn get_config(origin: Point, destination: Point) -> RouteConfig {
        RouteConfig {
            origin,
            destination,
            radius_m: 2000.0,
        }
    }

    #[tokio::test]
    async fn test_single_footway() {
        let source = FakeSource::new(get_single_footway(), GeoData::default());
        let config = get_config(north_of_base(0.0), north_of_base(100.0));

        let result = plan_route(&source, &config, &RoutingSettings::default()).await;

        let result = match result {
            Ok(result) => result,
            Err(failure) => panic!("Route should have been found: {failure}"),
        };

        assert_eq!(result.geometry.route.len(), 2);
        assert_abs_diff_eq!(result.meta.metrics.pedestrian_distance_m, 100.0, epsilon = 0.01);
        assert_abs_diff_eq!(result.meta.metrics.distance_m, 100.0, epsilon = 0.01);
        assert_eq!(result.meta.metrics.highway_distance_m, 0.0);
        assert!(!result.meta.uses_highways);
        assert_eq!(result.meta.routing_mode, RoutingMode::PedestrianOnly);
        assert_eq!(result.network.len(), 1);
        assert_eq!(source.layers_requested(), vec![Layer::Pedestrian]);
    }

    /// Endpoints a little way off the footway snap onto its nodes
    #[tokio::test]
    async fn test_endpoints_snapped_to_graph() {
        let source = FakeSource::new(get_single_footway(), GeoData::default());
        let config = get_config(
            Point::new(72.0003, 19.0),
            Point::new(72.0003, north_of_base(100.0).y()),
        );

        let result = plan_route(&source, &config, &RoutingSettings::default()).await;

        match result {
            Ok(result) => {
                assert_eq!(result.geometry.route[0], LatLng::from(north_of_base(0.0)));
                assert_eq!(result.geometry.route[1], LatLng::from(north_of_base(100.0)));
            }
            Err(failure) => panic!("Route should have been found: {failure}"),
        }
    }

    #[tokio::test]
    async fn test_hybrid_fallback() {
        let (pedestrian, road) = get_split_clusters();
        let source = FakeSource::new(pedestrian, road);
        let config = get_config(north_of_base(0.0), north_of_base(250.0));

        let result = plan_route(&source, &config, &RoutingSettings::default()).await;

        let result = match result {
            Ok(result) => result,
            Err(failure) => panic!("Hybrid route should have been found: {failure}"),
        };

        assert_eq!(result.geometry.route.len(), 4);
        assert!(result.meta.uses_highways);
        assert_eq!(result.meta.routing_mode, RoutingMode::Hybrid);
        assert_abs_diff_eq!(result.meta.metrics.highway_distance_m, 50.0, epsilon = 0.01);
        assert_abs_diff_eq!(result.meta.metrics.pedestrian_distance_m, 200.0, epsilon = 0.01);
        assert_abs_diff_eq!(result.meta.metrics.distance_m, 250.0, epsilon = 0.01);
        assert_eq!(
            result
                .geometry
                .route_colored
                .iter()
                .filter(|segment| segment.is_highway)
                .count(),
            1
        );
        assert_eq!(result.meta.ways, 2);
        assert_eq!(source.layers_requested(), vec![Layer::Pedestrian, Layer::Road]);
    }

    #[tokio::test]
    async fn test_unreachable_without_roads() {
        let (pedestrian, _) = get_split_clusters();
        let source = FakeSource::new(pedestrian, GeoData::default());
        let config = get_config(north_of_base(0.0), north_of_base(250.0));

        let result = plan_route(&source, &config, &RoutingSettings::default()).await;

        match result {
            Err(RoutingFailure::Unreachable {
                origin_node,
                dest_node,
                origin_radius_m,
                dest_radius_m,
                tried_hybrid,
                ..
            }) => {
                assert_eq!(origin_node, 1);
                assert_eq!(dest_node, 4);
                assert_eq!(origin_radius_m, 200.0);
                assert_eq!(dest_radius_m, 200.0);
                assert!(tried_hybrid);
            }
            other => panic!("Expected an unreachable failure, got {other:?}"),
        }
    }

    /// A marked crossing is the only pedestrian link between the clusters,
    /// but it is never walked along
    #[tokio::test]
    async fn test_marked_crossing_not_routed() {
        let (mut pedestrian, _) = get_split_clusters();
        pedestrian.ways.push(raw_way(
            12,
            vec![2, 3],
            &[
                ("highway", "footway"),
                ("footway", "crossing"),
                ("crossing", "zebra"),
            ],
        ));
        let source = FakeSource::new(pedestrian, GeoData::default());
        let config = get_config(north_of_base(0.0), north_of_base(250.0));

        let result = plan_route(&source, &config, &RoutingSettings::default()).await;

        assert!(matches!(result, Err(RoutingFailure::Unreachable { .. })));
    }

    /// Origin is ~5km from every fetched node
    #[tokio::test]
    async fn test_origin_unresolved() {
        let source = FakeSource::new(get_single_footway(), GeoData::default());
        let config = get_config(north_of_base(-5000.0), north_of_base(100.0));

        let result = plan_route(&source, &config, &RoutingSettings::default()).await;

        match result {
            Err(RoutingFailure::OriginUnresolved {
                radii, ways, nodes, ..
            }) => {
                assert_eq!(radii, vec![200.0, 500.0, 1000.0]);
                assert_eq!(ways, 1);
                assert_eq!(nodes, 2);
            }
            other => panic!("Expected an unresolved origin, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_destination_unresolved() {
        let source = FakeSource::new(get_single_footway(), GeoData::default());
        let config = get_config(north_of_base(0.0), north_of_base(5000.0));

        let result = plan_route(&source, &config, &RoutingSettings::default()).await;

        assert!(matches!(
            result,
            Err(RoutingFailure::DestinationUnresolved { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_pedestrian_data() {
        let source = FakeSource::new(GeoData::default(), GeoData::default());
        let config = get_config(north_of_base(0.0), north_of_base(100.0));

        let result = plan_route(&source, &config, &RoutingSettings::default()).await;

        match result {
            Err(RoutingFailure::NoPedestrianData { radius_m, .. }) => {
                assert_eq!(radius_m, 2000.0);
            }
            other => panic!("Expected missing pedestrian data, got {other:?}"),
        }
    }

    /// Endpoints far apart grow the reported search radius
    #[tokio::test]
    async fn test_no_pedestrian_data_reports_effective_radius() {
        let source = FakeSource::new(GeoData::default(), GeoData::default());
        let config = get_config(north_of_base(0.0), north_of_base(3000.0));

        let result = plan_route(&source, &config, &RoutingSettings::default()).await;

        match result {
            Err(RoutingFailure::NoPedestrianData { radius_m, .. }) => {
                assert_abs_diff_eq!(radius_m, 4500.0, epsilon = 0.01);
            }
            other => panic!("Expected missing pedestrian data, got {other:?}"),
        }
    }

    /// A way which only ever revisits the same node contributes no edges, so
    /// no graph can be built even though a navigable way was found
    #[tokio::test]
    async fn test_empty_graph() {
        let mut pedestrian = GeoData::default();
        pedestrian.nodes.insert(1, north_of_base(0.0));
        pedestrian
            .ways
            .push(raw_way(10, vec![1, 1], &[("highway", "footway")]));
        let source = FakeSource::new(pedestrian, GeoData::default());
        let config = get_config(north_of_base(0.0), north_of_base(100.0));

        let result = plan_route(&source, &config, &RoutingSettings::default()).await;

        match result {
            Err(failure @ RoutingFailure::EmptyGraph { .. }) => {
                let context = failure.debug_context();
                assert_eq!(context["radius_m"], 2000.0);
                assert!(context["bbox"]["north"].as_f64().is_some());
                assert_eq!(context["ways_count"], 1);
                assert_eq!(context["nodes_count"], 1);
                assert!(failure.to_string().contains("2000m"));
            }
            other => panic!("Expected an empty graph, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let failure = FetchError::Status {
            url: "http://localhost".to_string(),
            status: 504,
        };
        let source = FakeSource {
            pedestrian: Err(failure.clone()),
            road: Ok(GeoData::default()),
            calls: Mutex::new(Vec::new()),
        };
        let config = get_config(north_of_base(0.0), north_of_base(100.0));

        let result = plan_route(&source, &config, &RoutingSettings::default()).await;

        assert_eq!(result, Err(RoutingFailure::Fetch(failure)));
    }

    #[tokio::test]
    async fn test_road_fetch_failure() {
        let (pedestrian, _) = get_split_clusters();
        let failure = FetchError::NoEndpoints;
        let source = FakeSource {
            pedestrian: Ok(pedestrian),
            road: Err(failure.clone()),
            calls: Mutex::new(Vec::new()),
        };
        let config = get_config(north_of_base(0.0), north_of_base(250.0));

        let result = plan_route(&source, &config, &RoutingSettings::default()).await;

        assert_eq!(result, Err(RoutingFailure::Fetch(failure)));
    }
}
