//! Groups every pedestrian way in an area by category, for display on a map.
//! No graph is built, and no search is run.

use serde::Serialize;
use tracing::info;

use crate::common::bbox::BBox;
use crate::common::config::PathsConfig;
use crate::common::error::RoutingFailure;
use crate::common::geometry::LatLng;
use crate::common::graph_data::Category;
use crate::loading::classify::{ExtractMode, extract_ways};
use crate::loading::overpass::{GeoDataSource, Layer};

/// A single way, ready to be drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathFeature {
    pub highway: String,
    pub subtype: String,
    pub coords: Vec<LatLng>,
}

/// All of the pedestrian ways in an area, keyed by category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathCatalog {
    pub bbox: BBox,
    pub foot_path: Vec<PathFeature>,
    pub sidewalk: Vec<PathFeature>,
    pub marked_crossing: Vec<PathFeature>,
    pub informal_path: Vec<PathFeature>,
    pub steps: Vec<PathFeature>,
    pub pedestrian_street: Vec<PathFeature>,
    pub path: Vec<PathFeature>,
}

impl PathCatalog {
    pub fn new(bbox: BBox) -> PathCatalog {
        PathCatalog {
            bbox,
            foot_path: Vec::new(),
            sidewalk: Vec::new(),
            marked_crossing: Vec::new(),
            informal_path: Vec::new(),
            steps: Vec::new(),
            pedestrian_street: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Add a feature to the list for its category. Roads are not part of the
    /// catalog, and are ignored
    pub fn push(&mut self, category: Category, feature: PathFeature) {
        let target = match category {
            Category::Footway => &mut self.foot_path,
            Category::Sidewalk => &mut self.sidewalk,
            Category::MarkedCrossing => &mut self.marked_crossing,
            Category::InformalPath => &mut self.informal_path,
            Category::Steps => &mut self.steps,
            Category::PedestrianStreet => &mut self.pedestrian_street,
            Category::Path => &mut self.path,
            Category::Road => return,
        };
        target.push(feature);
    }

    pub fn len(&self) -> usize {
        self.foot_path.len()
            + self.sidewalk.len()
            + self.marked_crossing.len()
            + self.informal_path.len()
            + self.steps.len()
            + self.pedestrian_street.len()
            + self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetch the pedestrian ways within the requested area, and sort them into
/// categories. Unlike route planning, an area with no ways is not treated as
/// a failure
pub async fn catalog_paths<S: GeoDataSource>(
    source: &S,
    config: &PathsConfig,
) -> Result<PathCatalog, RoutingFailure> {
    let data = source.fetch(Layer::Pedestrian, &config.bbox).await?;
    let ways = extract_ways(&data.ways, &data.nodes, ExtractMode::Catalog);

    let mut catalog = PathCatalog::new(config.bbox);
    for way in ways {
        let coords = way
            .nodes
            .iter()
            .filter_map(|id| data.nodes.get(id))
            .map(|point| LatLng::from(*point))
            .collect();

        catalog.push(
            way.category,
            PathFeature {
                highway: way.highway,
                subtype: way.subtype,
                coords,
            },
        );
    }

    info!(
        "Catalogued {} of {} fetched ways within {}",
        catalog.len(),
        data.ways.len(),
        config.bbox.to_overpass()
    );

    Ok(catalog)
}
