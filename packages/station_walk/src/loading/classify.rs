//! Assigns a routing category to each raw way based on its OSM tags, and
//! filters the ways down to those which are relevant for a given use.

use geo::Point;
use rustc_hash::FxHashMap;

use crate::common::graph_data::Category;
use crate::loading::overpass::{RawWay, Tags};

/// Highway values which are treated as roads when building the fallback graph
pub const ROAD_CLASSES: [&str; 8] = [
    "residential",
    "service",
    "tertiary",
    "secondary",
    "primary",
    "trunk",
    "motorway",
    "unclassified",
];

/// Crossing values which indicate a marked or signal controlled crossing
const MARKED_CROSSINGS: [&str; 7] = [
    "marked",
    "zebra",
    "traffic_signals",
    "uncontrolled",
    "pelican",
    "toucan",
    "puffin",
];

/// Determines which categories are kept when extracting ways
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Pedestrian ways which may be walked along, marked crossings excluded
    Navigation,
    /// Road ways, used to connect otherwise separate pedestrian networks
    Roads,
    /// Every pedestrian category, used for map display
    Catalog,
}

impl ExtractMode {
    fn allows(&self, category: Category) -> bool {
        match self {
            ExtractMode::Navigation => category.is_pedestrian_navigable(),
            ExtractMode::Roads => category.is_road(),
            ExtractMode::Catalog => !category.is_road(),
        }
    }
}

/// A way which has been classified, with any nodes missing from the node
/// table removed
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub nodes: Vec<i64>,
    pub category: Category,
    pub highway: String,
    pub subtype: String,
}

fn tag<'a>(tags: &'a Tags, key: &str) -> &'a str {
    tags.get(key).map(String::as_str).unwrap_or("")
}

/// Determine the category for a single set of tags. The order of the checks
/// is significant, the first match wins. Returns None for anything which is
/// neither a pedestrian way nor a road.
pub fn classify(tags: &Tags) -> Option<Category> {
    let highway = tag(tags, "highway");

    match highway {
        "steps" => Some(Category::Steps),
        "pedestrian" => Some(Category::PedestrianStreet),
        "footway" => match tag(tags, "footway") {
            "sidewalk" => Some(Category::Sidewalk),
            "crossing" if MARKED_CROSSINGS.contains(&tag(tags, "crossing")) => {
                Some(Category::MarkedCrossing)
            }
            _ => Some(Category::Footway),
        },
        "path" => {
            let informal = tag(tags, "informal") == "yes";
            let trail_visibility = !tag(tags, "trail_visibility").is_empty();
            if informal || trail_visibility {
                Some(Category::InformalPath)
            } else {
                Some(Category::Path)
            }
        }
        road if ROAD_CLASSES.contains(&road) => Some(Category::Road),
        _ => None,
    }
}

/// Classify every way in a fetch result, keeping those allowed by the
/// requested mode. Nodes which are missing from the node table are dropped
/// from each way, and ways left with fewer than two nodes are discarded
pub fn extract_ways(
    ways: &[RawWay],
    nodes: &FxHashMap<i64, Point>,
    mode: ExtractMode,
) -> Vec<Way> {
    let mut extracted = Vec::new();

    for raw in ways {
        let category = match classify(&raw.tags) {
            Some(category) if mode.allows(category) => category,
            _ => continue,
        };

        let present: Vec<i64> = raw
            .nodes
            .iter()
            .copied()
            .filter(|id| nodes.contains_key(id))
            .collect();
        if present.len() < 2 {
            continue;
        }

        let footway = tag(&raw.tags, "footway");
        let subtype = if footway.is_empty() {
            tag(&raw.tags, "crossing")
        } else {
            footway
        };

        extracted.push(Way {
            id: raw.id,
            nodes: present,
            category,
            highway: tag(&raw.tags, "highway").to_string(),
            subtype: subtype.to_string(),
        });
    }

    extracted
}
