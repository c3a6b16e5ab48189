use geo::Point;
use serde::Serialize;

/// The routing classification of a way, and by extension of every edge it
/// contributes to the graph. Serialized names match those used by the
/// frontend for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    #[serde(rename = "foot_path")]
    Footway,
    #[serde(rename = "sidewalk")]
    Sidewalk,
    #[serde(rename = "marked_crossing")]
    MarkedCrossing,
    #[serde(rename = "informal_path")]
    InformalPath,
    #[serde(rename = "steps")]
    Steps,
    #[serde(rename = "pedestrian_street")]
    PedestrianStreet,
    #[serde(rename = "path")]
    Path,
    #[serde(rename = "highway")]
    Road,
}

impl Category {
    /// Position of this category when several ways share the same pair of
    /// nodes, the highest rank is kept. Roads sit below every pedestrian
    /// category so they can never displace one. Marked crossings are never
    /// part of a routing graph, so have no rank.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Category::Road => Some(0),
            Category::Path => Some(1),
            Category::InformalPath => Some(2),
            Category::Footway => Some(3),
            Category::PedestrianStreet => Some(4),
            Category::Sidewalk => Some(5),
            Category::Steps => Some(6),
            Category::MarkedCrossing => None,
        }
    }

    /// Whether edges of this category may be used in pedestrian-only routing
    pub fn is_pedestrian_navigable(&self) -> bool {
        !matches!(self, Category::Road | Category::MarkedCrossing)
    }

    pub fn is_road(&self) -> bool {
        matches!(self, Category::Road)
    }

    /// The name used on the wire, which is also the key used when grouping
    /// features in the path catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Footway => "foot_path",
            Category::Sidewalk => "sidewalk",
            Category::MarkedCrossing => "marked_crossing",
            Category::InformalPath => "informal_path",
            Category::Steps => "steps",
            Category::PedestrianStreet => "pedestrian_street",
            Category::Path => "path",
            Category::Road => "highway",
        }
    }
}

/// Sets the data which will be stored as weights in the petgraph graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeData {
    pub id: i64,
    pub point: Point,
}

/// Container for edge metadata which will be stored in the graph. The weight
/// is the cost used during search, which is the ground distance scaled by the
/// multiplier for the category of the way the edge came from. Categories for
/// display live in the edge category map, keyed by node pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeData {
    pub weight: f64,
}

/// Identifies an edge independently of the direction it is travelled in, the
/// smaller of the two node IDs is always stored first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(i64, i64);

impl EdgeKey {
    pub fn new(u: i64, v: i64) -> EdgeKey {
        if u <= v { EdgeKey(u, v) } else { EdgeKey(v, u) }
    }
}
