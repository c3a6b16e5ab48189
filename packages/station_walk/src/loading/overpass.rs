//! The functions defined here retrieve the raw nodes and ways for an area from
//! an Overpass API instance. The rest of the crate only depends on the
//! GeoDataSource trait, so that the planner can be driven by any source of
//! OSM data.

use aho_corasick::AhoCorasick;
use geo::Point;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::common::bbox::BBox;
use crate::common::error::FetchError;

/// Public Overpass instances, tried in this order unless others are
/// configured
pub const DEFAULT_ENDPOINTS: [&str; 4] = [
    "https://overpass-api.de/api/interpreter",
    "https://overpass.kumi.systems/api/interpreter",
    "https://z.overpass-api.de/api/interpreter",
    "https://overpass.openstreetmap.ru/api/interpreter",
];

/// Server-side timeout embedded in each query, in seconds
const QUERY_TIMEOUT_S: u32 = 25;

pub type Tags = FxHashMap<String, String>;

/// The two sets of ways which can be requested for an area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// highway in footway, path, pedestrian, steps
    Pedestrian,
    /// highway in the vehicle road classes
    Road,
}

/// Capability to fetch the OSM nodes and ways of one layer within a bounding
/// box. Implementations are responsible for any retrying, callers will not
/// retry a failed fetch.
pub trait GeoDataSource: Send + Sync {
    fn fetch(
        &self,
        layer: Layer,
        bbox: &BBox,
    ) -> impl Future<Output = Result<GeoData, FetchError>> + Send;
}

/// Container for the raw output of an Overpass query
#[derive(Deserialize, Debug, Default)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OsmElement>,
}

/// A single element of an Overpass response. Relations and any other element
/// types are not needed for routing, and are discarded
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OsmElement {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: Tags,
    },
    #[serde(other)]
    Other,
}

/// A way as it appears in the OSM data, before it has been classified
#[derive(Debug, Clone, PartialEq)]
pub struct RawWay {
    pub id: i64,
    pub nodes: Vec<i64>,
    pub tags: Tags,
}

/// The node table and ways returned for one layer of one area
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoData {
    pub nodes: FxHashMap<i64, Point>,
    pub ways: Vec<RawWay>,
}

impl From<OverpassResponse> for GeoData {
    fn from(response: OverpassResponse) -> GeoData {
        let mut data = GeoData::default();

        for element in response.elements {
            match element {
                OsmElement::Node { id, lat, lon } => {
                    data.nodes.insert(id, Point::new(lon, lat));
                }
                OsmElement::Way { id, nodes, tags } => {
                    data.ways.push(RawWay { id, nodes, tags })
                }
                OsmElement::Other => (),
            }
        }

        data
    }
}

impl GeoData {
    /// Combine the node tables of two fetches. Node IDs are global in OSM, so
    /// any overlap refers to the same point
    pub fn merge_nodes(&self, other: &GeoData) -> FxHashMap<i64, Point> {
        let mut nodes = self.nodes.clone();
        nodes.extend(other.nodes.iter().map(|(id, point)| (*id, *point)));
        nodes
    }
}

/// Generate the Overpass QL query for a layer, substituting the bounding box
/// and timeout into the relevant template
pub fn generate_query(layer: Layer, bbox: &BBox) -> Result<String, FetchError> {
    let base = match layer {
        Layer::Pedestrian => include_str!("queries/pedestrian_ways.overpassql"),
        Layer::Road => include_str!("queries/road_ways.overpassql"),
    };

    let patterns = ["< bbox >", "< timeout >"];
    let replace_with = [bbox.to_overpass(), QUERY_TIMEOUT_S.to_string()];

    let ac = AhoCorasick::new(patterns)
        .map_err(|err| FetchError::Query(err.to_string()))?;

    Ok(ac.replace_all(base, &replace_with))
}

/// Client for one or more Overpass instances. Each fetch tries the endpoints
/// in order and returns the first successful response
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: reqwest::Client,
    endpoints: Vec<String>,
}

impl OverpassClient {
    pub fn new(
        endpoints: Vec<String>,
        timeout: Duration,
    ) -> Result<OverpassClient, FetchError> {
        if endpoints.is_empty() {
            return Err(FetchError::NoEndpoints);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("station-walk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| FetchError::Request {
                url: String::new(),
                message: err.to_string(),
            })?;

        Ok(OverpassClient { client, endpoints })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Send a query to a single endpoint and decode the response
    async fn post_query(
        &self,
        url: &str,
        query: &str,
    ) -> Result<OverpassResponse, FetchError> {
        let response = self
            .client
            .post(url)
            .form(&[("data", query)])
            .send()
            .await
            .map_err(|err| FetchError::Request {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<OverpassResponse>()
            .await
            .map_err(|err| FetchError::Decode {
                url: url.to_string(),
                message: err.to_string(),
            })
    }
}

impl GeoDataSource for OverpassClient {
    async fn fetch(
        &self,
        layer: Layer,
        bbox: &BBox,
    ) -> Result<GeoData, FetchError> {
        let query = generate_query(layer, bbox)?;
        debug!("Overpass query:\n{}", query);

        let mut last_error: Option<FetchError> = None;
        for url in self.endpoints.iter() {
            info!(?layer, %url, "Requesting ways from Overpass");
            match self.post_query(url, &query).await {
                Ok(response) => {
                    let data: GeoData = response.into();
                    info!(
                        nodes = data.nodes.len(),
                        ways = data.ways.len(),
                        %url,
                        "Received Overpass data"
                    );
                    return Ok(data);
                }
                Err(err) => {
                    warn!(%url, error = %err, "Overpass endpoint failed");
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(last) => Err(FetchError::AllEndpointsFailed {
                attempts: self.endpoints.len(),
                last: Box::new(last),
            }),
            None => Err(FetchError::NoEndpoints),
        }
    }
}
