//! This module focuses on retrieving OSM data for an area and using it to
//! generate a petgraph graph object which can be walked by the router.

pub mod classify;
pub mod overpass;
pub mod petgraph;
