//! Pedestrian route planning around transit stations, using OpenStreetMap
//! data fetched on demand for each request.

pub mod api;
pub mod common;
pub mod loading;
pub mod routing;
