//! Types and helpers shared by the loading and routing layers

pub mod bbox;
pub mod config;
pub mod error;
pub mod geometry;
pub mod graph_data;
