//! On-disk format for rail maps.
//!
//! A map lists stations with their positions and connections by station
//! name. It deserializes from RON, JSON, or TOML and is then resolved into a
//! [`railnet_core::graph::NetworkGraph`] by the loader.

use serde::Deserialize;

/// A station definition.
#[derive(Debug, Clone, Deserialize)]
pub struct StationData {
    pub name: String,
    pub x: i32,
    pub y: i32,
    /// Junctions are the only stations the failure model can break.
    #[serde(default)]
    pub junction: bool,
}

/// A connection between two stations, by name.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionData {
    pub from: String,
    pub to: String,
}

/// A whole map file.
///
/// TOML maps use `[[stations]]` and `[[connections]]` array tables.
#[derive(Debug, Clone, Deserialize)]
pub struct MapData {
    pub stations: Vec<StationData>,
    #[serde(default)]
    pub connections: Vec<ConnectionData>,
}
