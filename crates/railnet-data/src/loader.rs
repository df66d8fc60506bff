//! Reads map and config files and resolves them into engine types.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus the map-to-graph resolution step.

use crate::schema::MapData;
use railnet_core::config::{ConfigError, GameConfig};
use railnet_core::graph::{GraphBuilder, GraphError, Location, NetworkGraph, StationKind};
use railnet_core::id::StationId;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The map parsed but describes an invalid network.
    #[error("invalid network in {file}: {source}")]
    Graph { file: PathBuf, source: GraphError },

    #[error("invalid config in {file}: {source}")]
    Config { file: PathBuf, source: ConfigError },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan `dir` for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if none exists and `ConflictingFormats` if more than
/// one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let parse_error = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
    }
}

// ===========================================================================
// Resolution
// ===========================================================================

/// Look up a station declared earlier in the map, returning an
/// `UnresolvedRef` error if no station has that name.
fn resolve_station(
    builder: &GraphBuilder,
    name: &str,
    file: &Path,
) -> Result<StationId, DataLoadError> {
    builder
        .station_by_name(name)
        .ok_or_else(|| DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: name.to_string(),
            expected_kind: "station",
        })
}

/// Resolve parsed map data into a network. `file` is used for error context.
///
/// Name uniqueness is enforced by the graph builder; its duplicate error is
/// reported as [`DataLoadError::DuplicateName`].
pub fn build_network(map: &MapData, file: &Path) -> Result<NetworkGraph, DataLoadError> {
    let graph_error = |source: GraphError| match source {
        GraphError::DuplicateStation(name) => DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name,
        },
        source => DataLoadError::Graph {
            file: file.to_path_buf(),
            source,
        },
    };

    let mut builder = NetworkGraph::builder();

    for station in &map.stations {
        let kind = if station.junction {
            StationKind::Collision { broken: false }
        } else {
            StationKind::Plain
        };
        builder
            .add_station(station.name.clone(), Location::new(station.x, station.y), kind)
            .map_err(graph_error)?;
    }

    for conn in &map.connections {
        let from = resolve_station(&builder, &conn.from, file)?;
        let to = resolve_station(&builder, &conn.to, file)?;
        builder.connect(from, to).map_err(graph_error)?;
    }

    Ok(builder.build())
}

/// Load and resolve a map file.
pub fn load_map(path: &Path) -> Result<NetworkGraph, DataLoadError> {
    let map: MapData = deserialize_file(path)?;
    let graph = build_network(&map, path)?;
    tracing::debug!(
        target: "railnet::data",
        file = %path.display(),
        stations = graph.station_count(),
        connections = graph.connection_count(),
        "map.loaded"
    );
    Ok(graph)
}

/// Load and validate a config file. Omitted fields take their defaults.
pub fn load_config(path: &Path) -> Result<GameConfig, DataLoadError> {
    let config: GameConfig = deserialize_file(path)?;
    config.validate().map_err(|source| DataLoadError::Config {
        file: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

// ===========================================================================
// Game data
// ===========================================================================

/// Everything needed to start a game.
#[derive(Debug, Clone)]
pub struct GameData {
    pub graph: NetworkGraph,
    pub config: GameConfig,
}

/// Load `map.*` (required) and `config.*` (optional) from `dir`.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let graph = load_map(&require_data_file(dir, "map")?)?;
    let config = match find_data_file(dir, "config")? {
        Some(path) => load_config(&path)?,
        None => GameConfig::default(),
    };
    tracing::info!(
        target: "railnet::data",
        dir = %dir.display(),
        stations = graph.station_count(),
        players = config.player_count,
        "game_data.loaded"
    );
    Ok(GameData { graph, config })
}

// ===========================================================================
// Tests
// ===========================================================================
