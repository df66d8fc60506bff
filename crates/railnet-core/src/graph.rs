use crate::fixed::Fixed64;
use crate::id::*;
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during graph construction and queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("entity does not belong to this graph or cannot break: {0:?}")]
    InvalidEntity(EntityRef),
    #[error("no station satisfies the predicate")]
    NoMatchingStation,
    #[error("duplicate station name: {0}")]
    DuplicateStation(String),
    #[error("unknown station name: {0}")]
    UnknownStation(String),
    #[error("stations {0:?} and {1:?} are already connected")]
    DuplicateConnection(StationId, StationId),
    #[error("station {0:?} cannot connect to itself")]
    SelfLoop(StationId),
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

/// Map position of a station, in map pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Straight-line distance. Computed once per connection at load time.
    pub fn distance_to(self, other: Location) -> Fixed64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        Fixed64::saturating_from_num(dx.hypot(dy))
    }
}

/// Station variant. Only junctions carry breakage state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationKind {
    Plain,
    Collision { broken: bool },
}

/// A station: fixed name and location, plus variant state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    name: String,
    location: Location,
    kind: StationKind,
}

impl Station {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn kind(&self) -> StationKind {
        self.kind
    }

    /// Whether this station can break at all.
    pub fn is_junction(&self) -> bool {
        matches!(self.kind, StationKind::Collision { .. })
    }

    pub fn is_broken(&self) -> bool {
        matches!(self.kind, StationKind::Collision { broken: true })
    }
}

/// An undirected track segment between two stations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    a: StationId,
    b: StationId,
    length: Fixed64,
    broken: bool,
}

impl Connection {
    pub fn endpoints(&self) -> (StationId, StationId) {
        (self.a, self.b)
    }

    pub fn length(&self) -> Fixed64 {
        self.length
    }

    /// The connection's own broken flag, independent of its endpoints.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn touches(&self, station: StationId) -> bool {
        self.a == station || self.b == station
    }

    /// The endpoint opposite `station`, if `station` is an endpoint.
    pub fn other(&self, station: StationId) -> Option<StationId> {
        if self.a == station {
            Some(self.b)
        } else if self.b == station {
            Some(self.a)
        } else {
            None
        }
    }

    fn joins(&self, x: StationId, y: StationId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

// ---------------------------------------------------------------------------
// NetworkGraph
// ---------------------------------------------------------------------------

/// The rail network: stations and the connections between them.
///
/// Topology is fixed once built; only broken flags change afterwards.
/// Incident connections per station are kept in a `SecondaryMap` so they
/// stay keyed in step with the primary `stations` SlotMap.
///
/// Every id carries the tag of the graph that issued it; ids from any other
/// graph are rejected with [`GraphError::InvalidEntity`].
#[derive(Debug, Clone, Default)]
pub struct NetworkGraph {
    tag: GraphTag,
    stations: SlotMap<StationKey, Station>,
    connections: SlotMap<ConnectionKey, Connection>,
    incident: SecondaryMap<StationKey, Vec<ConnectionId>>,
    /// Stations in insertion order. Sampling walks this, not the SlotMap.
    station_order: Vec<StationId>,
    connection_order: Vec<ConnectionId>,
    by_name: HashMap<String, StationId>,
}

impl NetworkGraph {
    /// Start building a graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use railnet_core::graph::{Location, NetworkGraph, StationKind};
    ///
    /// let mut builder = NetworkGraph::builder();
    /// let york = builder.add_station("York", Location::new(10, 10), StationKind::Plain).unwrap();
    /// let leeds = builder
    ///     .add_station("Leeds", Location::new(40, 50), StationKind::Collision { broken: false })
    ///     .unwrap();
    /// builder.connect(york, leeds).unwrap();
    /// let graph = builder.build();
    /// assert_eq!(graph.connections_of(york).unwrap().len(), 1);
    /// ```
    pub fn builder() -> GraphBuilder {
        GraphBuilder {
            graph: NetworkGraph {
                tag: GraphTag::fresh(),
                ..NetworkGraph::default()
            },
        }
    }

    /// Tag stamped on every id this graph issued.
    pub fn tag(&self) -> GraphTag {
        self.tag
    }

    fn station_key(&self, id: StationId) -> Option<StationKey> {
        (id.graph() == self.tag).then_some(id.key())
    }

    fn connection_key(&self, id: ConnectionId) -> Option<ConnectionKey> {
        (id.graph() == self.tag).then_some(id.key())
    }

    fn incident_of(&self, station: StationId) -> Option<&Vec<ConnectionId>> {
        self.incident.get(self.station_key(station)?)
    }

    /// Passability of a connection known to belong to this graph.
    fn passable(&self, conn: &Connection) -> bool {
        !conn.broken
            && !self.stations[conn.a.key()].is_broken()
            && !self.stations[conn.b.key()].is_broken()
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(self.station_key(id)?)
    }

    pub fn station_by_name(&self, name: &str) -> Option<StationId> {
        self.by_name.get(name).copied()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(self.connection_key(id)?)
    }

    pub fn contains_station(&self, id: StationId) -> bool {
        self.station(id).is_some()
    }

    pub fn station_count(&self) -> usize {
        self.station_order.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connection_order.len()
    }

    /// All stations in insertion order.
    pub fn stations(&self) -> impl Iterator<Item = (StationId, &Station)> {
        self.station_order.iter().map(|&id| (id, &self.stations[id.key()]))
    }

    /// All connections in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connection_order
            .iter()
            .map(|&id| (id, &self.connections[id.key()]))
    }

    /// All connections in insertion order, with their passability.
    pub fn connections_with_passability(
        &self,
    ) -> impl Iterator<Item = (ConnectionId, &Connection, bool)> {
        self.connections()
            .map(|(id, conn)| (id, conn, self.passable(conn)))
    }

    /// Junction stations in insertion order.
    pub fn collision_stations(&self) -> impl Iterator<Item = (StationId, &Station)> {
        self.stations().filter(|(_, s)| s.is_junction())
    }

    /// All connections touching `station`, in insertion order.
    pub fn connections_of(
        &self,
        station: StationId,
    ) -> Result<Vec<(ConnectionId, &Connection)>, GraphError> {
        let incident = self
            .incident_of(station)
            .ok_or(GraphError::InvalidEntity(EntityRef::Station(station)))?;
        Ok(incident
            .iter()
            .map(|&id| (id, &self.connections[id.key()]))
            .collect())
    }

    /// The connection joining `a` and `b`, in either direction.
    pub fn connection_between(&self, a: StationId, b: StationId) -> Option<ConnectionId> {
        self.incident_of(a)?
            .iter()
            .copied()
            .find(|&id| self.connections[id.key()].joins(a, b))
    }

    pub fn is_station_broken(&self, station: StationId) -> Result<bool, GraphError> {
        self.station(station)
            .map(Station::is_broken)
            .ok_or(GraphError::InvalidEntity(EntityRef::Station(station)))
    }

    /// A connection can be travelled when neither it nor an endpoint is broken.
    pub fn is_connection_passable(&self, id: ConnectionId) -> Result<bool, GraphError> {
        let conn = self
            .connection(id)
            .ok_or(GraphError::InvalidEntity(EntityRef::Connection(id)))?;
        Ok(self.passable(conn))
    }

    // -----------------------------------------------------------------------
    // State mutation
    // -----------------------------------------------------------------------

    /// Set the broken flag on a junction station or a connection.
    ///
    /// Returns `Ok(true)` when the flag changed and `Ok(false)` when it
    /// already had that value. Plain stations cannot break.
    pub fn set_broken(
        &mut self,
        entity: impl Into<EntityRef>,
        broken: bool,
    ) -> Result<bool, GraphError> {
        let entity = entity.into();
        match entity {
            EntityRef::Station(id) => {
                let station = self
                    .station_key(id)
                    .and_then(|key| self.stations.get_mut(key))
                    .ok_or(GraphError::InvalidEntity(entity))?;
                match &mut station.kind {
                    StationKind::Plain => Err(GraphError::InvalidEntity(entity)),
                    StationKind::Collision { broken: current } => {
                        let changed = *current != broken;
                        *current = broken;
                        Ok(changed)
                    }
                }
            }
            EntityRef::Connection(id) => {
                let conn = self
                    .connection_key(id)
                    .and_then(|key| self.connections.get_mut(key))
                    .ok_or(GraphError::InvalidEntity(entity))?;
                let changed = conn.broken != broken;
                conn.broken = broken;
                Ok(changed)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Sampling
    // -----------------------------------------------------------------------

    /// Pick a station uniformly among those satisfying `predicate`.
    ///
    /// Only the eligible subset is sampled, so a map with no match fails
    /// immediately instead of retrying forever.
    pub fn random_station<R, P>(&self, rng: &mut R, predicate: P) -> Result<StationId, GraphError>
    where
        R: RandomSource + ?Sized,
        P: Fn(StationId, &Station) -> bool,
    {
        let eligible: Vec<StationId> = self
            .stations()
            .filter(|&(id, station)| predicate(id, station))
            .map(|(id, _)| id)
            .collect();
        if eligible.is_empty() {
            return Err(GraphError::NoMatchingStation);
        }
        Ok(eligible[rng.below(eligible.len())])
    }
}

// ---------------------------------------------------------------------------
// GraphBuilder
// ---------------------------------------------------------------------------

/// Accumulates stations and connections; topology is frozen by [`GraphBuilder::build`].
#[derive(Debug)]
pub struct GraphBuilder {
    graph: NetworkGraph,
}

impl GraphBuilder {
    /// Add a station. Names must be unique.
    pub fn add_station(
        &mut self,
        name: impl Into<String>,
        location: Location,
        kind: StationKind,
    ) -> Result<StationId, GraphError> {
        let name = name.into();
        if self.graph.by_name.contains_key(&name) {
            return Err(GraphError::DuplicateStation(name));
        }
        let key = self.graph.stations.insert(Station {
            name: name.clone(),
            location,
            kind,
        });
        self.graph.incident.insert(key, Vec::new());
        let id = StationId::new(self.graph.tag, key);
        self.graph.station_order.push(id);
        self.graph.by_name.insert(name, id);
        Ok(id)
    }

    /// Connect two existing stations. At most one connection per pair.
    pub fn connect(&mut self, a: StationId, b: StationId) -> Result<ConnectionId, GraphError> {
        for id in [a, b] {
            if !self.graph.contains_station(id) {
                return Err(GraphError::InvalidEntity(EntityRef::Station(id)));
            }
        }
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        if self.graph.connection_between(a, b).is_some() {
            return Err(GraphError::DuplicateConnection(a, b));
        }

        let length = self.graph.stations[a.key()]
            .location
            .distance_to(self.graph.stations[b.key()].location);
        let key = self.graph.connections.insert(Connection {
            a,
            b,
            length,
            broken: false,
        });
        let id = ConnectionId::new(self.graph.tag, key);
        self.graph.incident[a.key()].push(id);
        self.graph.incident[b.key()].push(id);
        self.graph.connection_order.push(id);
        Ok(id)
    }

    /// Connect two stations by name.
    pub fn connect_by_name(&mut self, a: &str, b: &str) -> Result<ConnectionId, GraphError> {
        let lookup = |name: &str| {
            self.graph
                .station_by_name(name)
                .ok_or_else(|| GraphError::UnknownStation(name.to_string()))
        };
        let (a, b) = (lookup(a)?, lookup(b)?);
        self.connect(a, b)
    }

    pub fn station_by_name(&self, name: &str) -> Option<StationId> {
        self.graph.station_by_name(name)
    }

    pub fn build(self) -> NetworkGraph {
        self.graph
    }
}

// ===========================================================================
// Tests
// ===========================================================================
