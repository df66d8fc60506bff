use serde::{Deserialize, Serialize};
use slotmap::{Key, new_key_type};
use std::sync::atomic::{AtomicU64, Ordering};

new_key_type! {
    /// Slot of a station inside one graph's storage.
    pub(crate) struct StationKey;

    /// Slot of a connection inside one graph's storage.
    pub(crate) struct ConnectionKey;
}

/// Stamp carried by every id a graph hands out. Each built graph gets its
/// own, so an id from another graph never resolves against this one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphTag(u64);

impl GraphTag {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        GraphTag(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identifies a station in the network graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationId {
    graph: GraphTag,
    key: StationKey,
}

impl StationId {
    pub(crate) fn new(graph: GraphTag, key: StationKey) -> Self {
        Self { graph, key }
    }

    pub(crate) fn key(self) -> StationKey {
        self.key
    }

    /// The graph that issued this id.
    pub fn graph(self) -> GraphTag {
        self.graph
    }

    /// Slot bits, stable across graphs built the same way.
    pub fn slot_bits(self) -> u64 {
        self.key.data().as_ffi()
    }
}

/// Identifies a connection (track segment) between two stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId {
    graph: GraphTag,
    key: ConnectionKey,
}

impl ConnectionId {
    pub(crate) fn new(graph: GraphTag, key: ConnectionKey) -> Self {
        Self { graph, key }
    }

    pub(crate) fn key(self) -> ConnectionKey {
        self.key
    }

    pub fn graph(self) -> GraphTag {
        self.graph
    }
}

/// Identifies a player by seat. Seat order is turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Index of this seat in the player list.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {}", self.0 + 1)
    }
}

/// A station or a connection: anything in the graph whose broken flag can be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Station(StationId),
    Connection(ConnectionId),
}

impl From<StationId> for EntityRef {
    fn from(id: StationId) -> Self {
        EntityRef::Station(id)
    }
}

impl From<ConnectionId> for EntityRef {
    fn from(id: ConnectionId) -> Self {
        EntityRef::Connection(id)
    }
}
