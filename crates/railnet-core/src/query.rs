//! Read-only snapshot types for rendering and UI layers.
//!
//! Everything here is an owned copy; nothing borrows engine storage, so a
//! renderer can hold snapshots across frames while the game moves on.

use crate::fixed::Fixed64;
use crate::graph::Location;
use crate::id::{ConnectionId, PlayerId, StationId};
use crate::player::Goal;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// One station as a renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationSnapshot {
    pub id: StationId,
    pub name: String,
    pub location: Location,
    pub junction: bool,
    pub broken: bool,
    /// Placed trains currently at this station, across all players.
    pub trains_here: u32,
}

/// One connection. `passable` is false when the connection or either
/// endpoint is broken; renderers draw those differently.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSnapshot {
    pub id: ConnectionId,
    pub from: StationId,
    pub to: StationId,
    pub length: Fixed64,
    pub broken: bool,
    pub passable: bool,
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainSnapshot {
    /// Slot in the owner's resource list.
    pub index: usize,
    pub name: String,
    pub speed: u32,
    pub location: Option<StationId>,
    pub route: Vec<StationId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub is_current: bool,
    pub score: u32,
    pub trains: Vec<TrainSnapshot>,
    pub goals: Vec<Goal>,
}
