//! Players, their resources and goals, and round-robin turn ownership.
//!
//! Per-turn grants are delegated to an [`Allotment`]. The engine uses
//! [`StandardAllotment`], which hands one train and one goal to the player
//! whose turn is starting.

use crate::config::AllotmentConfig;
use crate::event::{Event, EventBus};
use crate::fixed::Turn;
use crate::graph::{GraphError, NetworkGraph};
use crate::id::{PlayerId, StationId};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};

/// Minimum number of seats for a game.
pub const MIN_PLAYERS: usize = 2;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    #[error("at least {MIN_PLAYERS} players are required, found {0}")]
    InsufficientPlayers(usize),
    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),
    #[error("{player} has no train at resource slot {index}")]
    UnknownTrain { player: PlayerId, index: usize },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

// ---------------------------------------------------------------------------
// Resources and goals
// ---------------------------------------------------------------------------

/// A train model from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainSpec {
    pub name: String,
    pub speed: u32,
}

impl TrainSpec {
    pub fn new(name: impl Into<String>, speed: u32) -> Self {
        Self {
            name: name.into(),
            speed,
        }
    }
}

/// A train owned by a player. Unplaced until a station is chosen for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Train {
    spec: TrainSpec,
    location: Option<StationId>,
    route: Vec<StationId>,
}

impl Train {
    pub fn new(spec: TrainSpec) -> Self {
        Self {
            spec,
            location: None,
            route: Vec::new(),
        }
    }

    pub fn spec(&self) -> &TrainSpec {
        &self.spec
    }

    pub fn location(&self) -> Option<StationId> {
        self.location
    }

    pub fn is_placed(&self) -> bool {
        self.location.is_some()
    }

    /// The assigned route, starting at the train's station. Empty if none.
    pub fn route(&self) -> &[StationId] {
        &self.route
    }

    pub(crate) fn place(&mut self, station: StationId) {
        self.location = Some(station);
    }

    pub(crate) fn assign_route(&mut self, route: Vec<StationId>) {
        self.route = route;
    }
}

/// Something a player owns. Trains are the only kind the core hands out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Train(Train),
}

impl Resource {
    pub fn as_train(&self) -> Option<&Train> {
        match self {
            Resource::Train(train) => Some(train),
        }
    }

    fn as_train_mut(&mut self) -> Option<&mut Train> {
        match self {
            Resource::Train(train) => Some(train),
        }
    }
}

/// Deliver a train from `origin` to `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Goal {
    pub origin: StationId,
    pub destination: StationId,
    pub issued: Turn,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    resources: Vec<Resource>,
    goals: Vec<Goal>,
    score: u32,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            resources: Vec::new(),
            goals: Vec::new(),
            score: 0,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    pub fn add_goal(&mut self, goal: Goal) {
        self.goals.push(goal);
    }

    /// Trains with their resource slot index.
    pub fn trains(&self) -> impl Iterator<Item = (usize, &Train)> {
        self.resources
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_train().map(|t| (i, t)))
    }

    pub fn train(&self, index: usize) -> Result<&Train, PlayerError> {
        self.resources
            .get(index)
            .and_then(Resource::as_train)
            .ok_or(PlayerError::UnknownTrain {
                player: self.id,
                index,
            })
    }

    pub(crate) fn train_mut(&mut self, index: usize) -> Result<&mut Train, PlayerError> {
        let player = self.id;
        self.resources
            .get_mut(index)
            .and_then(Resource::as_train_mut)
            .ok_or(PlayerError::UnknownTrain { player, index })
    }
}

/// A player's final position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Standing {
    pub player: PlayerId,
    pub score: u32,
}

// ---------------------------------------------------------------------------
// Allotment
// ---------------------------------------------------------------------------

/// What a single grant handed out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grant {
    pub trains: u32,
    pub goals: u32,
}

/// Policy for per-turn resource and goal grants.
pub trait Allotment {
    fn grant(&mut self, player: &mut Player, turn: Turn) -> Result<Grant, GraphError>;
}

/// Grants nothing. Useful when only rotation matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAllotment;

impl Allotment for NoAllotment {
    fn grant(&mut self, _player: &mut Player, _turn: Turn) -> Result<Grant, GraphError> {
        Ok(Grant::default())
    }
}

/// One random catalog train and one random goal per grant, up to the caps
/// in [`AllotmentConfig`].
pub struct StandardAllotment<'a, R: RandomSource + ?Sized> {
    pub graph: &'a NetworkGraph,
    pub rng: &'a mut R,
    pub catalog: &'a [TrainSpec],
    pub config: &'a AllotmentConfig,
}

impl<R: RandomSource + ?Sized> Allotment for StandardAllotment<'_, R> {
    fn grant(&mut self, player: &mut Player, turn: Turn) -> Result<Grant, GraphError> {
        let mut grant = Grant::default();

        if player.resources.len() < self.config.max_resources && !self.catalog.is_empty() {
            let spec = self.catalog[self.rng.below(self.catalog.len())].clone();
            player.add_resource(Resource::Train(Train::new(spec)));
            grant.trains += 1;
        }

        if player.goals.len() < self.config.max_goals {
            let origin = self.graph.random_station(&mut *self.rng, |_, _| true)?;
            let destination = self
                .graph
                .random_station(&mut *self.rng, |id, _| id != origin)?;
            player.add_goal(Goal {
                origin,
                destination,
                issued: turn,
            });
            grant.goals += 1;
        }

        Ok(grant)
    }
}

// ---------------------------------------------------------------------------
// PlayerManager
// ---------------------------------------------------------------------------

/// Owns the players, whose insertion order is turn order, and the turn counter.
#[derive(Debug, Clone, Default)]
pub struct PlayerManager {
    players: Vec<Player>,
    current: usize,
    turn: Turn,
}

impl PlayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager with `count` seats. Fails below [`MIN_PLAYERS`].
    pub fn with_players(count: usize) -> Result<Self, PlayerError> {
        if count < MIN_PLAYERS {
            return Err(PlayerError::InsufficientPlayers(count));
        }
        let mut manager = Self::new();
        manager.create_players(count);
        Ok(manager)
    }

    /// Append `count` seats after any existing ones.
    pub fn create_players(&mut self, count: usize) {
        let start = self.players.len() as u32;
        self.players
            .extend((start..start + count as u32).map(|seat| Player::new(PlayerId(seat))));
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, PlayerError> {
        self.players
            .get(id.index())
            .ok_or(PlayerError::UnknownPlayer(id))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, PlayerError> {
        self.players
            .get_mut(id.index())
            .ok_or(PlayerError::UnknownPlayer(id))
    }

    /// Panics if no players have been created.
    pub fn current_player(&self) -> &Player {
        &self.players[self.current]
    }

    pub fn current_id(&self) -> PlayerId {
        PlayerId(self.current as u32)
    }

    /// Number of completed rotations.
    pub fn turn(&self) -> Turn {
        self.turn
    }

    /// Hand `player` one allotment outside of rotation (e.g. at game start).
    pub fn grant(
        &mut self,
        player: PlayerId,
        allotment: &mut dyn Allotment,
    ) -> Result<Grant, PlayerError> {
        let turn = self.turn;
        let player = self.player_mut(player)?;
        Ok(allotment.grant(player, turn)?)
    }

    /// End the current turn: rotate to the next seat, count the turn, grant
    /// the incoming player their allotment, and emit `TurnChanged`.
    pub fn turn_over(
        &mut self,
        allotment: &mut dyn Allotment,
        events: &mut EventBus,
    ) -> Result<PlayerId, PlayerError> {
        if self.players.len() < MIN_PLAYERS {
            return Err(PlayerError::InsufficientPlayers(self.players.len()));
        }

        self.current = (self.current + 1) % self.players.len();
        self.turn += 1;

        let player = self.current_id();
        let turn = self.turn;
        let grant = allotment.grant(&mut self.players[self.current], turn)?;

        tracing::info!(
            target: "railnet::turn",
            player = player.0,
            turn,
            trains = grant.trains,
            goals = grant.goals,
            "turn.changed"
        );
        events.emit(Event::TurnChanged { player, turn });
        Ok(player)
    }

    /// Add `points` to a player's score.
    pub fn award(&mut self, player: PlayerId, points: u32) -> Result<u32, PlayerError> {
        let player = self.player_mut(player)?;
        player.score = player.score.saturating_add(points);
        Ok(player.score)
    }

    /// Players ranked by score (highest first), ties broken by seat.
    pub fn standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self
            .players
            .iter()
            .map(|p| Standing {
                player: p.id,
                score: p.score,
            })
            .collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score).then(a.player.cmp(&b.player)));
        standings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::graph::{Location, StationKind};
    use crate::rng::SimRng;

    fn network() -> NetworkGraph {
        let mut b = NetworkGraph::builder();
        let a = b.add_station("A", Location::new(0, 0), StationKind::Plain).unwrap();
        let c = b.add_station("B", Location::new(5, 0), StationKind::Plain).unwrap();
        b.connect(a, c).unwrap();
        b.build()
    }

    fn catalog() -> Vec<TrainSpec> {
        vec![TrainSpec::new("Steam Train", 50), TrainSpec::new("Diesel Train", 100)]
    }

    #[test]
    fn with_players_requires_two_seats() {
        assert_eq!(
            PlayerManager::with_players(1).unwrap_err(),
            PlayerError::InsufficientPlayers(1)
        );
        assert_eq!(PlayerManager::with_players(3).unwrap().players().len(), 3);
    }

    #[test]
    fn turn_over_without_players_fails() {
        let mut pm = PlayerManager::new();
        pm.create_players(1);
        let mut bus = EventBus::default();
        assert_eq!(
            pm.turn_over(&mut NoAllotment, &mut bus),
            Err(PlayerError::InsufficientPlayers(1))
        );
        assert_eq!(pm.turn(), 0);
        assert!(bus.pending().is_empty());
    }

    #[test]
    fn current_player_changes_after_turn_over() {
        let mut pm = PlayerManager::with_players(2).unwrap();
        let mut bus = EventBus::default();
        let first = pm.current_id();
        pm.turn_over(&mut NoAllotment, &mut bus).unwrap();
        assert_ne!(pm.current_id(), first);
    }

    #[test]
    fn rotation_is_round_robin_and_counts_turns() {
        let mut pm = PlayerManager::with_players(3).unwrap();
        let mut bus = EventBus::default();
        let seats: Vec<u32> = (0..7)
            .map(|_| pm.turn_over(&mut NoAllotment, &mut bus).unwrap().0)
            .collect();
        assert_eq!(seats, vec![1, 2, 0, 1, 2, 0, 1]);
        assert_eq!(pm.turn(), 7);
        bus.deliver();
        assert_eq!(bus.total_emitted(EventKind::TurnChanged), 7);
        assert_eq!(
            bus.latest(EventKind::TurnChanged),
            Some(&Event::TurnChanged {
                player: PlayerId(1),
                turn: 7
            })
        );
    }

    #[test]
    fn player_gains_resources_when_their_turn_comes_round() {
        let graph = network();
        let config = AllotmentConfig::default();
        let specs = catalog();
        let mut rng = SimRng::new(1);
        let mut bus = EventBus::default();
        let mut pm = PlayerManager::with_players(2).unwrap();

        let p1 = pm.current_id();
        let (resources, goals) = {
            let p = pm.player(p1).unwrap();
            (p.resources().len(), p.goals().len())
        };

        for _ in 0..2 {
            let mut allot = StandardAllotment {
                graph: &graph,
                rng: &mut rng,
                catalog: &specs,
                config: &config,
            };
            pm.turn_over(&mut allot, &mut bus).unwrap();
        }

        let p = pm.player(p1).unwrap();
        assert!(p.resources().len() > resources);
        assert!(p.goals().len() > goals);
    }

    #[test]
    fn grant_goes_only_to_incoming_player() {
        let graph = network();
        let config = AllotmentConfig::default();
        let specs = catalog();
        let mut rng = SimRng::new(1);
        let mut bus = EventBus::default();
        let mut pm = PlayerManager::with_players(2).unwrap();

        let mut allot = StandardAllotment {
            graph: &graph,
            rng: &mut rng,
            catalog: &specs,
            config: &config,
        };
        let incoming = pm.turn_over(&mut allot, &mut bus).unwrap();
        assert_eq!(incoming, PlayerId(1));
        assert_eq!(pm.player(PlayerId(1)).unwrap().resources().len(), 1);
        assert_eq!(pm.player(PlayerId(0)).unwrap().resources().len(), 0);
    }

    #[test]
    fn allotment_respects_caps_and_distinct_goal_endpoints() {
        let graph = network();
        let config = AllotmentConfig {
            max_resources: 2,
            max_goals: 1,
        };
        let specs = catalog();
        let mut rng = SimRng::new(5);
        let mut player = Player::new(PlayerId(0));
        let mut allot = StandardAllotment {
            graph: &graph,
            rng: &mut rng,
            catalog: &specs,
            config: &config,
        };
        for turn in 0..5 {
            allot.grant(&mut player, turn).unwrap();
        }
        assert_eq!(player.resources().len(), 2);
        assert_eq!(player.goals().len(), 1);
        let goal = player.goals()[0];
        assert_ne!(goal.origin, goal.destination);
        assert_eq!(goal.issued, 0);
    }

    #[test]
    fn goal_needs_two_stations() {
        let mut b = NetworkGraph::builder();
        b.add_station("Lonely", Location::new(0, 0), StationKind::Plain).unwrap();
        let graph = b.build();
        let config = AllotmentConfig::default();
        let mut rng = SimRng::new(5);
        let mut player = Player::new(PlayerId(0));
        let mut allot = StandardAllotment {
            graph: &graph,
            rng: &mut rng,
            catalog: &[],
            config: &config,
        };
        assert_eq!(
            allot.grant(&mut player, 0),
            Err(GraphError::NoMatchingStation)
        );
    }

    #[test]
    fn train_lookup_by_slot() {
        let mut player = Player::new(PlayerId(0));
        player.add_resource(Resource::Train(Train::new(TrainSpec::new("Steam Train", 50))));
        assert_eq!(player.train(0).unwrap().spec().speed, 50);
        assert!(!player.train(0).unwrap().is_placed());
        assert_eq!(
            player.train(3),
            Err(PlayerError::UnknownTrain {
                player: PlayerId(0),
                index: 3
            })
        );
        assert_eq!(player.trains().count(), 1);
    }

    #[test]
    fn standings_rank_by_score_then_seat() {
        let mut pm = PlayerManager::with_players(3).unwrap();
        pm.award(PlayerId(2), 10).unwrap();
        pm.award(PlayerId(0), 5).unwrap();
        pm.award(PlayerId(1), 5).unwrap();
        let order: Vec<u32> = pm.standings().iter().map(|s| s.player.0).collect();
        assert_eq!(order, vec![2, 0, 1]);
        assert_eq!(
            pm.award(PlayerId(9), 1),
            Err(PlayerError::UnknownPlayer(PlayerId(9)))
        );
    }
}
