//! The game context: owns the network, players, failure model and state
//! machine, and turns host intents into state changes and events.
//!
//! # Turn pipeline
//!
//! [`Game::request_end_turn`] runs, in order:
//! 1. **Rotate** -- the next player becomes current and receives their allotment
//! 2. **Animate** -- the state machine enters `Animating`
//! 3. **Failures** -- the failure model breaks or repairs at most one junction
//! 4. **Deliver** -- buffered events go out to subscribers
//!
//! [`Game::tick`] then runs the animation down. When it ends on or after the
//! final turn, `GameEnded` fires and every later intent fails with
//! [`GameError::GameOver`].
//!
//! Every public operation delivers its events before returning, whether it
//! succeeded or not.

use crate::config::GameConfig;
use crate::error::GameError;
use crate::event::{Event, EventBus};
use crate::failure::{FailureError, FailureSimulator};
use crate::fixed::{Fixed64, Turn};
use crate::graph::{GraphError, NetworkGraph};
use crate::hash::StateHash;
use crate::id::{PlayerId, StationId};
use crate::intent::Intent;
use crate::player::{Player, PlayerManager, Standing, StandardAllotment};
use crate::query::{ConnectionSnapshot, PlayerSnapshot, StationSnapshot, TrainSnapshot};
use crate::rng::{RandomSource, SimRng};
use crate::state::{GameState, GameStateMachine, IntentKind};

/// Work in progress between a begin intent and its completion.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Route {
        player: PlayerId,
        train: usize,
        stations: Vec<StationId>,
    },
    Placement {
        player: PlayerId,
        train: usize,
    },
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

pub struct Game<R: RandomSource = SimRng> {
    graph: NetworkGraph,
    players: PlayerManager,
    failures: FailureSimulator,
    machine: GameStateMachine,
    rng: R,
    config: GameConfig,
    pending: Option<Pending>,
    /// Outbound notifications. Subscribe here; delivery is driven by the game.
    pub events: EventBus,
}

impl Game<SimRng> {
    /// Start a game on `graph`, seeding the RNG from `config.seed`.
    pub fn new(graph: NetworkGraph, config: GameConfig) -> Result<Self, GameError> {
        let rng = SimRng::new(config.seed);
        Self::with_rng(graph, config, rng)
    }
}

impl<R: RandomSource> Game<R> {
    /// Start a game with an explicit random source.
    ///
    /// Rejects maps that could fail mid-game: a failure model that can
    /// break junctions needs at least one, and goals need two stations.
    pub fn with_rng(graph: NetworkGraph, config: GameConfig, rng: R) -> Result<Self, GameError> {
        config.validate()?;
        if config.failure.break_probability > Fixed64::ZERO
            && graph.collision_stations().next().is_none()
        {
            return Err(FailureError::NoEligibleStation.into());
        }
        if config.allotment.max_goals > 0 && graph.station_count() < 2 {
            return Err(GraphError::NoMatchingStation.into());
        }

        let players = PlayerManager::with_players(config.player_count)?;
        let mut game = Self {
            failures: FailureSimulator::new(config.failure.clone()),
            machine: GameStateMachine::new(config.animation_duration),
            events: EventBus::new(config.history_capacity),
            graph,
            players,
            rng,
            config,
            pending: None,
        };

        let seats: Vec<PlayerId> = game.players.players().iter().map(Player::id).collect();
        for seat in seats {
            let mut allotment = StandardAllotment {
                graph: &game.graph,
                rng: &mut game.rng,
                catalog: &game.config.trains,
                config: &game.config.allotment,
            };
            game.players.grant(seat, &mut allotment)?;
        }

        tracing::info!(
            target: "railnet::turn",
            players = game.config.player_count,
            stations = game.graph.station_count(),
            total_turns = game.config.total_turns,
            "game.started"
        );
        Ok(game)
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Start drawing a route for one of the current player's placed trains.
    pub fn request_begin_route(&mut self, player: PlayerId, train: usize) -> Result<(), GameError> {
        let result = self.begin_route(player, train);
        self.events.deliver();
        result
    }

    /// Commit the route drawn so far.
    pub fn request_end_route(&mut self) -> Result<(), GameError> {
        let result = self.end_route();
        self.events.deliver();
        result
    }

    pub fn request_cancel_route(&mut self) -> Result<(), GameError> {
        let result = self.cancel(IntentKind::CancelRoute);
        self.events.deliver();
        result
    }

    /// Pick an unplaced train to put on the map. The next station click
    /// places it.
    pub fn request_begin_placement(
        &mut self,
        player: PlayerId,
        train: usize,
    ) -> Result<(), GameError> {
        let result = self.begin_placement(player, train);
        self.events.deliver();
        result
    }

    pub fn request_cancel_placement(&mut self) -> Result<(), GameError> {
        let result = self.cancel(IntentKind::CancelPlacement);
        self.events.deliver();
        result
    }

    /// End the current player's turn. See the module docs for the pipeline.
    pub fn request_end_turn(&mut self) -> Result<(), GameError> {
        let result = self.end_turn();
        self.events.deliver();
        result
    }

    /// A station was clicked. Extends the route while routing, places the
    /// train while placing, and is only reported otherwise.
    pub fn station_clicked(&mut self, station: StationId) -> Result<(), GameError> {
        let result = self.click(station);
        self.events.deliver();
        result
    }

    /// Dispatch an [`Intent`] to the matching request method.
    pub fn submit(&mut self, intent: Intent) -> Result<(), GameError> {
        match intent {
            Intent::BeginRoute { player, train } => self.request_begin_route(player, train),
            Intent::EndRoute => self.request_end_route(),
            Intent::CancelRoute => self.request_cancel_route(),
            Intent::BeginPlacement { player, train } => {
                self.request_begin_placement(player, train)
            }
            Intent::CancelPlacement => self.request_cancel_placement(),
            Intent::EndTurn => self.request_end_turn(),
            Intent::StationClicked(station) => self.station_clicked(station),
        }
    }

    /// Like [`Game::submit`], but recoverable rejections become an
    /// `IntentRejected` event and `Ok(false)`. Fatal errors still propagate.
    pub fn apply(&mut self, intent: Intent) -> Result<bool, GameError> {
        match self.submit(intent) {
            Ok(()) => Ok(true),
            Err(err) if err.is_recoverable() => {
                let kind = intent.kind();
                tracing::warn!(
                    target: "railnet::intent",
                    intent = kind.as_str(),
                    turn = self.players.turn(),
                    error = %err,
                    "intent.rejected"
                );
                self.events.emit(Event::IntentRejected {
                    intent: kind,
                    reason: err.to_string(),
                    turn: self.players.turn(),
                });
                self.events.deliver();
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    // -----------------------------------------------------------------------
    // Host lifecycle
    // -----------------------------------------------------------------------

    /// Advance the animation clock. Returns `true` on the tick that ends an
    /// animation.
    pub fn tick(&mut self, delta: Fixed64) -> bool {
        let turn = self.players.turn();
        let ended = self.machine.tick(delta, &mut self.events, turn);
        if ended && turn >= self.config.total_turns && !self.machine.is_finished() {
            self.machine.finish();
            let standings = self.players.standings();
            tracing::info!(
                target: "railnet::turn",
                turn,
                winner = standings.first().map(|s| s.player.0),
                "game.ended"
            );
            self.events.emit(Event::GameEnded { standings, turn });
        }
        self.events.deliver();
        ended
    }

    /// Add to a player's score, e.g. when the host sees a goal delivered.
    pub fn award(&mut self, player: PlayerId, points: u32) -> Result<u32, GameError> {
        Ok(self.players.award(player, points)?)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn current_state(&self) -> GameState {
        self.machine.state()
    }

    pub fn current_player(&self) -> &Player {
        self.players.current_player()
    }

    pub fn current_player_id(&self) -> PlayerId {
        self.players.current_id()
    }

    pub fn is_station_broken(&self, station: StationId) -> Result<bool, GameError> {
        Ok(self.graph.is_station_broken(station)?)
    }

    /// The junction currently out of service, if any.
    pub fn broken_junction(&self) -> Option<StationId> {
        self.failures.broken_station()
    }

    /// Completed rotations.
    pub fn turn(&self) -> Turn {
        self.players.turn()
    }

    pub fn total_turns(&self) -> Turn {
        self.config.total_turns
    }

    /// Fraction of the current animation elapsed; zero outside `Animating`.
    pub fn animation_progress(&self) -> Fixed64 {
        self.machine.animation_progress()
    }

    pub fn is_finished(&self) -> bool {
        self.machine.is_finished()
    }

    pub fn standings(&self) -> Vec<Standing> {
        self.players.standings()
    }

    /// Stations clicked so far in the route being drawn.
    pub fn route_draft(&self) -> Option<&[StationId]> {
        match &self.pending {
            Some(Pending::Route { stations, .. }) => Some(stations),
            _ => None,
        }
    }

    pub fn graph(&self) -> &NetworkGraph {
        &self.graph
    }

    pub fn players(&self) -> &PlayerManager {
        &self.players
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn connections_snapshot(&self) -> Vec<ConnectionSnapshot> {
        self.graph
            .connections_with_passability()
            .map(|(id, conn, passable)| {
                let (from, to) = conn.endpoints();
                ConnectionSnapshot {
                    id,
                    from,
                    to,
                    length: conn.length(),
                    broken: conn.is_broken(),
                    passable,
                }
            })
            .collect()
    }

    pub fn stations_snapshot(&self) -> Vec<StationSnapshot> {
        self.graph
            .stations()
            .map(|(id, station)| StationSnapshot {
                id,
                name: station.name().to_string(),
                location: station.location(),
                junction: station.is_junction(),
                broken: station.is_broken(),
                trains_here: self.trains_at(id),
            })
            .collect()
    }

    pub fn players_snapshot(&self) -> Vec<PlayerSnapshot> {
        let current = self.players.current_id();
        self.players
            .players()
            .iter()
            .map(|p| PlayerSnapshot {
                id: p.id(),
                is_current: p.id() == current,
                score: p.score(),
                trains: p
                    .trains()
                    .map(|(index, t)| TrainSnapshot {
                        index,
                        name: t.spec().name.clone(),
                        speed: t.spec().speed,
                        location: t.location(),
                        route: t.route().to_vec(),
                    })
                    .collect(),
                goals: p.goals().to_vec(),
            })
            .collect()
    }

    /// Hash of everything that affects future play. Two games built from the
    /// same map, config and seed and fed the same intents hash equal.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u32(self.players.turn());
        h.write_u32(self.players.current_id().0);
        h.write_str(self.machine.state().as_str());
        h.write_bool(self.machine.is_finished());
        for (_, station) in self.graph.stations() {
            h.write_str(station.name());
            h.write_bool(station.is_broken());
        }
        for (_, conn) in self.graph.connections() {
            h.write_bool(conn.is_broken());
        }
        for player in self.players.players() {
            h.write_u32(player.score());
            h.write_u64(player.resources().len() as u64);
            for (_, train) in player.trains() {
                h.write_str(&train.spec().name);
                h.write_u64(train.location().map_or(0, |s| s.slot_bits()));
                h.write_u64(train.route().len() as u64);
            }
            for goal in player.goals() {
                h.write_u64(goal.origin.slot_bits());
                h.write_u64(goal.destination.slot_bits());
                h.write_u32(goal.issued);
            }
        }
        h.finish()
    }

    // -----------------------------------------------------------------------
    // Intent handlers (events are delivered by the callers)
    // -----------------------------------------------------------------------

    fn begin_route(&mut self, player: PlayerId, train: usize) -> Result<(), GameError> {
        let target = self.machine.check(IntentKind::BeginRoute)?;
        self.ensure_current(player)?;
        let start = self.players.player(player)?.train(train)?.location();
        let start = start.ok_or(GameError::TrainNotPlaced { player, train })?;

        self.pending = Some(Pending::Route {
            player,
            train,
            stations: vec![start],
        });
        self.accept(IntentKind::BeginRoute, target);
        Ok(())
    }

    fn end_route(&mut self) -> Result<(), GameError> {
        let target = self.machine.check(IntentKind::EndRoute)?;
        let Some(Pending::Route {
            player,
            train,
            stations,
        }) = &self.pending
        else {
            return Err(self.illegal(IntentKind::EndRoute));
        };
        if stations.len() < 2 {
            return Err(GameError::RouteTooShort);
        }
        let (player, train, stations) = (*player, *train, stations.clone());

        self.players
            .player_mut(player)?
            .train_mut(train)?
            .assign_route(stations.clone());
        self.pending = None;

        let turn = self.players.turn();
        tracing::info!(
            target: "railnet::intent",
            player = player.0,
            train,
            stops = stations.len(),
            "route.completed"
        );
        self.events.emit(Event::RouteCompleted {
            player,
            train,
            stations,
            turn,
        });
        self.accept(IntentKind::EndRoute, target);
        Ok(())
    }

    fn begin_placement(&mut self, player: PlayerId, train: usize) -> Result<(), GameError> {
        let target = self.machine.check(IntentKind::BeginPlacement)?;
        self.ensure_current(player)?;
        if self.players.player(player)?.train(train)?.is_placed() {
            return Err(GameError::TrainAlreadyPlaced { player, train });
        }

        self.pending = Some(Pending::Placement { player, train });
        self.accept(IntentKind::BeginPlacement, target);
        Ok(())
    }

    fn cancel(&mut self, intent: IntentKind) -> Result<(), GameError> {
        let target = self.machine.check(intent)?;
        self.pending = None;
        self.accept(intent, target);
        Ok(())
    }

    fn end_turn(&mut self) -> Result<(), GameError> {
        let target = self.machine.check(IntentKind::EndTurn)?;

        let mut allotment = StandardAllotment {
            graph: &self.graph,
            rng: &mut self.rng,
            catalog: &self.config.trains,
            config: &self.config.allotment,
        };
        self.players.turn_over(&mut allotment, &mut self.events)?;
        self.pending = None;

        let turn = self.players.turn();
        self.machine.enter(target, &mut self.events, turn);
        self.failures
            .evaluate(&mut self.graph, &mut self.rng, &mut self.events, turn)?;
        Ok(())
    }

    fn click(&mut self, station: StationId) -> Result<(), GameError> {
        if !self.graph.contains_station(station) {
            return Err(GraphError::InvalidEntity(station.into()).into());
        }
        let target = self.machine.check(IntentKind::StationClick)?;
        let state = self.machine.state();
        let turn = self.players.turn();

        match &mut self.pending {
            Some(Pending::Route { stations, .. }) => {
                let last = stations.last().copied().unwrap_or(station);
                let conn = self
                    .graph
                    .connection_between(last, station)
                    .ok_or(GameError::NotAdjacent {
                        from: last,
                        to: station,
                    })?;
                if !self.graph.is_connection_passable(conn)? {
                    return Err(GameError::ConnectionBlocked(conn));
                }
                stations.push(station);
                self.events.emit(Event::StationClicked {
                    station,
                    state,
                    turn,
                });
            }
            Some(Pending::Placement { player, train }) => {
                let (player, train) = (*player, *train);
                if self.graph.is_station_broken(station)? {
                    return Err(GameError::StationBroken(station));
                }
                self.players
                    .player_mut(player)?
                    .train_mut(train)?
                    .place(station);
                self.pending = None;
                self.events.emit(Event::StationClicked {
                    station,
                    state,
                    turn,
                });
                self.events.emit(Event::TrainPlaced {
                    player,
                    train,
                    station,
                    turn,
                });
            }
            None => {
                self.events.emit(Event::StationClicked {
                    station,
                    state,
                    turn,
                });
            }
        }

        self.accept(IntentKind::StationClick, target);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn ensure_current(&self, player: PlayerId) -> Result<(), GameError> {
        let current = self.players.current_id();
        if player != current {
            return Err(GameError::NotCurrentPlayer { player, current });
        }
        Ok(())
    }

    fn illegal(&self, intent: IntentKind) -> GameError {
        GameError::IllegalStateTransition {
            state: self.machine.state(),
            intent,
        }
    }

    fn accept(&mut self, intent: IntentKind, target: GameState) {
        let turn = self.players.turn();
        tracing::debug!(
            target: "railnet::intent",
            intent = intent.as_str(),
            turn,
            "intent.accepted"
        );
        self.machine.enter(target, &mut self.events, turn);
    }

    fn trains_at(&self, station: StationId) -> u32 {
        self.players
            .players()
            .iter()
            .flat_map(|p| p.trains())
            .filter(|(_, t)| t.location() == Some(station))
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, ListenerControl};
    use crate::test_utils::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn new_game_starts_normal_with_opening_allotment() {
        let game = sample_game(GameConfig::default());
        assert_eq!(game.current_state(), GameState::Normal);
        assert_eq!(game.turn(), 0);
        assert_eq!(game.current_player_id(), PlayerId(0));
        for p in game.players().players() {
            assert_eq!(p.resources().len(), 1);
            assert_eq!(p.goals().len(), 1);
        }
    }

    #[test]
    fn rejects_map_without_junctions_when_breaks_enabled() {
        let err = Game::new(plain_line(3), GameConfig::default()).err();
        assert_eq!(err, Some(GameError::Failure(FailureError::NoEligibleStation)));

        let config = GameConfig {
            failure: crate::failure::FailureConfig {
                break_probability: Fixed64::ZERO,
                ..Default::default()
            },
            ..GameConfig::default()
        };
        assert!(Game::new(plain_line(3), config).is_ok());
    }

    #[test]
    fn end_turn_rotates_and_animates() {
        let mut game = sample_game(GameConfig::default());
        game.request_end_turn().unwrap();
        assert_eq!(game.current_state(), GameState::Animating);
        assert_eq!(game.turn(), 1);
        assert_eq!(game.current_player_id(), PlayerId(1));
        assert_eq!(
            game.request_end_turn(),
            Err(GameError::IllegalStateTransition {
                state: GameState::Animating,
                intent: IntentKind::EndTurn,
            })
        );
        assert!(!game.tick(Fixed64::ONE));
        assert!(game.tick(Fixed64::ONE));
        assert_eq!(game.current_state(), GameState::Normal);
    }

    #[test]
    fn end_turn_event_order() {
        let mut game = sample_game(certain_failures(GameConfig::default()));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        game.events.subscribe_all(Box::new(move |e| {
            sink.borrow_mut().push(e.kind());
            ListenerControl::Keep
        }));
        play_turns(&mut game, 2);
        seen.borrow_mut().clear();
        game.request_end_turn().unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                EventKind::TurnChanged,
                EventKind::StateChanged,
                EventKind::JunctionBroken
            ]
        );
    }

    #[test]
    fn begin_route_while_placing_is_rejected() {
        let mut game = sample_game(GameConfig::default());
        let p = game.current_player_id();
        game.request_begin_placement(p, 0).unwrap();
        assert_eq!(game.current_state(), GameState::Placing);
        assert_eq!(
            game.request_begin_route(p, 0),
            Err(GameError::IllegalStateTransition {
                state: GameState::Placing,
                intent: IntentKind::BeginRoute,
            })
        );
        assert_eq!(game.current_state(), GameState::Placing);
    }

    #[test]
    fn placement_then_route() {
        let mut game = sample_game(GameConfig::default());
        let p = game.current_player_id();
        let york = game.graph().station_by_name("York").unwrap();
        let leeds = game.graph().station_by_name("Leeds").unwrap();
        let hull = game.graph().station_by_name("Hull").unwrap();

        game.request_begin_placement(p, 0).unwrap();
        game.station_clicked(york).unwrap();
        assert_eq!(game.current_state(), GameState::Normal);
        assert_eq!(game.current_player().train(0).unwrap().location(), Some(york));
        assert_eq!(
            game.request_begin_placement(p, 0),
            Err(GameError::TrainAlreadyPlaced { player: p, train: 0 })
        );

        game.request_begin_route(p, 0).unwrap();
        assert_eq!(game.request_end_route(), Err(GameError::RouteTooShort));
        game.station_clicked(leeds).unwrap();
        assert_eq!(
            game.station_clicked(york),
            Ok(()),
            "backtracking along a connection is allowed"
        );
        game.station_clicked(leeds).unwrap();
        game.station_clicked(hull).unwrap();
        assert_eq!(game.route_draft(), Some(&[york, leeds, york, leeds, hull][..]));
        game.request_end_route().unwrap();

        assert_eq!(game.current_state(), GameState::Normal);
        assert_eq!(
            game.current_player().train(0).unwrap().route(),
            &[york, leeds, york, leeds, hull]
        );
        assert_eq!(game.events.total_emitted(EventKind::RouteCompleted), 1);
        assert_eq!(game.events.total_emitted(EventKind::TrainPlaced), 1);
    }

    #[test]
    fn route_requires_adjacent_unblocked_stations() {
        let mut game = sample_game(GameConfig::default());
        let p = game.current_player_id();
        let york = game.graph().station_by_name("York").unwrap();
        let hull = game.graph().station_by_name("Hull").unwrap();

        game.request_begin_placement(p, 0).unwrap();
        game.station_clicked(york).unwrap();
        game.request_begin_route(p, 0).unwrap();
        assert_eq!(
            game.station_clicked(hull),
            Err(GameError::NotAdjacent { from: york, to: hull })
        );
        assert_eq!(game.route_draft(), Some(&[york][..]));
        game.request_cancel_route().unwrap();
        assert_eq!(game.route_draft(), None);
        assert_eq!(game.current_state(), GameState::Normal);
    }

    #[test]
    fn route_cannot_cross_broken_junction() {
        let mut game = sample_game(certain_failures(GameConfig::default()));
        play_turns(&mut game, 2);
        game.request_end_turn().unwrap();
        game.tick(Fixed64::from_num(2));
        let broken = game.broken_junction().unwrap();

        let p = game.current_player_id();
        let start = game
            .graph()
            .connections_of(broken)
            .unwrap()
            .first()
            .and_then(|(_, c)| c.other(broken))
            .unwrap();
        game.request_begin_placement(p, 0).unwrap();
        assert_eq!(game.station_clicked(broken), Err(GameError::StationBroken(broken)));
        assert_eq!(game.current_state(), GameState::Placing);
        game.station_clicked(start).unwrap();

        game.request_begin_route(p, 0).unwrap();
        let conn = game.graph().connection_between(start, broken).unwrap();
        assert_eq!(
            game.station_clicked(broken),
            Err(GameError::ConnectionBlocked(conn))
        );
    }

    #[test]
    fn only_current_player_may_act() {
        let mut game = sample_game(GameConfig::default());
        assert_eq!(
            game.request_begin_placement(PlayerId(1), 0),
            Err(GameError::NotCurrentPlayer {
                player: PlayerId(1),
                current: PlayerId(0),
            })
        );
        assert_eq!(game.current_state(), GameState::Normal);
    }

    #[test]
    fn apply_converts_recoverable_errors() {
        let mut game = sample_game(GameConfig::default());
        assert_eq!(game.apply(Intent::EndRoute), Ok(false));
        assert_eq!(game.events.total_emitted(EventKind::IntentRejected), 1);
        let Some(Event::IntentRejected { intent, reason, .. }) =
            game.events.latest(EventKind::IntentRejected)
        else {
            panic!("missing rejection");
        };
        assert_eq!(*intent, IntentKind::EndRoute);
        assert_eq!(reason, "cannot end_route while normal");

        assert_eq!(game.apply(Intent::EndTurn), Ok(true));

        let foreign = sample_network().station_by_name("York").unwrap();
        assert_eq!(
            game.apply(Intent::StationClicked(foreign)),
            Err(GameError::Graph(GraphError::InvalidEntity(foreign.into())))
        );
    }

    #[test]
    fn game_ends_once_after_final_animation() {
        let config = GameConfig {
            total_turns: 3,
            ..GameConfig::default()
        };
        let mut game = sample_game(config);
        play_turns(&mut game, 2);
        assert!(!game.is_finished());
        game.request_end_turn().unwrap();
        assert!(!game.is_finished());
        assert!(game.tick(Fixed64::from_num(5)));
        assert!(game.is_finished());
        assert!(!game.tick(Fixed64::from_num(5)));
        assert_eq!(game.events.total_emitted(EventKind::GameEnded), 1);
        assert_eq!(
            game.request_end_turn(),
            Err(GameError::GameOver {
                intent: IntentKind::EndTurn
            })
        );
    }

    #[test]
    fn snapshots_reflect_state() {
        let mut game = sample_game(GameConfig::default());
        let p = game.current_player_id();
        let york = game.graph().station_by_name("York").unwrap();
        game.request_begin_placement(p, 0).unwrap();
        game.station_clicked(york).unwrap();

        let stations = game.stations_snapshot();
        assert_eq!(stations.len(), game.graph().station_count());
        let york_snap = stations.iter().find(|s| s.id == york).unwrap();
        assert_eq!(york_snap.trains_here, 1);
        assert!(!york_snap.junction);

        assert!(game.connections_snapshot().iter().all(|c| c.passable));
        let players = game.players_snapshot();
        assert!(players[0].is_current);
        assert_eq!(players[0].trains[0].location, Some(york));
    }

    #[test]
    fn injected_rng_drives_failures() {
        // A zero draw passes every chance below one and always picks the
        // first eligible station.
        let mut game =
            Game::with_rng(sample_network(), GameConfig::default(), ScriptedRng::new(vec![0]))
                .unwrap();
        let leeds = game.graph().station_by_name("Leeds").unwrap();
        play_turns(&mut game, 3);
        assert_eq!(game.broken_junction(), Some(leeds));
        assert!(game.is_station_broken(leeds).unwrap());
        play_turns(&mut game, 1);
        assert_eq!(game.broken_junction(), None);
    }

    #[test]
    fn same_seed_same_hash() {
        let run = || {
            let mut game = sample_game(GameConfig {
                seed: 11,
                ..GameConfig::default()
            });
            play_turns(&mut game, 12);
            game.state_hash()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn handle_unsubscribe_between_turns_stops_delivery() {
        let mut game = sample_game(GameConfig::default());
        let calls = Rc::new(RefCell::new(0u32));
        let counter = calls.clone();
        let id = game.events.subscribe(
            EventKind::TurnChanged,
            Box::new(move |_| {
                *counter.borrow_mut() += 1;
                ListenerControl::Keep
            }),
        );
        play_turns(&mut game, 1);
        assert_eq!(*calls.borrow(), 1);

        game.events.unsubscriber().unsubscribe(id);
        assert_eq!(game.events.subscriber_count(), 0);
        play_turns(&mut game, 2);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn connection_snapshot_reports_blocked_track() {
        let mut game = sample_game(certain_failures(GameConfig {
            seed: 5,
            ..GameConfig::default()
        }));
        play_turns(&mut game, 3);
        let broken = game.broken_junction().unwrap();
        for snap in game.connections_snapshot() {
            let touches = snap.from == broken || snap.to == broken;
            assert_eq!(snap.passable, !touches);
            assert_eq!(Ok(snap.passable), game.graph().is_connection_passable(snap.id));
        }
    }
}
