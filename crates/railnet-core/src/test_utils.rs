//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::config::GameConfig;
use crate::engine::Game;
use crate::failure::FailureConfig;
use crate::fixed::Fixed64;
use crate::graph::{Location, NetworkGraph, StationKind};
use crate::rng::RandomSource;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Networks
// ===========================================================================

/// Four stations in a ring with two junctions:
///
/// ```text
/// York ── Leeds* ── Hull
///   └──── Selby* ────┘
/// ```
///
/// York and Hull are not adjacent.
pub fn sample_network() -> NetworkGraph {
    let mut b = NetworkGraph::builder();
    let york = b.add_station("York", Location::new(0, 0), StationKind::Plain).unwrap();
    let leeds = b
        .add_station("Leeds", Location::new(30, 0), StationKind::Collision { broken: false })
        .unwrap();
    let hull = b.add_station("Hull", Location::new(60, 0), StationKind::Plain).unwrap();
    let selby = b
        .add_station("Selby", Location::new(30, 40), StationKind::Collision { broken: false })
        .unwrap();
    b.connect(york, leeds).unwrap();
    b.connect(leeds, hull).unwrap();
    b.connect(york, selby).unwrap();
    b.connect(selby, hull).unwrap();
    b.build()
}

/// `n` plain stations in a line, no junctions.
pub fn plain_line(n: usize) -> NetworkGraph {
    let mut b = NetworkGraph::builder();
    let mut prev = None;
    for i in 0..n {
        let id = b
            .add_station(format!("S{i}"), Location::new(i as i32 * 10, 0), StationKind::Plain)
            .unwrap();
        if let Some(p) = prev {
            b.connect(p, id).unwrap();
        }
        prev = Some(id);
    }
    b.build()
}

/// A line of `n` stations where every other one is a junction.
pub fn junction_line(n: usize) -> NetworkGraph {
    let mut b = NetworkGraph::builder();
    let mut prev = None;
    for i in 0..n {
        let kind = if i % 2 == 1 {
            StationKind::Collision { broken: false }
        } else {
            StationKind::Plain
        };
        let id = b
            .add_station(format!("S{i}"), Location::new(i as i32 * 10, 0), kind)
            .unwrap();
        if let Some(p) = prev {
            b.connect(p, id).unwrap();
        }
        prev = Some(id);
    }
    b.build()
}

// ===========================================================================
// Configs and games
// ===========================================================================

/// `config` with break and fix both certain.
pub fn certain_failures(config: GameConfig) -> GameConfig {
    GameConfig {
        failure: FailureConfig {
            break_probability: Fixed64::ONE,
            fix_probability: Fixed64::ONE,
            ..config.failure.clone()
        },
        ..config
    }
}

pub fn sample_game(config: GameConfig) -> Game {
    Game::new(sample_network(), config).unwrap()
}

/// End `n` turns, running each animation to completion.
pub fn play_turns<R: RandomSource>(game: &mut Game<R>, n: u32) {
    let duration = game.config().animation_duration;
    for _ in 0..n {
        game.request_end_turn().unwrap();
        game.tick(duration);
    }
}

/// Replays a fixed sequence of raw draws, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    values: Vec<u64>,
    next: usize,
}

impl ScriptedRng {
    pub fn new(values: Vec<u64>) -> Self {
        assert!(!values.is_empty(), "ScriptedRng needs at least one value");
        Self { values, next: 0 }
    }

    /// Draws taken so far.
    pub fn draws(&self) -> usize {
        self.next
    }
}

impl RandomSource for ScriptedRng {
    fn next_u64(&mut self) -> u64 {
        let v = self.values[self.next % self.values.len()];
        self.next += 1;
        v
    }
}
