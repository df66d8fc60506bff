//! Stochastic junction breakage.
//!
//! Once per turn rotation the simulator either tries to repair the one broken
//! junction or, when nothing is broken and the cooldown has run out, tries to
//! break a random one. At most one junction is broken at a time.

use crate::event::{Event, EventBus};
use crate::fixed::{Fixed64, Turn};
use crate::graph::{GraphError, NetworkGraph};
use crate::id::StationId;
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureError {
    #[error("the network has no junction that can break")]
    NoEligibleStation,
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureConfig {
    #[serde(with = "crate::serde_fixed64")]
    pub break_probability: Fixed64,
    #[serde(with = "crate::serde_fixed64")]
    pub fix_probability: Fixed64,
    /// Rotations that must pass after a break or fix before the next break.
    pub min_turns_between_events: u32,
}

impl Default for FailureConfig {
    fn default() -> Self {
        Self {
            break_probability: Fixed64::from_num(0.4),
            fix_probability: Fixed64::from_num(0.5),
            min_turns_between_events: 2,
        }
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    Broke(StationId),
    Fixed(StationId),
    Idle,
}

#[derive(Debug, Clone)]
pub struct FailureSimulator {
    config: FailureConfig,
    broken: Option<StationId>,
    turns_since_event: u32,
}

impl FailureSimulator {
    pub fn new(config: FailureConfig) -> Self {
        Self {
            config,
            broken: None,
            turns_since_event: 0,
        }
    }

    pub fn config(&self) -> &FailureConfig {
        &self.config
    }

    /// The junction currently out of service, if any.
    pub fn broken_station(&self) -> Option<StationId> {
        self.broken
    }

    pub fn turns_since_event(&self) -> u32 {
        self.turns_since_event
    }

    /// Run one rotation of the break/fix model against `graph`.
    ///
    /// The cooldown is compared before this rotation is counted, so with a
    /// threshold of 2 and certain outcomes a fresh game breaks on the third
    /// rotation and repairs on the fourth.
    pub fn evaluate<R: RandomSource + ?Sized>(
        &mut self,
        graph: &mut NetworkGraph,
        rng: &mut R,
        events: &mut EventBus,
        turn: Turn,
    ) -> Result<FailureOutcome, FailureError> {
        let outcome = match self.broken {
            Some(station) => {
                if rng.chance(self.config.fix_probability) {
                    graph.set_broken(station, false)?;
                    self.broken = None;
                    self.turns_since_event = 0;
                    tracing::info!(
                        target: "railnet::failure",
                        turn,
                        station = graph.station(station).map(|s| s.name()).unwrap_or_default(),
                        "junction.fixed"
                    );
                    events.emit(Event::JunctionFixed { station, turn });
                    FailureOutcome::Fixed(station)
                } else {
                    FailureOutcome::Idle
                }
            }
            None if self.turns_since_event >= self.config.min_turns_between_events => {
                if rng.chance(self.config.break_probability) {
                    let station = graph
                        .random_station(rng, |_, s| s.is_junction() && !s.is_broken())
                        .map_err(|e| match e {
                            GraphError::NoMatchingStation => FailureError::NoEligibleStation,
                            other => FailureError::Graph(other),
                        })?;
                    graph.set_broken(station, true)?;
                    self.broken = Some(station);
                    self.turns_since_event = 0;
                    tracing::info!(
                        target: "railnet::failure",
                        turn,
                        station = graph.station(station).map(|s| s.name()).unwrap_or_default(),
                        "junction.broken"
                    );
                    events.emit(Event::JunctionBroken { station, turn });
                    FailureOutcome::Broke(station)
                } else {
                    FailureOutcome::Idle
                }
            }
            None => FailureOutcome::Idle,
        };

        self.turns_since_event = self.turns_since_event.saturating_add(1);
        Ok(outcome)
    }
}
