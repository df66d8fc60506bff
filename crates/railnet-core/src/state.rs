//! Game phases and the transition table that gates player intents.
//!
//! ```text
//!            begin route             end/cancel route
//!   ┌──────────────────────▶ Routing ───────────────────┐
//!   │                                                   ▼
//! Normal ◀──────────────────────────────────────────── Normal
//!   │  begin placement         place/cancel             ▲
//!   ├──────────────────────▶ Placing ───────────────────┤
//!   │                                                   │
//!   │  end turn (rotation)      animation elapsed       │
//!   └──────────────────────▶ Animating ─────────────────┘
//! ```

use crate::error::GameError;
use crate::event::{Event, EventBus};
use crate::fixed::{Fixed64, Turn};
use serde::{Deserialize, Serialize};

/// The active game phase. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameState {
    /// Idle: accepts station clicks, route/placement starts, and turn end.
    #[default]
    Normal,
    /// The current player is drawing a route.
    Routing,
    /// The current player is placing a train.
    Placing,
    /// Post-turn lockout while effects settle. No intents are accepted.
    Animating,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Routing => "routing",
            Self::Placing => "placing",
            Self::Animating => "animating",
        }
    }

    /// Whether player intents can be accepted at all.
    pub fn accepts_input(&self) -> bool {
        !matches!(self, Self::Animating)
    }

    /// Target state for `intent` from this state, or `None` if the intent is
    /// not valid here. The engine only moves to the target once the intent's
    /// own checks have passed.
    pub fn target(self, intent: IntentKind) -> Option<GameState> {
        use GameState::*;
        use IntentKind::*;
        match (self, intent) {
            (Normal, BeginRoute) => Some(Routing),
            (Routing, EndRoute | CancelRoute) => Some(Normal),
            (Normal | Placing, BeginPlacement) => Some(Placing),
            (Placing, CancelPlacement) => Some(Normal),
            (Normal, EndTurn) => Some(Animating),
            (Normal, StationClick) => Some(Normal),
            (Routing, StationClick) => Some(Routing),
            (Placing, StationClick) => Some(Normal),
            _ => None,
        }
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of an inbound intent, used for validation and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    BeginRoute,
    EndRoute,
    CancelRoute,
    BeginPlacement,
    CancelPlacement,
    EndTurn,
    StationClick,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeginRoute => "begin_route",
            Self::EndRoute => "end_route",
            Self::CancelRoute => "cancel_route",
            Self::BeginPlacement => "begin_placement",
            Self::CancelPlacement => "cancel_placement",
            Self::EndTurn => "end_turn",
            Self::StationClick => "station_click",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GameStateMachine
// ---------------------------------------------------------------------------

/// Owns the current [`GameState`] and the animation timer.
///
/// Intent validation goes through [`GameStateMachine::check`]; the state only
/// changes through [`GameStateMachine::enter`] and [`GameStateMachine::tick`],
/// both of which report the change on the event bus.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    state: GameState,
    /// Time accumulated in the current animation.
    elapsed: Fixed64,
    animation_duration: Fixed64,
    finished: bool,
}

impl GameStateMachine {
    pub fn new(animation_duration: Fixed64) -> Self {
        Self {
            state: GameState::Normal,
            elapsed: Fixed64::ZERO,
            animation_duration,
            finished: false,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn animation_duration(&self) -> Fixed64 {
        self.animation_duration
    }

    /// Fraction of the current animation that has elapsed, in [0, 1].
    /// Zero outside `Animating`.
    pub fn animation_progress(&self) -> Fixed64 {
        if self.state != GameState::Animating || self.animation_duration <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        (self.elapsed / self.animation_duration).min(Fixed64::ONE)
    }

    /// Validate `intent` against the current state and return its target.
    pub fn check(&self, intent: IntentKind) -> Result<GameState, GameError> {
        if self.finished {
            return Err(GameError::GameOver { intent });
        }
        self.state
            .target(intent)
            .ok_or(GameError::IllegalStateTransition {
                state: self.state,
                intent,
            })
    }

    /// Move to `to`, emitting `StateChanged` when the state actually changes.
    pub fn enter(&mut self, to: GameState, events: &mut EventBus, turn: Turn) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        if to == GameState::Animating {
            self.elapsed = Fixed64::ZERO;
        }
        tracing::debug!(
            target: "railnet::state",
            from = from.as_str(),
            to = to.as_str(),
            turn,
            "state.changed"
        );
        events.emit(Event::StateChanged { from, to, turn });
    }

    /// Advance the animation timer by `delta`.
    ///
    /// Only time spent in `Animating` counts; negative deltas are ignored.
    /// Returns `true` on the tick that ends the animation and returns the
    /// machine to `Normal`.
    pub fn tick(&mut self, delta: Fixed64, events: &mut EventBus, turn: Turn) -> bool {
        if self.state != GameState::Animating {
            return false;
        }
        if delta > Fixed64::ZERO {
            self.elapsed = self.elapsed.saturating_add(delta);
        }
        if self.elapsed < self.animation_duration {
            return false;
        }
        self.elapsed = Fixed64::ZERO;
        self.enter(GameState::Normal, events, turn);
        true
    }

    /// Lock the machine: every later intent fails with `GameOver`.
    pub fn finish(&mut self) {
        self.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    fn fixed(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    #[test]
    fn animating_accepts_nothing() {
        for intent in [
            IntentKind::BeginRoute,
            IntentKind::EndRoute,
            IntentKind::CancelRoute,
            IntentKind::BeginPlacement,
            IntentKind::CancelPlacement,
            IntentKind::EndTurn,
            IntentKind::StationClick,
        ] {
            assert_eq!(GameState::Animating.target(intent), None, "{intent}");
        }
        assert!(!GameState::Animating.accepts_input());
    }

    #[test]
    fn transition_table() {
        use GameState::*;
        use IntentKind::*;
        assert_eq!(Normal.target(BeginRoute), Some(Routing));
        assert_eq!(Routing.target(EndRoute), Some(Normal));
        assert_eq!(Routing.target(CancelRoute), Some(Normal));
        assert_eq!(Normal.target(BeginPlacement), Some(Placing));
        assert_eq!(Placing.target(BeginPlacement), Some(Placing));
        assert_eq!(Placing.target(CancelPlacement), Some(Normal));
        assert_eq!(Placing.target(StationClick), Some(Normal));
        assert_eq!(Normal.target(EndTurn), Some(Animating));

        assert_eq!(Placing.target(BeginRoute), None);
        assert_eq!(Routing.target(BeginPlacement), None);
        assert_eq!(Routing.target(EndTurn), None);
        assert_eq!(Placing.target(EndTurn), None);
        assert_eq!(Normal.target(EndRoute), None);
        assert_eq!(Normal.target(CancelPlacement), None);
    }

    #[test]
    fn check_reports_state_and_intent() {
        let mut sm = GameStateMachine::new(fixed(2.0));
        let mut bus = EventBus::default();
        sm.enter(GameState::Placing, &mut bus, 0);
        assert_eq!(
            sm.check(IntentKind::BeginRoute),
            Err(GameError::IllegalStateTransition {
                state: GameState::Placing,
                intent: IntentKind::BeginRoute,
            })
        );
        assert_eq!(sm.state(), GameState::Placing);
    }

    #[test]
    fn enter_emits_only_on_change() {
        let mut sm = GameStateMachine::new(fixed(2.0));
        let mut bus = EventBus::default();
        sm.enter(GameState::Normal, &mut bus, 0);
        assert!(bus.pending().is_empty());
        sm.enter(GameState::Routing, &mut bus, 0);
        assert_eq!(
            bus.pending(),
            &[Event::StateChanged {
                from: GameState::Normal,
                to: GameState::Routing,
                turn: 0,
            }]
        );
    }

    #[test]
    fn tick_accumulates_irregular_deltas_and_finishes_once() {
        let mut sm = GameStateMachine::new(fixed(2.0));
        let mut bus = EventBus::default();
        sm.enter(GameState::Animating, &mut bus, 1);

        assert!(!sm.tick(fixed(0.5), &mut bus, 1));
        assert!(!sm.tick(fixed(-3.0), &mut bus, 1));
        assert_eq!(sm.animation_progress(), fixed(0.25));
        assert!(!sm.tick(fixed(1.25), &mut bus, 1));
        assert!(sm.tick(fixed(0.25), &mut bus, 1));
        assert_eq!(sm.state(), GameState::Normal);

        for _ in 0..5 {
            assert!(!sm.tick(fixed(10.0), &mut bus, 1));
        }
        bus.deliver();
        assert_eq!(bus.total_emitted(EventKind::StateChanged), 2);
    }

    #[test]
    fn tick_outside_animation_does_not_bank_time() {
        let mut sm = GameStateMachine::new(fixed(2.0));
        let mut bus = EventBus::default();
        assert!(!sm.tick(fixed(100.0), &mut bus, 0));
        sm.enter(GameState::Animating, &mut bus, 1);
        assert!(!sm.tick(fixed(1.0), &mut bus, 1));
        assert_eq!(sm.state(), GameState::Animating);
    }

    #[test]
    fn finished_machine_reports_game_over() {
        let mut sm = GameStateMachine::new(fixed(2.0));
        sm.finish();
        assert!(sm.is_finished());
        assert_eq!(
            sm.check(IntentKind::EndTurn),
            Err(GameError::GameOver {
                intent: IntentKind::EndTurn
            })
        );
    }
}
