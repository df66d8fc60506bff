//! Railnet Core -- the turn and network-integrity engine for a train
//! routing strategy game.
//!
//! Players take turns placing trains and drawing routes across a fixed rail
//! network while a stochastic failure model knocks junction stations out of
//! service. The crate owns all game rules; rendering and input live in the
//! host, which feeds intents in and reads snapshots and events out.
//!
//! # Turn Cycle
//!
//! 1. **Normal** -- the current player places trains ([`engine::Game::request_begin_placement`])
//!    and draws routes ([`engine::Game::request_begin_route`]).
//! 2. **End turn** -- turn ownership rotates, the incoming player receives
//!    new trains and goals, and the failure model breaks or repairs a junction.
//! 3. **Animating** -- no intents are accepted until [`engine::Game::tick`]
//!    has run the animation down, then play returns to Normal.
//!
//! # Key Types
//!
//! - [`engine::Game`] -- owns everything and is the only entry point for intents.
//! - [`graph::NetworkGraph`] -- stations and connections with breakable junctions.
//! - [`failure::FailureSimulator`] -- cooldown-gated junction break/fix model.
//! - [`player::PlayerManager`] -- round-robin turn ownership and allotments.
//! - [`state::GameStateMachine`] -- phase transitions and the animation timer.
//! - [`event::EventBus`] -- buffered, typed notifications for the host.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for probabilities and time.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod failure;
pub mod fixed;
pub mod graph;
pub mod hash;
pub mod id;
pub mod intent;
pub mod player;
pub mod query;
pub mod rng;
pub mod serde_fixed64;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
