//! Criterion benchmarks for turn rotation.
//!
//! - `end_turn_cycle`: one end-turn plus animation on the sample network
//! - `failure_evaluate`: the break/fix model alone on a long junction line

use criterion::{Criterion, criterion_group, criterion_main};
use railnet_core::config::GameConfig;
use railnet_core::event::EventBus;
use railnet_core::failure::{FailureConfig, FailureSimulator};
use railnet_core::rng::SimRng;
use railnet_core::test_utils::*;
use std::hint::black_box;

fn bench_end_turn(c: &mut Criterion) {
    let config = GameConfig {
        total_turns: u32::MAX,
        ..GameConfig::default()
    };
    let mut game = sample_game(config);
    let duration = game.config().animation_duration;

    c.bench_function("end_turn_cycle", |b| {
        b.iter(|| {
            game.request_end_turn().unwrap();
            black_box(game.tick(duration));
        })
    });
}

fn bench_failure(c: &mut Criterion) {
    let mut graph = junction_line(1000);
    let mut sim = FailureSimulator::new(FailureConfig {
        min_turns_between_events: 0,
        ..FailureConfig::default()
    });
    let mut rng = SimRng::new(1);
    let mut bus = EventBus::new(8);
    let mut turn = 0;

    c.bench_function("failure_evaluate", |b| {
        b.iter(|| {
            turn += 1;
            black_box(sim.evaluate(&mut graph, &mut rng, &mut bus, turn).unwrap());
            bus.deliver();
        })
    });
}

criterion_group!(benches, bench_end_turn, bench_failure);
criterion_main!(benches);
