//! Benchmarks for the end-of-turn cycle and state sealing.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use pandemic_seal::game::{end_turn, run_turns};
use pandemic_seal::privacy::codec::TextSealCodec;
use pandemic_seal::store::SealedGameState;
use pandemic_seal::{DeterministicRng, GameState, RulesConfig};

fn bench_single_turn(c: &mut Criterion) {
    let rules = RulesConfig::default();
    let mut rng = DeterministicRng::new(42);
    let state = GameState::new_game(&mut rng);

    c.bench_function("end_turn", |b| {
        b.iter(|| {
            let outcome = end_turn(black_box(state.clone()), &rules, &mut rng);
            black_box(outcome)
        });
    });
}

fn bench_full_game(c: &mut Criterion) {
    let rules = RulesConfig::default();

    c.bench_function("run_turns_100", |b| {
        b.iter(|| {
            let mut rng = DeterministicRng::new(black_box(42));
            let state = GameState::new_game(&mut rng);
            black_box(run_turns(state, 100, &rules, &mut rng))
        });
    });
}

fn bench_seal(c: &mut Criterion) {
    let mut rng = DeterministicRng::new(42);
    let state = GameState::new_game(&mut rng);

    c.bench_function("seal_state", |b| {
        b.iter(|| black_box(SealedGameState::seal(black_box(&state), &TextSealCodec)));
    });
}

criterion_group!(benches, bench_single_turn, bench_full_game, bench_seal);
criterion_main!(benches);
