//! Criterion benchmarks for the snapshot diff planner.
//!
//! The poll loop plans every snapshot a viewer posts, up to 100 per second
//! while the pointer is moving.
//!
//! Run with:
//! ```bash
//! cargo bench --package deskrelay-host --bench diff_bench
//! ```

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use deskrelay_core::{ControlSnapshot, KeyId, MouseState};
use deskrelay_host::application::replay::{ReplayEngine, DEFAULT_FRESHNESS};
use deskrelay_host::infrastructure::input_driver::mock::MockInputDriver;

const NOW: u64 = 1_700_000_000_000;

fn snapshot(time: u64, x: f64, codes: &[&str]) -> ControlSnapshot {
    ControlSnapshot {
        mouse: Some(MouseState::at(x, 0.5, 0b001)),
        keys: Some(codes.iter().map(|c| KeyId::from_code(*c)).collect()),
        time: Some(time),
        ..ControlSnapshot::default()
    }
}

fn engine() -> ReplayEngine {
    ReplayEngine::new(Arc::new(MockInputDriver::new()), DEFAULT_FRESHNESS)
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay_plan");

    // Pointer drag with a chord held: only the move changes.
    let held = ["ControlLeft", "ShiftLeft", "KeyA"];
    group.bench_function("move_only", |b| {
        b.iter_batched(
            || {
                let mut engine = engine();
                let _ = engine.plan(&snapshot(NOW - 2, 0.1, &held), NOW);
                engine
            },
            |mut engine| engine.plan(black_box(&snapshot(NOW - 1, 0.2, &held)), NOW),
            BatchSize::SmallInput,
        )
    });

    // Ten keys change at once.
    let before: Vec<&str> = vec!["KeyA", "KeyB", "KeyC", "KeyD", "KeyE"];
    let after: Vec<&str> = vec!["KeyF", "KeyG", "KeyH", "KeyI", "KeyJ"];
    group.bench_function("key_swap_10", |b| {
        b.iter_batched(
            || {
                let mut engine = engine();
                let _ = engine.plan(&snapshot(NOW - 2, 0.5, &before), NOW);
                engine
            },
            |mut engine| engine.plan(black_box(&snapshot(NOW - 1, 0.5, &after)), NOW),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("duplicate_skip", |b| {
        let mut engine = engine();
        let _ = engine.plan(&snapshot(NOW - 1, 0.5, &held), NOW);
        let dup = snapshot(NOW - 1, 0.5, &held);
        b.iter(|| engine.plan(black_box(&dup), NOW))
    });

    group.finish();
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
