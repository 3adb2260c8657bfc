//! Criterion benchmarks for key identifier resolution.
//!
//! Every key transition in a replayed snapshot goes through one of these
//! lookups, so they sit on the host's input hot path.
//!
//! Run with:
//! ```bash
//! cargo bench --package deskrelay-core --bench keymap_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deskrelay_core::keymap::{dom_code, KeyMapper};
use deskrelay_core::KeyId;

// ── Representative viewer keys ────────────────────────────────────────────────

fn bench_keys() -> Vec<KeyId> {
    vec![
        KeyId::from_code("KeyA").with_key("a").with_key_code(65),
        KeyId::from_code("KeyZ").with_key("z").with_key_code(90),
        KeyId::from_code("Enter").with_key("Enter").with_key_code(13),
        KeyId::from_code("ShiftLeft").with_key("Shift").with_key_code(16),
        KeyId::from_code("ControlLeft").with_key("Control").with_key_code(17),
        KeyId::from_code("ArrowLeft").with_key("ArrowLeft").with_key_code(37),
        KeyId::from_code("F12").with_key("F12").with_key_code(123),
        KeyId::from_code("BracketLeft").with_key("ü").with_key_code(186),
        KeyId::from_code("Minus").with_key("ß").with_key_code(219),
        KeyId::from_code("MediaPlayPause"),
    ]
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_dom_code_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_dom");

    // Best and worst position in the linear table.
    for code in ["KeyA", "MetaRight", "Unidentified"] {
        group.bench_with_input(BenchmarkId::new("dom_code_to_hid", code), code, |b, code| {
            b.iter(|| dom_code::dom_code_to_hid(black_box(code)))
        });
    }

    group.finish();
}

fn bench_xdotool_names(c: &mut Criterion) {
    let keys = bench_keys();
    let mut group = c.benchmark_group("keymap_xdotool");

    group.bench_function("xdotool_name_single", |b| {
        b.iter(|| KeyMapper::xdotool_name(black_box(&keys[0])))
    });

    group.bench_function("xdotool_name_batch_10", |b| {
        b.iter(|| {
            keys.iter()
                .map(|k| KeyMapper::xdotool_name(black_box(k)))
                .collect::<Vec<_>>()
        })
    });

    group.finish();
}

fn bench_windows_vk(c: &mut Criterion) {
    let keys = bench_keys();
    let mut group = c.benchmark_group("keymap_windows_vk");

    group.bench_function("windows_vk_batch_10", |b| {
        b.iter(|| {
            keys.iter()
                .map(|k| KeyMapper::windows_vk(black_box(k)))
                .collect::<Vec<_>>()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_dom_code_lookup, bench_xdotool_names, bench_windows_vk);
criterion_main!(benches);
