//! Hot-path benchmarks: closed-form spring advance and segment lookup.

use coil_core::breakpoint::{Breakpoint, BreakpointKey, Guarantee};
use coil_core::direction::InputDirection;
use coil_core::mapping::Mapping;
use coil_core::spec::DirectionalMotionSpec;
use coil_core::spring::{SpringParameters, SpringState, presets};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_spring_advance(c: &mut Criterion) {
    let regimes = [
        ("underdamped", SpringParameters::new(380.0, 0.5).unwrap()),
        ("critical", SpringParameters::new(380.0, 1.0).unwrap()),
        ("overdamped", SpringParameters::new(380.0, 2.5).unwrap()),
    ];
    let state = SpringState {
        displacement: 1.0,
        velocity: -3.0,
    };
    let mut group = c.benchmark_group("spring_advance");
    for (name, params) in regimes {
        group.bench_function(name, |b| {
            b.iter(|| black_box(state).advance(black_box(16_000_000), black_box(params)));
        });
    }
    group.finish();
}

fn bench_segment_lookup(c: &mut Criterion) {
    let mut breakpoints = vec![Breakpoint::min_limit(presets::standard())];
    for i in 0..64 {
        breakpoints.push(Breakpoint::new(
            BreakpointKey::named(format!("bp{i}")),
            i as f32,
            presets::standard(),
            Guarantee::None,
        ));
    }
    breakpoints.push(Breakpoint::max_limit(presets::standard()));
    let mappings = vec![Mapping::Identity; breakpoints.len() - 1];
    let spec = DirectionalMotionSpec::new(breakpoints, mappings).unwrap();

    c.bench_function("segment_at_input", |b| {
        b.iter(|| {
            spec.segment_at_input(black_box(31.5), black_box(InputDirection::Max))
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_spring_advance, bench_segment_lookup);
criterion_main!(benches);
