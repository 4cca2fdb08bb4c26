//! Criterion benchmarks for ducking aggregation
//!
//! Run with: cargo bench -p sonance-manager

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sonance_config::SoundConfig;
use sonance_core::Property;
use sonance_io::{DeviceState, MemoryBackend};
use sonance_manager::{DuckingAggregator, OutputSignals, SoundManager};

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("ducking_recompute");

    for members in [1usize, 8, 64] {
        let mut aggregator = DuckingAggregator::new();
        let conditions: Vec<Property<bool>> =
            (0..members).map(|_| Property::new(false)).collect();
        for condition in &conditions {
            let id = condition.lazy_link(|_, _| {});
            aggregator.insert(condition.clone(), id);
        }
        let last = conditions[members - 1].clone();

        group.bench_with_input(BenchmarkId::new("members", members), &members, |b, _| {
            b.iter(|| {
                last.set(!last.get());
                black_box(aggregator.recompute())
            });
        });
    }

    group.finish();
}

fn bench_engine_toggle(c: &mut Criterion) {
    let manager = SoundManager::new(MemoryBackend::with_state(DeviceState::Running));
    manager
        .initialize(OutputSignals::new(), SoundConfig::default())
        .unwrap();
    let conditions: Vec<Property<bool>> = (0..16).map(|_| Property::new(false)).collect();
    for condition in &conditions {
        manager.add_ducking_property(condition).unwrap();
    }
    let toggled = conditions[7].clone();

    c.bench_function("engine_ducking_toggle_16", |b| {
        b.iter(|| {
            toggled.set(!toggled.get());
            black_box(manager.is_ducking())
        });
    });
}

criterion_group!(benches, bench_recompute, bench_engine_toggle);
criterion_main!(benches);
