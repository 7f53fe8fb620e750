//! Benchmarks for batched meter effects.
//!
//! Compares the invariant, simple-increment and per-target paths, and the
//! cost of keeping an accounting ledger, over growing target counts.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use effect_engine::scripting::{OpType, Property};
use effect_engine::universe::{Planet, System};
use effect_engine::{
    AccountingLedger, ContentRegistry, Effect, EffectCause, EngineConfig, ExecutionFilter, MeterType,
    ObjectId, ObjectKind, PlanetSize, PlanetType, ScriptingContext, StarType, StarlanePathfinder,
    Universe, UniverseObject, ValueRef,
};

/// One system holding `planets` planets. Returns the universe and the planet ids.
fn populated(planets: usize) -> (Universe, Vec<ObjectId>) {
    let mut universe = Universe::new(EngineConfig::new(42));
    let system = universe.insert(UniverseObject::new(
        "Sol",
        0.0,
        0.0,
        ObjectKind::System(System::new(StarType::Yellow, 1)),
    ));
    let ids = (0..planets)
        .map(|i| {
            let planet = universe.insert(UniverseObject::new(
                format!("Planet {i}"),
                i as f64,
                0.0,
                ObjectKind::Planet(Planet::new(PlanetType::Terran, PlanetSize::Medium)),
            ));
            universe.add_to_system(system, planet);
            planet
        })
        .collect();
    (universe, ids)
}

fn effects() -> [(&'static str, Effect); 3] {
    [
        ("invariant", Effect::set_meter(MeterType::Industry, ValueRef::Constant(10.0))),
        ("simple_increment", Effect::increment_meter(MeterType::Industry, ValueRef::Constant(1.5))),
        (
            "per_target",
            Effect::set_meter(
                MeterType::Industry,
                ValueRef::operation(OpType::Plus, ValueRef::CurrentValue, ValueRef::target(Property::X)),
            ),
        ),
    ]
}

fn bench_paths(c: &mut Criterion) {
    let content = ContentRegistry::new();
    let cause = EffectCause::default();
    let mut group = c.benchmark_group("set_meter_batch");

    for size in [16usize, 256, 4096] {
        let (universe, targets) = populated(size);
        for (name, effect) in effects() {
            group.bench_with_input(BenchmarkId::new(name, size), &targets, |b, targets| {
                b.iter_batched(
                    || universe.clone(),
                    |mut universe| {
                        {
                            let mut ctx = ScriptingContext::new(&mut universe, &content, &StarlanePathfinder);
                            effect.execute_batch(&mut ctx, black_box(targets), &cause, None, ExecutionFilter::all());
                        }
                        universe
                    },
                    BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_accounting(c: &mut Criterion) {
    let content = ContentRegistry::new();
    let cause = EffectCause::default();
    let effect = Effect::increment_meter(MeterType::Industry, ValueRef::Constant(1.5));
    let (universe, targets) = populated(1024);

    c.bench_function("set_meter_batch_with_ledger_1024", |b| {
        b.iter_batched(
            || (universe.clone(), AccountingLedger::new()),
            |(mut universe, mut ledger)| {
                let mut ctx = ScriptingContext::new(&mut universe, &content, &StarlanePathfinder);
                effect.execute_batch(&mut ctx, black_box(&targets), &cause, Some(&mut ledger), ExecutionFilter::all());
                ledger
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_paths, bench_accounting);
criterion_main!(benches);
