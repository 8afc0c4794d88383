//! Scenario-level benchmarks wrapping the synthetic game world: one "frame" of feature dispatch
//! plus joined-iteration movement, measured at a few representative population sizes, and a
//! driver-selection comparison showing why the joined-iteration contract picks the smallest/rarest
//! type as the driver rather than leaving the choice to chance.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use rusty_ecs::Registry;
use rusty_ecs::aspect::Aspect;

use rusty_ecs_bench::components::{Position, Projectile, Velocity};
use rusty_ecs_bench::scenarios::{GameWorldConfig, GameWorldScenario, Scenario};

fn bench_game_world_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("game_world_frame");

    let configs = [
        ("small", GameWorldConfig { npc_count: 1_000, scenery_count: 200, projectile_count: 100, seed: 7 }),
        ("default", GameWorldConfig::default()),
        ("large", GameWorldConfig { npc_count: 40_000, scenery_count: 5_000, projectile_count: 2_000, seed: 7 }),
    ];

    for (label, config) in configs {
        let mut scenario = GameWorldScenario::with_config(config);
        scenario.setup();
        group.throughput(Throughput::Elements(scenario.entity_count() as u64));

        group.bench_with_input(BenchmarkId::new("update", label), &(), |b, _| {
            b.iter(|| scenario.update());
        });
    }

    group.finish();
}

/// Joined iteration over `(Position, Velocity)` driven by `Position` (the populous type, present
/// on every entity) vs. driven by `Projectile` (the rare tag, present on a small minority). The
/// contract's leftmost-type-is-driver rule means callers pay for this choice; this benchmark makes
/// the cost of getting it backwards visible rather than leaving it as a hidden footgun.
fn bench_driver_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("driver_selection");

    let npc_count = 50_000;
    let projectile_count = 500;

    let registry = Registry::new();
    for _ in 0..npc_count {
        registry.fill_entity().component(Position::default()).component(Velocity::default()).build();
    }
    for _ in 0..projectile_count {
        registry
            .fill_entity()
            .component(Position::default())
            .component(Velocity::default())
            .component(Projectile)
            .build();
    }

    group.throughput(Throughput::Elements((npc_count + projectile_count) as u64));

    group.bench_function("driven_by_populous_position", |b| {
        b.iter(|| {
            let mut count = 0usize;
            Aspect::<(Position, Velocity)>::for_joined_components(
                &registry,
                |_, _| count += 1,
                rusty_ecs::option::Always,
            );
            criterion::black_box(count);
        });
    });

    group.bench_function("driven_by_rare_projectile", |b| {
        b.iter(|| {
            let mut count = 0usize;
            Aspect::<(Projectile, Position, Velocity)>::for_joined_components(
                &registry,
                |_, _| count += 1,
                rusty_ecs::option::Always,
            );
            criterion::black_box(count);
        });
    });

    group.finish();
}

criterion_group!(scenarios, bench_game_world_frame, bench_driver_selection);
criterion_main!(scenarios);
