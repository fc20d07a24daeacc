use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use darwin_world::config::Config;
use darwin_world::simulation::SimulationEngine;
use darwin_world::world::Boundary;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn engine(width: usize, height: usize, population: usize, boundary: Boundary) -> SimulationEngine {
    let mut config = Config::default();
    config.world.width = width;
    config.world.height = height;
    config.world.jungle_ratio = 0.3;
    config.animal.initial_population = population;
    config.animal.start_energy = 400.0;
    config.grass.energy = 60.0;
    SimulationEngine::new(&config, boundary, Some(42))
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for (width, height, population) in [(10, 10, 20), (50, 50, 500), (100, 100, 2000)] {
        for boundary in [Boundary::Wrap, Boundary::Bounded] {
            let name = format!("{}x{}_{}_{}", width, height, population, boundary);
            group.bench_function(&name, |b| {
                b.iter_batched(
                    || engine(width, height, population, boundary),
                    |mut engine| {
                        for _ in 0..10 {
                            black_box(engine.tick());
                        }
                        engine
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut engine = engine(100, 100, 2000, Boundary::Wrap);
    for _ in 0..20 {
        engine.tick();
    }

    c.bench_function("snapshot_100x100", |b| b.iter(|| black_box(engine.snapshot())));
}

fn bench_grass_growing(c: &mut Criterion) {
    let engine = engine(100, 100, 0, Boundary::Wrap);
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    c.bench_function("grass_growing_100x100", |b| {
        b.iter_batched(
            || engine.map().clone(),
            |mut map| {
                for _ in 0..100 {
                    black_box(map.grass_growing(10.0, &mut rng));
                }
                map
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_tick, bench_snapshot, bench_grass_growing);
criterion_main!(benches);
