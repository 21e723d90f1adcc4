//! Performance benchmarks for trajectory-deviation-lib
//!
//! Run with: cargo bench --package trajectory-deviation-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::sync::Arc;
use trajectory_deviation_lib::{
    EngineConfig, IndexAlgorithm, NearestPointIndex, Path, TrajectoryEngine,
};

/// Generate a winding test track around UTM-sized coordinates, one sample per ~0.5 m
fn generate_track(num_points: usize, lateral_offset: f64) -> Path {
    let samples = (0..num_points).map(|i| {
        let t = i as f64 * 0.5;
        let x = 500_000.0 + t;
        let y = 4_000_000.0 + 20.0 * (t / 40.0).sin() + lateral_offset;
        let heading = (0.5 * (t / 40.0).cos()).atan();
        (x, y, heading)
    });
    Path::from_samples(samples).unwrap()
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    group.sample_size(20);

    let reference = generate_track(50_000, 0.0);
    group.throughput(Throughput::Elements(reference.len() as u64));

    for algorithm in [
        IndexAlgorithm::RTree,
        IndexAlgorithm::Quadtree,
        IndexAlgorithm::Exhaustive,
    ] {
        group.bench_with_input(
            BenchmarkId::from_parameter(algorithm),
            &algorithm,
            |b, &algorithm| {
                b.iter(|| NearestPointIndex::build(&reference, algorithm).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_nearest_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest2");

    let reference = generate_track(50_000, 0.0);
    let query = generate_track(1_000, 1.5);
    group.throughput(Throughput::Elements(query.len() as u64));

    // Exhaustive search is O(N) per query and is left out at this size
    for algorithm in [IndexAlgorithm::RTree, IndexAlgorithm::Quadtree] {
        let index = NearestPointIndex::build(&reference, algorithm).unwrap();
        group.bench_function(BenchmarkId::from_parameter(algorithm), |b| {
            b.iter(|| {
                for point in query.points() {
                    std::hint::black_box(index.query_nearest2(point.position));
                }
            });
        });
    }

    group.finish();
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    group.sample_size(20);

    let reference = Arc::new(generate_track(50_000, 0.0));
    let query = generate_track(50_000, 0.8);
    group.throughput(Throughput::Elements(query.len() as u64));

    for parallel in [false, true] {
        let config = EngineConfig {
            parallel,
            ..EngineConfig::default()
        };
        let engine = TrajectoryEngine::new(config, reference.clone()).unwrap();
        let name = if parallel { "parallel" } else { "sequential" };
        group.bench_function(name, |b| {
            b.iter(|| engine.evaluate(&query));
        });
    }

    group.finish();
}

fn bench_engine_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    group.sample_size(20);

    // Dominated by index build and curvature smoothing
    let reference = Arc::new(generate_track(50_000, 0.0));
    group.throughput(Throughput::Elements(reference.len() as u64));
    group.bench_function("engine_50k", |b| {
        b.iter(|| TrajectoryEngine::new(EngineConfig::default(), reference.clone()).unwrap());
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_index_build,
    bench_nearest_queries,
    bench_evaluation,
    bench_engine_construction,
);

criterion_main!(benches);
