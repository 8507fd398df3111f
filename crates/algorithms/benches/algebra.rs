//! Benchmarks for voxel algebra kernels

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use volalg_algorithms::algebra::{add, divide, log, power};
use volalg_algorithms::threshold::{threshold, ThresholdParams};
use volalg_core::{Volume, VolumeGeometry};

fn create_volume(size: usize, base: f64) -> Volume<f64> {
    let mut v = Volume::new(&[size, size, size]);
    v.set_geometry(VolumeGeometry::new([0.0; 3], [0.8, 0.8, 1.5]));
    for (i, voxel) in v.data_mut().iter_mut().enumerate() {
        *voxel = base + (i * 7 % 200) as f64;
    }
    v
}

fn bench_binary(c: &mut Criterion) {
    let mut group = c.benchmark_group("algebra/binary");
    for size in [32, 64, 128] {
        let a = create_volume(size, 100.0);
        let b = create_volume(size, 50.0);
        group.bench_with_input(BenchmarkId::new("add", size), &size, |bench, _| {
            bench.iter(|| add(black_box(&a), black_box(&b)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("divide", size), &size, |bench, _| {
            bench.iter(|| divide(black_box(&a), black_box(&b)).unwrap())
        });
    }
    group.finish();
}

fn bench_unary(c: &mut Criterion) {
    let mut group = c.benchmark_group("algebra/unary");
    for size in [32, 64, 128] {
        let a = create_volume(size, 1.0);
        group.bench_with_input(BenchmarkId::new("power3", size), &size, |bench, _| {
            bench.iter(|| power(black_box(&a), 3.0).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("log", size), &size, |bench, _| {
            bench.iter(|| log(black_box(&a)).unwrap())
        });
    }
    group.finish();
}

fn bench_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("threshold");
    for size in [32, 64, 128] {
        let a = create_volume(size, 0.0);
        let params = ThresholdParams::default();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, _| {
            bench.iter(|| threshold(black_box(&a), &params).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_binary, bench_unary, bench_threshold);
criterion_main!(benches);
