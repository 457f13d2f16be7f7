//! Benchmarks for free reduction, equality and persistence.
//!
//! Every input is `g⁻¹ · e · g` for sampled `e` and `g`, so reduction has long
//! cancellations to find and equality compares structurally different DAGs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use free_group_slp::{Endomorphism, UniformAutomorphismSlpGenerator};

const RANK: i32 = 3;

fn conjugated(size: usize) -> (Endomorphism, Endomorphism) {
    let mut generator = UniformAutomorphismSlpGenerator::with_seed(RANK, 7);
    let e: Endomorphism = Endomorphism::composition_generated(size, || generator.generate());
    let c = e
        .conjugate_with_generated(size, || generator.generate())
        .unwrap();
    (e, c)
}

/// Benchmarks `free_reduction` of a conjugated automorphism.
fn bench_free_reduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("free_reduction");
    for size in [50usize, 200, 800] {
        let (_, conj) = conjugated(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &conj, |b, conj| {
            b.iter(|| black_box(conj.free_reduction().slp_vertices_num()));
        });
    }
    group.finish();
}

/// Benchmarks equality against a structurally different but equal endomorphism.
fn bench_equality(c: &mut Criterion) {
    let (_, conj) = conjugated(400);
    let reduced = conj.free_reduction();
    let again = reduced.free_reduction();
    c.bench_function("equality_reduced_400", |b| {
        b.iter(|| assert!(black_box(&reduced) == black_box(&again)));
    });
    c.bench_function("is_identity_400", |b| {
        b.iter(|| black_box(conj.is_identity()));
    });
}

/// Benchmarks the text layout round trip.
fn bench_save_load(c: &mut Criterion) {
    let (e, _) = conjugated(1_000);
    let mut text = Vec::new();
    e.save_to(&mut text).unwrap();
    c.bench_function("save_1000", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(text.len());
            e.save_to(black_box(&mut out)).unwrap();
            black_box(out.len())
        });
    });
    c.bench_function("load_1000", |b| {
        b.iter(|| {
            let loaded: Endomorphism = Endomorphism::load_from(&mut black_box(text.as_slice())).unwrap();
            black_box(loaded.slp().node_count())
        });
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_free_reduction, bench_equality, bench_save_load
);
criterion_main!(benches);
