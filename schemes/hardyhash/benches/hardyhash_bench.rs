//! Benchmarks for hardyhash.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hardyhash::compose::CompositionCounts;
use hardyhash::keygen::build_subtree;
use hardyhash::node::wotscalc;
use hardyhash::params::{WOTS_DEPTH, WOTS_WEIGHT, WOTS_WIDTH};
use hardyhash::wots::{self, Encoding};

fn bench_wots(c: &mut Criterion) {
    let mut group = c.benchmark_group("wots");
    let secret = [17u8; 32];

    group.bench_function("keypair", |b| {
        b.iter(|| wotscalc(black_box(&secret), 0).unwrap())
    });

    let message = b"benchmark message";
    group.bench_function("sign", |b| {
        b.iter(|| {
            let mut w = wotscalc(&secret, 0).unwrap();
            w.sign(black_box(message)).unwrap()
        })
    });

    let mut w = wotscalc(&secret, 0).unwrap();
    let pk = w.public_key();
    let signature = w.sign(message).unwrap();
    group.bench_function("verify", |b| {
        b.iter(|| {
            wots::verify(
                Encoding::FixedWeight,
                black_box(&pk),
                message,
                &signature,
            )
        })
    });

    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    c.bench_function("composition_counts_build", |b| {
        b.iter(|| CompositionCounts::build(WOTS_WEIGHT, WOTS_WIDTH, black_box(WOTS_DEPTH)))
    });
}

fn bench_subtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("subtree");
    group.sample_size(10);
    let secret = [29u8; 32];

    group.bench_function("build_height_4", |b| {
        b.iter(|| build_subtree(black_box(secret), 4).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_wots, bench_compose, bench_subtree);
criterion_main!(benches);
