use std::io;

use criterion::{criterion_group, criterion_main, Criterion};

fn benchmark(c: &mut Criterion) {
    let src = include_str!("../data/bench/instances.my");
    let mut sink = io::sink();

    c.bench_function("instantiation", |b| {
        b.iter(|| interpreter::run(src, &mut sink).unwrap())
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark
}
criterion_main!(benches);
