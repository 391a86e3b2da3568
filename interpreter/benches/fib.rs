use criterion::{criterion_group, criterion_main, Criterion};
use std::io;

fn benchmark(c: &mut Criterion) {
    let src = include_str!("../data/bench/fib.my");
    let mut sink = io::sink();

    c.bench_function("fib 20", |b| {
        b.iter(|| interpreter::run(src, &mut sink).unwrap())
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
