use criterion::{criterion_group, criterion_main, Criterion};

mod workloads;

fn bench_main(c: &mut Criterion) {
    workloads::partition::run(c);
    workloads::prune::run(c);
    workloads::overlap::run(c);
    workloads::pipeline::run(c);
}

criterion_group!(benches, bench_main);
criterion_main!(benches);
