use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use micrognn::{run_mini_batches, MeanAggregator, PartitionConfig, Partitioner};

use super::{features, sampled_mini_batch};

pub fn run(c: &mut Criterion) {
    let batches: Vec<_> = (0..8)
        .map(|i| {
            let mb = sampled_mini_batch(128, &[10, 10], 20_000 + i * 1_000);
            let x = features(mb.node_count(), 16);
            (mb, x)
        })
        .collect();

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(batches.len() as u64));
    group.sample_size(10);
    for k in [1, 4] {
        let partitioner = Partitioner::new(PartitionConfig::new(k));
        group.bench_with_input(BenchmarkId::new("mini_batches", k), &partitioner, |b, p| {
            b.iter(|| black_box(run_mini_batches(&MeanAggregator, &batches, p, &[16]).unwrap()));
        });
    }
    group.finish();
}
