use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use micrognn::{PartitionConfig, Partitioner};

use super::sampled_mini_batch;

pub fn run(c: &mut Criterion) {
    let mb = sampled_mini_batch(512, &[10, 10], 50_000);
    let edges: usize = mb.adjs().iter().map(|a| a.edge_count()).sum();

    let mut group = c.benchmark_group("partition");
    group.throughput(Throughput::Elements(edges as u64));
    for k in [1, 4, 16] {
        let partitioner = Partitioner::new(PartitionConfig::new(k));
        group.bench_with_input(BenchmarkId::new("nano_batches", k), &partitioner, |b, p| {
            b.iter(|| black_box(p.partition(black_box(&mb)).unwrap()));
        });
    }
    group.finish();
}
