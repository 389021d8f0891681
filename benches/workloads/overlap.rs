use criterion::{black_box, BenchmarkId, Criterion};
use micrognn::{AnalyzerConfig, OverlapAnalyzer, OverlapMode, PartitionConfig, Partitioner};

use super::sampled_mini_batch;

pub fn run(c: &mut Criterion) {
    let mb = sampled_mini_batch(256, &[10, 10], 5_000);

    let mut group = c.benchmark_group("overlap");
    group.sample_size(10);
    for (mode, k) in [
        (OverlapMode::Fixed, 8),
        (OverlapMode::Exhaustive, 4),
        (OverlapMode::Exhaustive, 6),
    ] {
        let layers = Partitioner::new(PartitionConfig::new(k))
            .partition_layers(&mb)
            .unwrap();
        let analyzer = OverlapAnalyzer::new(AnalyzerConfig::new(mode));
        let name = format!("{mode:?}").to_lowercase();
        group.bench_with_input(BenchmarkId::new(name, k), &layers, |b, l| {
            b.iter(|| black_box(analyzer.analyze(black_box(l)).unwrap()));
        });
    }
    group.finish();
}
