use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use micrognn::{prune_computation_graph, Embeddings, HistoryStack};

use super::sampled_mini_batch;

pub fn run(c: &mut Criterion) {
    let mb = sampled_mini_batch(512, &[10, 10, 10], 50_000);
    let edges: usize = mb.adjs().iter().map(|a| a.edge_count()).sum();

    let mut group = c.benchmark_group("prune");
    group.throughput(Throughput::Elements(edges as u64));
    // Cache every `stride`-th required node of each intermediate layer.
    for stride in [1, 2, 8] {
        let mut histories = HistoryStack::for_mini_batch(&mb, &[16, 16]).unwrap();
        for (layer, history) in histories.as_mut_slice().iter_mut().enumerate() {
            let ids: Vec<usize> = mb.layer_nodes(layer).iter().copied().step_by(stride).collect();
            history.push(&Embeddings::zeros(ids.len(), 16), &ids).unwrap();
        }
        group.bench_with_input(
            BenchmarkId::new("cached_every", stride),
            &histories,
            |b, h| {
                b.iter(|| black_box(prune_computation_graph(black_box(&mb), h.as_slice()).unwrap()));
            },
        );
    }
    group.finish();
}
