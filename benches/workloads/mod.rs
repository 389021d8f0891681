pub mod overlap;
pub mod partition;
pub mod pipeline;
pub mod prune;

use std::collections::HashMap;

use micrognn::{Adj, Batch, Embeddings, NodeId};

/// Deterministic stand-in for a neighbor sampler.
///
/// Targets get global ids `0..targets`; every hop draws `fanout` neighbors per node from
/// `0..id_space`, so small id spaces produce heavy overlap between targets.
pub fn sampled_mini_batch(targets: usize, fanouts: &[usize], id_space: usize) -> Batch {
    let mut n_id: Vec<NodeId> = (0..targets).collect();
    let mut local: HashMap<NodeId, usize> = n_id.iter().map(|&g| (g, g)).collect();
    let mut adjs = Vec::with_capacity(fanouts.len());

    for (hop, &fanout) in fanouts.iter().enumerate() {
        let dst_count = n_id.len();
        let mut edges = Vec::with_capacity(dst_count * fanout);
        for d in 0..dst_count {
            for j in 0..fanout {
                let g = (n_id[d] * 31 + j * 17 + hop * 7 + 1) % id_space;
                let next = n_id.len();
                let src = *local.entry(g).or_insert_with(|| {
                    n_id.push(g);
                    next
                });
                edges.push((src, d));
            }
        }
        adjs.push(Adj::new(edges, (n_id.len(), dst_count)));
    }
    adjs.reverse();
    Batch::new(n_id, targets, adjs).expect("sampler output is well-formed")
}

/// One row per node, `dim` wide.
pub fn features(rows: usize, dim: usize) -> Embeddings {
    let data = (0..rows * dim).map(|i| (i % 97) as f32 * 0.01).collect();
    Embeddings::from_vec(data, rows, dim).expect("length matches shape")
}
