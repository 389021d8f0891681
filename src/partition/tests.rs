//! Tests for nano-batch partitioning.

use super::*;
use crate::error::StructuralViolation;

/// Eight nodes, global id == mini-batch local id, targets `[0, 1]`.
///
/// Inner hop: 0 <- {2, 5}, 1 <- {3, 4}.
/// Outer hop: 1 <- {3, 4}, 3 <- 6, 4 <- 7, 2 <- 3, 5 <- 6.
fn eight_node_mini_batch() -> MiniBatch {
    let outer = Adj::new([(3, 1), (4, 1), (6, 3), (7, 4), (3, 2), (6, 5)], (8, 6))
        .with_edge_ids(vec![100, 101, 102, 103, 104, 105]);
    let inner = Adj::new([(2, 0), (5, 0), (3, 1), (4, 1)], (6, 2));
    Batch::new((0..8).collect(), 2, vec![outer, inner]).unwrap()
}

#[test]
fn test_second_nano_batch_relabeling() {
    let nano = Partitioner::new(PartitionConfig::new(2))
        .partition(&eight_node_mini_batch())
        .unwrap();
    assert_eq!(nano.len(), 2);

    let nb = nano[1].batch();
    assert_eq!(nb.n_id(), &[1, 3, 4, 6, 7]);
    assert_eq!(nb.target_count(), 1);
    assert_eq!(nb.adjs()[0].edge_pairs(), vec![(1, 0), (2, 0), (3, 1), (4, 2)]);
    assert_eq!(nb.adjs()[0].size(), AdjSize::new(5, 3));
    assert_eq!(nb.adjs()[0].edge_ids(), Some(&[100, 101, 102, 103][..]));
    assert_eq!(nb.adjs()[1].edge_pairs(), vec![(1, 0), (2, 0)]);
    assert_eq!(nb.adjs()[1].size(), AdjSize::new(3, 1));
    assert_eq!(nano[1].parent_rows(), &[1, 3, 4, 6, 7]);
    assert_eq!(nano[1].target_range(), 1..2);
}

#[test]
fn test_first_nano_batch_relabeling() {
    let nano = Partitioner::new(PartitionConfig::new(2))
        .partition(&eight_node_mini_batch())
        .unwrap();

    let nb = nano[0].batch();
    assert_eq!(nb.n_id(), &[0, 2, 5, 3, 6]);
    assert_eq!(nb.adjs()[1].edge_pairs(), vec![(1, 0), (2, 0)]);
    assert_eq!(nb.adjs()[0].edge_pairs(), vec![(3, 1), (4, 2)]);
    assert_eq!(nb.adjs()[0].edge_ids(), Some(&[104, 105][..]));
}

#[test]
fn test_nano_batches_satisfy_prefix_invariant() {
    let mb = eight_node_mini_batch();
    for nb in Partitioner::new(PartitionConfig::new(2)).partition(&mb).unwrap() {
        let batch = nb.batch();
        batch.validate().unwrap();
        for adj in batch.adjs() {
            assert!(adj.targets().iter().all(|&d| d < adj.size().dst));
        }
    }
}

#[test]
fn test_single_nano_batch_reproduces_mini_batch_topology() {
    let mb = eight_node_mini_batch();
    let nano = Partitioner::new(PartitionConfig::new(1)).partition(&mb).unwrap();
    let nb = nano[0].batch();
    assert_eq!(nb.target_count(), 2);
    assert_eq!(nb.node_count(), 8);
    let total: usize = nb.adjs().iter().map(Adj::edge_count).sum();
    assert_eq!(total, 10);
}

#[test]
fn test_remainder_policies() {
    let last = Partitioner::new(PartitionConfig::new(3));
    assert_eq!(last.target_chunks(7).unwrap(), vec![0..2, 2..4, 4..7]);

    let trunc =
        Partitioner::new(PartitionConfig::new(3).with_remainder(RemainderPolicy::Truncate));
    assert_eq!(trunc.target_chunks(7).unwrap(), vec![0..2, 2..4, 4..6]);

    let strict =
        Partitioner::new(PartitionConfig::new(3).with_remainder(RemainderPolicy::Strict));
    assert_eq!(strict.target_chunks(6).unwrap(), vec![0..2, 2..4, 4..6]);
    assert!(matches!(
        strict.target_chunks(7),
        Err(Error::Configuration {
            component: Component::Partitioner,
            problem: ConfigurationError::UnevenTargets { targets: 7, nano_batches: 3 },
        })
    ));
}

#[test]
fn test_invalid_nano_batch_counts() {
    let zero = Partitioner::new(PartitionConfig::new(0));
    assert!(matches!(
        zero.partition(&eight_node_mini_batch()),
        Err(Error::Configuration {
            problem: ConfigurationError::ZeroNanoBatches,
            ..
        })
    ));

    let many = Partitioner::new(PartitionConfig::new(3));
    assert!(matches!(
        many.partition(&eight_node_mini_batch()),
        Err(Error::Configuration {
            problem: ConfigurationError::TooManyNanoBatches { nano_batches: 3, targets: 2 },
            ..
        })
    ));
}

#[test]
fn test_malformed_mini_batch_rejected() {
    let mb = Batch::new_unchecked(
        vec![0, 1, 2],
        1,
        vec![Adj::new([(1, 0), (2, 1)], (3, 1))],
    );
    let err = Partitioner::new(PartitionConfig::new(1))
        .partition(&mb)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Structural {
            component: Component::Partitioner,
            violation: StructuralViolation::DestinationOutOfRange { .. },
        }
    ));
}

#[test]
fn test_shuffled_order_is_seeded() {
    let n_id: Vec<NodeId> = (0..16).collect();
    let edges: Vec<(usize, usize)> = (0..8).map(|t| (t + 8, t)).collect();
    let mb = Batch::new(n_id, 8, vec![Adj::new(edges, (16, 8))]).unwrap();

    let cfg = PartitionConfig::new(8).with_order(NanoBatchOrder::Shuffled { seed: 12345 });
    let a: Vec<usize> = Partitioner::new(cfg.clone())
        .partition(&mb)
        .unwrap()
        .iter()
        .map(NanoBatch::index)
        .collect();
    let b: Vec<usize> = Partitioner::new(cfg)
        .partition(&mb)
        .unwrap()
        .iter()
        .map(NanoBatch::index)
        .collect();
    assert_eq!(a, b);

    let mut sorted = a.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..8).collect::<Vec<_>>());
}

#[test]
fn test_partition_layers_breakdown() {
    let layers = Partitioner::new(PartitionConfig::new(2))
        .partition_layers(&eight_node_mini_batch())
        .unwrap();
    assert_eq!(layers[0].layer_count(), 2);
    assert_eq!(layers[0].layer(0), &[0, 2, 5]);
    assert_eq!(layers[0].layer(1), &[0]);
    assert_eq!(layers[1].layer(0), &[1, 3, 4]);
    assert_eq!(layers[1].layer(1), &[1]);
}

#[test]
fn test_layer_nodes_of_malformed_batch() {
    let bad = Batch::new_unchecked(vec![0, 1], 3, vec![Adj::new([(1, 0)], (2, 3))]);
    assert!(matches!(
        LayerNodes::from_batch(&bad),
        Err(Error::Structural {
            component: Component::Partitioner,
            ..
        })
    ));
}

#[test]
fn test_reorder_given_is_identity() {
    let mut items = vec![1, 2, 3];
    reorder(&mut items, NanoBatchOrder::Given);
    assert_eq!(items, vec![1, 2, 3]);
}
