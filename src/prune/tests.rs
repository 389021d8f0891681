//! Tests for computation-graph pruning.

use super::*;
use crate::history::Embeddings;

fn cached(capacity: usize, nodes: &[NodeId]) -> History {
    let mut h = History::new(0..capacity, 2).unwrap();
    h.push(&Embeddings::zeros(nodes.len(), 2), nodes).unwrap();
    h
}

#[test]
fn test_prune_drops_edges_into_cached_destinations() {
    // Presence [F, F, T, T, F].
    let h = cached(5, &[2, 3]);
    let nb = Batch::new(
        vec![0, 1, 2, 3, 4],
        1,
        vec![
            Adj::new([(1, 0), (2, 0), (3, 1), (4, 2)], (5, 3)),
            Adj::new([(1, 0), (2, 0)], (3, 1)),
        ],
    )
    .unwrap();

    let pruned = prune_computation_graph(&nb, std::slice::from_ref(&h)).unwrap();
    assert_eq!(pruned[0].edge_pairs(), vec![(1, 0), (2, 0), (3, 1)]);
    assert_eq!(pruned[1].edge_pairs(), vec![(1, 0), (2, 0)]);
}

#[test]
fn test_prune_maps_destinations_through_global_ids() {
    // Nodes 2 and 3 of global ids 0..8 are cached.
    let h = cached(8, &[2, 3]);
    let nb = Batch::new(
        vec![1, 3, 4, 6, 7],
        1,
        vec![
            Adj::new([(1, 0), (2, 0), (3, 1), (4, 2)], (5, 3)),
            Adj::new([(1, 0), (2, 0)], (3, 1)),
        ],
    )
    .unwrap();

    let pruned = prune_computation_graph(&nb, &[h]).unwrap();
    assert_eq!(pruned[0].edge_pairs(), vec![(1, 0), (2, 0), (4, 2)]);
    assert_eq!(pruned[1].edge_pairs(), vec![(1, 0), (2, 0)]);
}

#[test]
fn test_prune_keeps_size_and_edge_ids() {
    let h = cached(5, &[0]);
    let adj = Adj::new([(1, 0), (2, 1), (3, 1)], (4, 2)).with_edge_ids(vec![5, 6, 7]);
    let kept = prune_layer(&adj, &[0, 1, 2, 3], &h).unwrap();
    assert_eq!(kept.edge_pairs(), vec![(2, 1), (3, 1)]);
    assert_eq!(kept.edge_ids(), Some(&[6, 7][..]));
    assert_eq!(kept.size(), adj.size());
}

#[test]
fn test_prune_without_histories_is_identity() {
    let nb = Batch::new(
        vec![0, 1, 2],
        1,
        vec![Adj::new([(1, 0), (2, 0)], (3, 1))],
    )
    .unwrap();
    let pruned = prune_computation_graph(&nb, &[]).unwrap();
    assert_eq!(pruned, nb.adjs());
}

#[test]
fn test_too_many_histories() {
    let nb = Batch::new(
        vec![0, 1, 2],
        1,
        vec![Adj::new([(1, 0), (2, 0)], (3, 1))],
    )
    .unwrap();
    let err = prune_computation_graph(&nb, &[History::new(0..3, 2).unwrap()]).unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration {
            component: Component::Pruner,
            problem: ConfigurationError::TooManyHistories { histories: 1, layers: 0 },
        }
    ));
}

#[test]
fn test_destination_without_history_slot() {
    let h = History::new(0..4, 2).unwrap();
    let nb = Batch::new(
        vec![9, 1, 2],
        1,
        vec![
            Adj::new([(1, 0), (2, 1)], (3, 2)),
            Adj::new([(1, 0)], (2, 1)),
        ],
    )
    .unwrap();
    let err = prune_computation_graph(&nb, &[h]).unwrap_err();
    assert!(matches!(
        err,
        Error::CacheConsistency {
            component: Component::Pruner,
            problem: CacheConsistencyError::UnknownNode { node: 9, capacity: 4 },
        }
    ));
}

#[test]
fn test_malformed_batch_rejected() {
    let nb = Batch::new_unchecked(
        vec![0, 1, 2],
        1,
        vec![
            Adj::new([(1, 5)], (3, 2)),
            Adj::new([(1, 0)], (2, 1)),
        ],
    );
    let err = prune_computation_graph(&nb, &[History::new(0..3, 2).unwrap()]).unwrap_err();
    assert!(matches!(
        err,
        Error::Structural {
            component: Component::Pruner,
            violation: StructuralViolation::DestinationOutOfRange { dst: 5, .. },
        }
    ));
}

#[test]
fn test_prune_with_large_global_ids() {
    let ids = [40_000_000, 12_000_001, usize::MAX, 7];
    let mut h = History::new(ids, 2).unwrap();
    h.push(&Embeddings::zeros(1, 2), &[usize::MAX]).unwrap();
    let nb = Batch::new(
        ids.to_vec(),
        1,
        vec![
            Adj::new([(1, 0), (2, 0), (3, 1), (3, 2)], (4, 3)),
            Adj::new([(1, 0), (2, 0)], (3, 1)),
        ],
    )
    .unwrap();

    let pruned = prune_computation_graph(&nb, &[h]).unwrap();
    assert_eq!(pruned[0].edge_pairs(), vec![(1, 0), (2, 0), (3, 1)]);
}
