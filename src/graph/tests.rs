//! Tests for layered adjacency validation and relabeling.

use super::relabel::Relabeler;
use super::*;
use crate::error::StructuralViolation;

fn two_layer() -> (Vec<NodeId>, Vec<Adj>) {
    // 8 nodes, targets [0, 1]; inner sources 0..6, outer sources 0..8.
    let outer = Adj::new([(3, 1), (4, 1), (6, 3), (7, 4), (3, 2), (6, 5)], (8, 6));
    let inner = Adj::new([(2, 0), (5, 0), (3, 1), (4, 1)], (6, 2));
    ((0..8).collect(), vec![outer, inner])
}

#[test]
fn test_valid_batch() {
    let (n_id, adjs) = two_layer();
    let batch = Batch::new(n_id, 2, adjs).unwrap();
    assert_eq!(batch.layer_count(), 2);
    assert_eq!(batch.targets(), &[0, 1]);
    assert_eq!(batch.layer_nodes(0), &[0, 1, 2, 3, 4, 5]);
    assert_eq!(batch.layer_nodes(1), &[0, 1]);
}

#[test]
fn test_from_columns_checks_lengths() {
    let adj = Adj::from_columns(vec![2, 3], vec![0, 1], (4, 2)).unwrap();
    assert_eq!(adj.edge_pairs(), vec![(2, 0), (3, 1)]);
    assert_eq!(
        Adj::from_columns(vec![2, 3], vec![0], (4, 2)),
        Err(StructuralViolation::ColumnLengths {
            sources: 2,
            targets: 1
        })
    );
}

#[test]
fn test_destination_out_of_range() {
    let adj = Adj::new([(1, 0), (2, 1)], (3, 1));
    assert_eq!(
        adj.validate(0),
        Err(StructuralViolation::DestinationOutOfRange {
            layer: 0,
            edge: 1,
            dst: 1,
            dst_count: 1
        })
    );
}

#[test]
fn test_source_out_of_range() {
    let adj = Adj::new([(3, 0)], (3, 1));
    assert!(matches!(
        adj.validate(2),
        Err(StructuralViolation::SourceOutOfRange { layer: 2, src: 3, .. })
    ));
}

#[test]
fn test_targets_must_prefix_sources() {
    let adj = Adj::new([], (2, 3));
    assert!(matches!(
        adj.validate(0),
        Err(StructuralViolation::TargetsNotPrefix { .. })
    ));
}

#[test]
fn test_layer_composition_violation() {
    let outer = Adj::new([(2, 0)], (4, 2));
    let inner = Adj::new([(2, 0)], (3, 1));
    let batch = Batch::new_unchecked(vec![0, 1, 2, 3], 1, vec![outer, inner]);
    assert_eq!(
        batch.validate(),
        Err(StructuralViolation::LayerComposition {
            layer: 1,
            src_count: 3,
            outer_dst_count: 2
        })
    );
}

#[test]
fn test_target_count_mismatch() {
    let (n_id, adjs) = two_layer();
    let err = Batch::new(n_id, 3, adjs).unwrap_err();
    assert!(matches!(
        err,
        crate::Error::Structural {
            violation: StructuralViolation::TargetCountMismatch { .. },
            ..
        }
    ));
}

#[test]
fn test_source_space_exceeds_nodes() {
    let (_, adjs) = two_layer();
    let batch = Batch::new_unchecked((0..7).collect(), 2, adjs);
    assert!(matches!(
        batch.validate(),
        Err(StructuralViolation::SourceSpaceExceedsNodes { node_count: 7, .. })
    ));
}

#[test]
fn test_empty_layers_rejected() {
    let batch = Batch::new_unchecked(vec![0], 1, Vec::new());
    assert_eq!(batch.validate(), Err(StructuralViolation::NoLayers));
}

#[test]
fn test_edge_id_count_checked() {
    let adj = Adj::new([(1, 0), (2, 0)], (3, 1)).with_edge_ids(vec![7]);
    assert!(matches!(
        adj.validate(0),
        Err(StructuralViolation::EdgeIdCount { ids: 1, edges: 2, .. })
    ));
}

#[test]
fn test_filtered_keeps_order_and_ids() {
    let adj = Adj::new([(1, 0), (2, 0), (3, 1), (4, 2)], (5, 3)).with_edge_ids(vec![10, 11, 12, 13]);
    let kept = adj.filtered(|_, dst| dst != 0);
    assert_eq!(kept.edge_pairs(), vec![(3, 1), (4, 2)]);
    assert_eq!(kept.edge_ids(), Some(&[12, 13][..]));
    assert_eq!(kept.size(), adj.size());
}

#[test]
fn test_relabeler_first_seen_order() {
    let mut r = Relabeler::new(10);
    assert_eq!(r.intern(7), 0);
    assert_eq!(r.intern(3), 1);
    assert_eq!(r.intern(7), 0);
    assert_eq!(r.get(3), Some(1));
    assert_eq!(r.get(4), None);
    assert_eq!(r.order(), &[7, 3]);

    r.clear();
    assert_eq!(r.len(), 0);
    assert_eq!(r.get(7), None);
    assert_eq!(r.intern(3), 0);
}
