//! Computation-graph pruning against the history caches.
//!
//! When a destination node's layer-`i` output is already cached in `histories[i]`, it will
//! be served by [`History::pull`] instead of being aggregated, so every edge into it at
//! layer `i` is dead work. [`prune_computation_graph`] drops those edges and leaves
//! everything else untouched:
//!
//! - surviving edges keep their relative order and per-edge ids;
//! - size metadata is never shrunk, since pull/push still address the full local id space;
//! - the final layer (no history) passes through unchanged.
//!
//! Pruning only reads the caches.

use crate::error::{
    CacheConsistencyError, Component, ConfigurationError, Error, Result, StructuralViolation,
};
use crate::graph::{Adj, Batch, NodeId};
use crate::history::History;

/// Returns the layered adjacency of `batch` with every edge removed whose destination is
/// already cached in the history of its layer.
///
/// `histories[i]` belongs to layer `i` (outer hop first); layers without a history pass
/// through unmodified.
///
/// # Errors
/// - [`ConfigurationError::TooManyHistories`] if there are more histories than
///   non-terminal layers;
/// - a structural error if `batch` is malformed;
/// - [`CacheConsistencyError::UnknownNode`] if a destination's global id has no slot in
///   its history.
pub fn prune_computation_graph(batch: &Batch, histories: &[History]) -> Result<Vec<Adj>> {
    let non_terminal = batch.layer_count().saturating_sub(1);
    if histories.len() > non_terminal {
        return Err(Error::configuration(
            Component::Pruner,
            ConfigurationError::TooManyHistories {
                histories: histories.len(),
                layers: non_terminal,
            },
        ));
    }
    batch
        .validate()
        .map_err(|v| Error::structural(Component::Pruner, v))?;

    let mut pruned = Vec::with_capacity(batch.layer_count());
    for (layer, adj) in batch.adjs().iter().enumerate() {
        match histories.get(layer) {
            Some(history) => {
                let kept = prune_layer(adj, batch.n_id(), history)?;
                tracing::debug!(
                    layer,
                    kept = kept.edge_count(),
                    dropped = adj.edge_count() - kept.edge_count(),
                    "pruned layer"
                );
                pruned.push(kept);
            }
            None => pruned.push(adj.clone()),
        }
    }
    Ok(pruned)
}

/// Prunes a single layer: drops every edge whose destination, mapped to its global id
/// through `n_id`, is cached in `history`.
///
/// # Errors
/// Fails if a destination local id has no entry in `n_id`, or maps to a global id the
/// history holds no slot for.
pub fn prune_layer(adj: &Adj, n_id: &[NodeId], history: &History) -> Result<Adj> {
    for &dst in adj.targets() {
        let Some(&node) = n_id.get(dst) else {
            return Err(Error::structural(
                Component::Pruner,
                StructuralViolation::LocalIdOutOfRange {
                    local: dst,
                    node_count: n_id.len(),
                },
            ));
        };
        if history.slots().slot(node).is_none() {
            return Err(Error::cache(
                Component::Pruner,
                CacheConsistencyError::UnknownNode {
                    node,
                    capacity: history.capacity(),
                },
            ));
        }
    }
    Ok(adj.filtered(|_, dst| !history.is_cached(n_id[dst])))
}

#[cfg(test)]
mod tests;
