//! Per-layer embedding caches.
//!
//! A [`History`] remembers the layer output of every node that an earlier nano-batch of
//! the same mini-batch already produced. It is a dense table with one row per node of the
//! mini-batch, addressed through a shared [`NodeSlots`] table:
//!
//! - `slots`: global id -> row slot; ids the mini-batch does not hold have none
//! - `emb`: `capacity x dim` row-major embedding storage
//! - `presence`: one flag per slot; a row is only ever read while its flag is set
//!
//! Lifecycle: created empty at the start of a mini-batch, mutated by [`History::push`]
//! while its nano-batches execute, then reset or dropped before the next mini-batch.
//! A [`HistoryStack`] groups the caches of all intermediate layers of one mini-batch.
//!
//! Every operation validates its whole input before touching the table, so a failed call
//! leaves the cache exactly as it was.

pub mod embeddings;
pub mod presence;
pub mod slots;

pub use embeddings::Embeddings;
pub use presence::PresenceBits;
pub use slots::NodeSlots;

use std::sync::Arc;

use crate::error::{
    CacheConsistencyError, Component, ConfigurationError, Error, Result, StructuralViolation,
};
use crate::graph::{Batch, NodeId};

/// Embedding cache of one intermediate layer.
///
/// ### Performance Characteristics
/// | Operation | Complexity |
/// |-----------|------------|
/// | `pull` | \(O(n \cdot d)\) for `n` ids of width `d` |
/// | `push` | \(O(n \cdot d)\) |
/// | `reset` | \(O(\text{capacity} / 64)\) |
/// | `is_cached` | \(O(1)\) expected |
#[derive(Debug, Clone)]
pub struct History {
    emb: Vec<f32>,
    dim: usize,
    presence: PresenceBits,
    slots: Arc<NodeSlots>,
}

impl History {
    /// Creates an empty cache for the distinct ids of `nodes`, holding rows of width `dim`.
    ///
    /// # Errors
    /// Returns [`CacheConsistencyError::StorageOverflow`] if `nodes x dim` overflows.
    pub fn new(nodes: impl IntoIterator<Item = NodeId>, dim: usize) -> Result<Self> {
        Self::with_slots(Arc::new(NodeSlots::new(nodes)), dim)
    }

    /// Creates an empty cache over an existing slot table.
    ///
    /// # Errors
    /// As [`History::new`].
    pub fn with_slots(slots: Arc<NodeSlots>, dim: usize) -> Result<Self> {
        let len = slots.len().checked_mul(dim).ok_or_else(|| {
            Error::cache(
                Component::History,
                CacheConsistencyError::StorageOverflow {
                    nodes: slots.len(),
                    dim,
                },
            )
        })?;
        Ok(Self {
            emb: vec![0.0; len],
            dim,
            presence: PresenceBits::new(slots.len()),
            slots,
        })
    }

    /// Number of distinct ids the cache covers.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The global-id to slot table.
    #[inline]
    pub fn slots(&self) -> &NodeSlots {
        &self.slots
    }

    /// Embedding width.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of ids currently cached.
    #[inline]
    pub fn cached_count(&self) -> usize {
        self.presence.count()
    }

    /// Returns `true` if `node` has a cached embedding.
    #[inline]
    pub fn is_cached(&self, node: NodeId) -> bool {
        self.slots
            .slot(node)
            .is_some_and(|slot| self.presence.contains(slot))
    }

    /// Cached global ids in ascending order.
    pub fn cached_nodes(&self) -> impl Iterator<Item = NodeId> {
        let nodes = self.slots.nodes();
        let mut cached: Vec<NodeId> = self.presence.iter().map(|slot| nodes[slot]).collect();
        cached.sort_unstable();
        cached.into_iter()
    }

    /// Returns the cached embedding of `node`, if present.
    pub fn get(&self, node: NodeId) -> Option<&[f32]> {
        let slot = self.slots.slot(node)?;
        self.presence.contains(slot).then(|| self.row(slot))
    }

    #[inline]
    fn row(&self, slot: usize) -> &[f32] {
        &self.emb[slot * self.dim..(slot + 1) * self.dim]
    }

    /// Overwrites row `i` of `features` with the cached embedding of `node_ids[i]` for
    /// every id that is cached. Other rows are left untouched; the cache is not modified.
    ///
    /// Returns the number of rows replaced.
    ///
    /// # Errors
    /// Fails without touching `features` if the row count differs from `node_ids.len()`,
    /// the widths differ, or an id has no slot in the cache.
    pub fn pull(&self, features: &mut Embeddings, node_ids: &[NodeId]) -> Result<usize> {
        let slots = self.check(features, node_ids)?;
        let mut pulled = 0;
        for (row, slot) in slots.into_iter().enumerate() {
            if self.presence.contains(slot) {
                features.row_mut(row).copy_from_slice(self.row(slot));
                pulled += 1;
            }
        }
        Ok(pulled)
    }

    /// Stores row `i` of `features` under `node_ids[i]` and marks it cached, for every `i`.
    ///
    /// With duplicate ids the last occurrence wins.
    ///
    /// # Errors
    /// Fails without modifying the cache under the same conditions as [`History::pull`].
    pub fn push(&mut self, features: &Embeddings, node_ids: &[NodeId]) -> Result<()> {
        let slots = self.check(features, node_ids)?;
        for (row, slot) in slots.into_iter().enumerate() {
            self.emb[slot * self.dim..(slot + 1) * self.dim].copy_from_slice(features.row(row));
            self.presence.insert(slot);
        }
        tracing::trace!(nodes = node_ids.len(), cached = self.cached_count(), "history push");
        Ok(())
    }

    /// Clears every presence flag. Stored rows become unreachable.
    pub fn reset(&mut self) {
        self.presence.clear();
    }

    /// Validates a pull or push and resolves the slot of every id.
    fn check(&self, features: &Embeddings, node_ids: &[NodeId]) -> Result<Vec<usize>> {
        if features.rows() != node_ids.len() {
            return Err(Error::structural(
                Component::History,
                StructuralViolation::FeatureRows {
                    rows: features.rows(),
                    expected: node_ids.len(),
                },
            ));
        }
        if features.dim() != self.dim {
            return Err(Error::cache(
                Component::History,
                CacheConsistencyError::DimensionMismatch {
                    got: features.dim(),
                    expected: self.dim,
                },
            ));
        }
        node_ids
            .iter()
            .map(|&node| {
                self.slots.slot(node).ok_or_else(|| {
                    Error::cache(
                        Component::History,
                        CacheConsistencyError::UnknownNode {
                            node,
                            capacity: self.capacity(),
                        },
                    )
                })
            })
            .collect()
    }
}

/// The caches of every intermediate layer of one mini-batch.
///
/// `stack[i]` caches the output of layer `i`; the final layer has no cache.
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    layers: Vec<History>,
}

impl HistoryStack {
    /// Creates one empty cache per entry of `dims`, all sharing one slot table over the
    /// distinct ids of `nodes`.
    ///
    /// # Errors
    /// Returns [`CacheConsistencyError::StorageOverflow`] if a cache's storage size
    /// overflows.
    pub fn new(nodes: &[NodeId], dims: &[usize]) -> Result<Self> {
        let slots = Arc::new(NodeSlots::new(nodes.iter().copied()));
        let layers = dims
            .iter()
            .map(|&d| History::with_slots(Arc::clone(&slots), d))
            .collect::<Result<_>>()?;
        Ok(Self { layers })
    }

    /// Creates the caches for `mini_batch`: one per intermediate layer, each holding one
    /// row per node of the mini-batch.
    ///
    /// # Errors
    /// Returns a configuration error unless `hidden_dims` has exactly one entry per
    /// intermediate layer, and propagates [`HistoryStack::new`] failures.
    pub fn for_mini_batch(mini_batch: &Batch, hidden_dims: &[usize]) -> Result<Self> {
        let layers = mini_batch.layer_count().saturating_sub(1);
        if hidden_dims.len() != layers {
            return Err(Error::configuration(
                Component::History,
                ConfigurationError::HiddenDims {
                    dims: hidden_dims.len(),
                    layers,
                },
            ));
        }
        Self::new(mini_batch.n_id(), hidden_dims)
    }

    /// Number of caches.
    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if there are no caches (single-layer models).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Caches as a slice, outer layer first.
    #[inline]
    pub fn as_slice(&self) -> &[History] {
        &self.layers
    }

    /// Caches as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [History] {
        &mut self.layers
    }

    /// Cache of `layer`, if that layer is cached.
    #[inline]
    pub fn get(&self, layer: usize) -> Option<&History> {
        self.layers.get(layer)
    }

    /// Resets every cache.
    pub fn reset_all(&mut self) {
        for h in &mut self.layers {
            h.reset();
        }
    }
}
