//! A node-id sequence, a target count and a layered adjacency.
//!
//! Mini-batches (as produced by a neighborhood sampler) and nano-batches (as produced by
//! the [`Partitioner`](crate::Partitioner)) share this shape.
//!
//! Layers are ordered outer hop first: `adjs[0]` is the farthest hop and `adjs[L - 1]`
//! connects the root (target) nodes to their direct neighbors.

use crate::error::{Component, Error, Result, StructuralViolation};
use crate::graph::adj::Adj;

/// Global node identifier.
pub type NodeId = usize;

/// A layered neighborhood around a set of target nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    n_id: Vec<NodeId>,
    target_count: usize,
    adjs: Vec<Adj>,
}

/// A sampled mini-batch.
pub type MiniBatch = Batch;

impl Batch {
    /// Builds a batch and validates its structure.
    ///
    /// # Errors
    /// Returns [`Error::Structural`] if the layered adjacency breaks the prefix or
    /// layer-composition invariants.
    pub fn new(n_id: Vec<NodeId>, target_count: usize, adjs: Vec<Adj>) -> Result<Self> {
        let batch = Self::new_unchecked(n_id, target_count, adjs);
        batch
            .validate()
            .map_err(|v| Error::structural(Component::Graph, v))?;
        Ok(batch)
    }

    /// Builds a batch without validating it.
    ///
    /// Consumers validate on entry, so an invalid batch is reported when it is used.
    pub fn new_unchecked(n_id: Vec<NodeId>, target_count: usize, adjs: Vec<Adj>) -> Self {
        Self {
            n_id,
            target_count,
            adjs,
        }
    }

    /// Node-id sequence; position is the local id.
    #[inline]
    pub fn n_id(&self) -> &[NodeId] {
        &self.n_id
    }

    /// Number of target (root) nodes; they occupy `n_id[..target_count]`.
    #[inline]
    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// Global ids of the target nodes.
    ///
    /// # Panics
    /// Panics if the target count exceeds the node count, which [`Batch::validate`] rejects.
    #[inline]
    pub fn targets(&self) -> &[NodeId] {
        &self.n_id[..self.target_count]
    }

    /// Layered adjacency, outer hop first.
    #[inline]
    pub fn adjs(&self) -> &[Adj] {
        &self.adjs
    }

    /// Number of layers.
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.adjs.len()
    }

    /// Number of nodes in the batch.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.n_id.len()
    }

    /// Global ids whose layer-`layer` output this batch produces.
    ///
    /// # Panics
    /// Panics if `layer >= self.layer_count()`, or if the layer's destination count exceeds
    /// the node count. A batch that passes [`Batch::validate`] never hits the latter.
    pub fn layer_nodes(&self, layer: usize) -> &[NodeId] {
        &self.n_id[..self.adjs[layer].size().dst]
    }

    /// Checks the prefix and layer-composition invariants.
    pub fn validate(&self) -> core::result::Result<(), StructuralViolation> {
        let Some(first) = self.adjs.first() else {
            return Err(StructuralViolation::NoLayers);
        };
        if first.size().src > self.n_id.len() {
            return Err(StructuralViolation::SourceSpaceExceedsNodes {
                layer: 0,
                src_count: first.size().src,
                node_count: self.n_id.len(),
            });
        }

        for (layer, adj) in self.adjs.iter().enumerate() {
            adj.validate(layer)?;
            if layer > 0 {
                let outer = self.adjs[layer - 1].size();
                if adj.size().src > outer.dst {
                    return Err(StructuralViolation::LayerComposition {
                        layer,
                        src_count: adj.size().src,
                        outer_dst_count: outer.dst,
                    });
                }
            }
        }

        let innermost = self.adjs[self.adjs.len() - 1].size();
        if innermost.dst != self.target_count {
            return Err(StructuralViolation::TargetCountMismatch {
                dst_count: innermost.dst,
                target_count: self.target_count,
            });
        }
        Ok(())
    }
}
