//! Nano-batch partitioning.
//!
//! A [`Partitioner`] splits a mini-batch's targets into contiguous chunks and rebuilds, for
//! every chunk, the self-consistent layered neighborhood needed to compute it:
//!
//! 1. the chunk's targets become local ids `0..t`;
//! 2. layers are walked innermost to outermost; at each layer the current node set is the
//!    destination set, edges into it are kept and unseen sources are appended in edge order;
//! 3. the node-id sequence of the result holds **global** ids, so history caches keyed by
//!    global id stay valid across nano-batches.
//!
//! Relabeling goes through a reusable flat arena (see `graph::relabel`), so each nano-batch
//! costs \(O(\text{nodes} + \text{edges})\) of the parent.
//!
//! ```
//! use micrognn::{Adj, Batch, PartitionConfig, Partitioner};
//!
//! // Targets 0 and 1, each with its own two neighbors.
//! let mb = Batch::new(
//!     vec![10, 11, 12, 13, 14, 15],
//!     2,
//!     vec![Adj::new([(2, 0), (3, 0), (4, 1), (5, 1)], (6, 2))],
//! )
//! .unwrap();
//!
//! let nano = Partitioner::new(PartitionConfig::new(2)).partition(&mb).unwrap();
//! assert_eq!(nano[1].batch().n_id(), &[11, 14, 15]);
//! assert_eq!(nano[1].batch().adjs()[0].edge_pairs(), vec![(1, 0), (2, 0)]);
//! ```

use core::ops::Range;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

use crate::config::{NanoBatchOrder, PartitionConfig, RemainderPolicy};
use crate::error::{Component, ConfigurationError, Error, Result};
use crate::graph::relabel::Relabeler;
use crate::graph::{Adj, AdjSize, Batch, MiniBatch, NodeId};

/// One nano-batch of a mini-batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NanoBatch {
    index: usize,
    targets: Range<usize>,
    parent_rows: Vec<usize>,
    batch: Batch,
}

impl NanoBatch {
    /// Position of this nano-batch's target chunk within the mini-batch.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The mini-batch target positions this nano-batch computes.
    #[inline]
    pub fn target_range(&self) -> Range<usize> {
        self.targets.clone()
    }

    /// For every local id, the mini-batch local id it was taken from.
    #[inline]
    pub fn parent_rows(&self) -> &[usize] {
        &self.parent_rows
    }

    /// The relabeled neighborhood; its node ids are global.
    #[inline]
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Consumes the nano-batch, returning its neighborhood.
    pub fn into_batch(self) -> Batch {
        self.batch
    }
}

/// Explicit per-layer breakdown of a nano-batch: for every layer, the global ids whose
/// layer output the nano-batch must produce.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayerNodes {
    layers: Vec<Vec<NodeId>>,
}

impl LayerNodes {
    /// Wraps per-layer id lists, outer layer first.
    pub fn new(layers: Vec<Vec<NodeId>>) -> Self {
        Self { layers }
    }

    /// Extracts the breakdown of `batch`.
    ///
    /// # Errors
    /// Returns a structural error if `batch` is malformed.
    pub fn from_batch(batch: &Batch) -> Result<Self> {
        batch
            .validate()
            .map_err(|v| Error::structural(Component::Partitioner, v))?;
        Ok(Self {
            layers: (0..batch.layer_count())
                .map(|l| batch.layer_nodes(l).to_vec())
                .collect(),
        })
    }

    /// Number of layers.
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Ids of `layer`.
    #[inline]
    pub fn layer(&self, layer: usize) -> &[NodeId] {
        &self.layers[layer]
    }
}

/// Splits mini-batches into nano-batches.
#[derive(Debug, Clone, Default)]
pub struct Partitioner {
    config: PartitionConfig,
}

impl Partitioner {
    /// Creates a partitioner.
    pub fn new(config: PartitionConfig) -> Self {
        Self { config }
    }

    /// The partitioner's configuration.
    #[inline]
    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Splits `0..target_count` into the configured number of contiguous chunks.
    ///
    /// # Errors
    /// Fails if the nano-batch count is zero or larger than `target_count`, or if the
    /// division is uneven under [`RemainderPolicy::Strict`].
    pub fn target_chunks(&self, target_count: usize) -> Result<Vec<Range<usize>>> {
        let k = self.config.num_nano_batches;
        if k == 0 {
            return Err(config_error(ConfigurationError::ZeroNanoBatches));
        }
        if k > target_count {
            return Err(config_error(ConfigurationError::TooManyNanoBatches {
                nano_batches: k,
                targets: target_count,
            }));
        }

        let base = target_count / k;
        let remainder = target_count % k;
        let last_end = match self.config.remainder {
            RemainderPolicy::Strict if remainder != 0 => {
                return Err(config_error(ConfigurationError::UnevenTargets {
                    targets: target_count,
                    nano_batches: k,
                }));
            }
            RemainderPolicy::Truncate => {
                if remainder != 0 {
                    tracing::warn!(dropped = remainder, target_count, "truncating targets");
                }
                base * k
            }
            RemainderPolicy::LastAbsorbs | RemainderPolicy::Strict => target_count,
        };

        Ok((0..k)
            .map(|i| {
                let start = i * base;
                let end = if i + 1 == k { last_end } else { start + base };
                start..end
            })
            .collect())
    }

    /// Splits `mini_batch` into nano-batches, in the configured order.
    ///
    /// # Errors
    /// Fails with a structural error if `mini_batch` is malformed and with a configuration
    /// error under the conditions of [`Partitioner::target_chunks`]. Nothing is produced on
    /// failure.
    pub fn partition(&self, mini_batch: &MiniBatch) -> Result<Vec<NanoBatch>> {
        mini_batch
            .validate()
            .map_err(|v| Error::structural(Component::Partitioner, v))?;
        let chunks = self.target_chunks(mini_batch.target_count())?;

        let mut relabel = Relabeler::new(mini_batch.node_count());
        let mut out: Vec<NanoBatch> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, targets)| {
                let nb = extract(mini_batch, index, targets, &mut relabel);
                tracing::debug!(
                    index,
                    targets = nb.batch.target_count(),
                    nodes = nb.batch.node_count(),
                    edges = nb.batch.adjs().iter().map(Adj::edge_count).sum::<usize>(),
                    "built nano-batch"
                );
                nb
            })
            .collect();

        reorder(&mut out, self.config.order);
        Ok(out)
    }

    /// Layer-aware variant of [`Partitioner::partition`]: returns only the per-layer node
    /// breakdown of every nano-batch.
    ///
    /// # Errors
    /// As [`Partitioner::partition`].
    pub fn partition_layers(&self, mini_batch: &MiniBatch) -> Result<Vec<LayerNodes>> {
        self.partition(mini_batch)?
            .iter()
            .map(|nb| LayerNodes::from_batch(nb.batch()))
            .collect()
    }
}

/// Applies `order` to `items` in place.
///
/// `Shuffled` draws from a fresh `XorShiftRng` seeded with the given seed, so the same seed
/// always yields the same permutation.
pub fn reorder<T>(items: &mut [T], order: NanoBatchOrder) {
    match order {
        NanoBatchOrder::Given => {}
        NanoBatchOrder::Shuffled { seed } => {
            let mut rng = XorShiftRng::seed_from_u64(seed);
            items.shuffle(&mut rng);
        }
    }
}

fn config_error(problem: ConfigurationError) -> Error {
    Error::configuration(Component::Partitioner, problem)
}

/// Rebuilds the neighborhood of `targets` from a validated mini-batch.
fn extract(
    mini_batch: &MiniBatch,
    index: usize,
    targets: Range<usize>,
    relabel: &mut Relabeler,
) -> NanoBatch {
    relabel.clear();
    for t in targets.clone() {
        relabel.intern(t);
    }
    let target_count = relabel.len();

    let mut adjs = Vec::with_capacity(mini_batch.layer_count());
    for adj in mini_batch.adjs().iter().rev() {
        let dst_count = relabel.len();
        let mut sources = Vec::new();
        let mut dests = Vec::new();
        let mut ids = adj.edge_ids().map(|_| Vec::new());

        for (e, (src, dst)) in adj.edges().enumerate() {
            // Nodes appended while scanning this layer are sources only.
            let Some(local_dst) = relabel.get(dst).filter(|&d| d < dst_count) else {
                continue;
            };
            sources.push(relabel.intern(src));
            dests.push(local_dst);
            if let (Some(out), Some(all)) = (ids.as_mut(), adj.edge_ids()) {
                out.push(all[e]);
            }
        }

        adjs.push(Adj::from_parts(
            sources,
            dests,
            ids,
            AdjSize::new(relabel.len(), dst_count),
        ));
    }
    adjs.reverse();

    let parent_rows = relabel.order().to_vec();
    let n_id = parent_rows.iter().map(|&p| mini_batch.n_id()[p]).collect();

    NanoBatch {
        index,
        targets,
        parent_rows,
        batch: Batch::new_unchecked(n_id, target_count, adjs),
    }
}

#[cfg(test)]
mod tests;
