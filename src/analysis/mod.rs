//! Overlap analysis of nano-batch sequences.
//!
//! For one mini-batch, the analyzer measures per layer how many of the node occurrences
//! across its nano-batches were already introduced by an earlier nano-batch. Those are the
//! nodes a [`History`](crate::History) can serve instead of recomputing.
//!
//! - **Fixed**: the supplied order (optionally reshuffled by a seed).
//! - **Exhaustive**: every permutation, recording the smallest and largest redundant count
//!   per layer. Factorial in the nano-batch count; a diagnostic, not a training-time tool.
//!   With the `parallel` feature the permutation space is split across rayon workers.
//!
//! The analyzer is purely observational: it only reads node-id lists.

pub mod permutation;
pub mod stats;

pub use stats::{LayerReport, OverlapAccumulator, OverlapReport, Summary};

use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{AnalyzerConfig, OverlapMode};
use crate::error::{Component, ConfigurationError, Error, Result, StructuralViolation};
use crate::graph::{Batch, MiniBatch, NodeId};
use crate::history::PresenceBits;
use crate::partition::{reorder, LayerNodes, NanoBatch, Partitioner};

use permutation::{factorial, nth_permutation};

/// Anything that exposes, per layer, the global ids whose layer output it must produce.
pub trait LayerNodeSource {
    /// Checks that every layer's id list can be taken. The analyzer calls this before
    /// reading any ids.
    ///
    /// # Errors
    /// The broken invariant, for sources backed by a layered adjacency.
    fn validate(&self) -> core::result::Result<(), StructuralViolation> {
        Ok(())
    }

    /// Number of layers.
    fn layer_count(&self) -> usize;

    /// Required global ids of `layer`.
    fn layer_nodes(&self, layer: usize) -> &[NodeId];
}

impl LayerNodeSource for Batch {
    fn validate(&self) -> core::result::Result<(), StructuralViolation> {
        Batch::validate(self)
    }

    fn layer_count(&self) -> usize {
        Batch::layer_count(self)
    }

    fn layer_nodes(&self, layer: usize) -> &[NodeId] {
        Batch::layer_nodes(self, layer)
    }
}

impl LayerNodeSource for NanoBatch {
    fn validate(&self) -> core::result::Result<(), StructuralViolation> {
        self.batch().validate()
    }

    fn layer_count(&self) -> usize {
        self.batch().layer_count()
    }

    fn layer_nodes(&self, layer: usize) -> &[NodeId] {
        self.batch().layer_nodes(layer)
    }
}

impl LayerNodeSource for LayerNodes {
    fn layer_count(&self) -> usize {
        LayerNodes::layer_count(self)
    }

    fn layer_nodes(&self, layer: usize) -> &[NodeId] {
        self.layer(layer)
    }
}

/// Overlap counts of one layer of one mini-batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerOverlap {
    /// Node occurrences summed over all nano-batches.
    pub total: usize,
    /// Redundant occurrences in the analyzed order.
    pub redundant: usize,
    /// Fewest redundant occurrences over the orders considered.
    pub min_redundant: usize,
    /// Most redundant occurrences over the orders considered.
    pub max_redundant: usize,
}

impl LayerOverlap {
    #[allow(clippy::cast_precision_loss)]
    fn fraction(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64
        }
    }

    /// Redundant ratio of the analyzed order.
    pub fn ratio(&self) -> f64 {
        self.fraction(self.redundant)
    }

    /// Smallest ratio over the orders considered.
    pub fn min_ratio(&self) -> f64 {
        self.fraction(self.min_redundant)
    }

    /// Largest ratio over the orders considered.
    pub fn max_ratio(&self) -> f64 {
        self.fraction(self.max_redundant)
    }
}

/// Overlap of one mini-batch's nano-batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiniBatchOverlap {
    /// Mode used.
    pub mode: OverlapMode,
    /// Orders evaluated (1 in fixed mode, `n!` in exhaustive mode).
    pub orders: usize,
    /// One entry per layer, outer hop first.
    pub layers: Vec<LayerOverlap>,
}

/// Computes overlap ratios.
#[derive(Debug, Clone, Default)]
pub struct OverlapAnalyzer {
    config: AnalyzerConfig,
}

impl OverlapAnalyzer {
    /// Creates an analyzer.
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// The analyzer's configuration.
    #[inline]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyzes one mini-batch's nano-batch sequence.
    ///
    /// # Errors
    /// - [`ConfigurationError::EmptyNanoBatchSet`] for an empty sequence;
    /// - a structural error if a nano-batch is malformed;
    /// - [`StructuralViolation::LayerCountMismatch`] if the nano-batches disagree on the
    ///   layer count;
    /// - [`ConfigurationError::ExhaustiveLimit`] in exhaustive mode when the sequence is
    ///   longer than the configured limit.
    pub fn analyze<B: LayerNodeSource>(&self, nano_batches: &[B]) -> Result<MiniBatchOverlap> {
        let Some(first) = nano_batches.first() else {
            return Err(Error::configuration(
                Component::Analyzer,
                ConfigurationError::EmptyNanoBatchSet,
            ));
        };
        for nb in nano_batches {
            nb.validate()
                .map_err(|v| Error::structural(Component::Analyzer, v))?;
        }
        let layer_count = first.layer_count();
        if let Some((index, nb)) = nano_batches
            .iter()
            .enumerate()
            .find(|(_, nb)| nb.layer_count() != layer_count)
        {
            return Err(Error::structural(
                Component::Analyzer,
                StructuralViolation::LayerCountMismatch {
                    index,
                    layers: nb.layer_count(),
                    expected: layer_count,
                },
            ));
        }

        let n = nano_batches.len();
        let orders = match self.config.mode {
            OverlapMode::Fixed => 1,
            OverlapMode::Exhaustive => factorial(n)
                .filter(|_| n <= self.config.max_exhaustive)
                .ok_or_else(|| {
                    Error::configuration(
                        Component::Analyzer,
                        ConfigurationError::ExhaustiveLimit {
                            nano_batches: n,
                            limit: self.config.max_exhaustive,
                        },
                    )
                })?,
        };

        let sets = CompactSets::new(nano_batches, layer_count);

        let mut given_order: Vec<usize> = (0..n).collect();
        reorder(&mut given_order, self.config.order);
        let given = sets.count(&given_order, &mut sets.scratch());

        let bounds = match self.config.mode {
            OverlapMode::Fixed => Bounds {
                min: given.clone(),
                max: given.clone(),
            },
            OverlapMode::Exhaustive => sets.exhaustive(orders),
        };

        let layers = (0..layer_count)
            .map(|l| LayerOverlap {
                total: sets.totals[l],
                redundant: given[l],
                min_redundant: bounds.min[l],
                max_redundant: bounds.max[l],
            })
            .collect();

        tracing::debug!(nano_batches = n, orders, ?given, "analyzed mini-batch");
        Ok(MiniBatchOverlap {
            mode: self.config.mode,
            orders,
            layers,
        })
    }

    /// Partitions `mini_batch` with `partitioner` and analyzes the resulting sequence.
    ///
    /// # Errors
    /// Propagates partitioning and analysis failures.
    pub fn analyze_mini_batch(
        &self,
        partitioner: &Partitioner,
        mini_batch: &MiniBatch,
    ) -> Result<MiniBatchOverlap> {
        let layers = partitioner.partition_layers(mini_batch)?;
        self.analyze(&layers)
    }
}

/// Per-layer redundant counts; `min` and `max` are element-wise bounds.
#[derive(Debug, Clone)]
struct Bounds {
    min: Vec<usize>,
    max: Vec<usize>,
}

impl Bounds {
    fn empty(layers: usize) -> Self {
        Self {
            min: vec![usize::MAX; layers],
            max: vec![0; layers],
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.min.iter_mut().zip(other.min) {
            *a = (*a).min(b);
        }
        for (a, b) in self.max.iter_mut().zip(other.max) {
            *a = (*a).max(b);
        }
        self
    }
}

/// Node-id lists re-keyed to dense per-layer ids so running sets are bitsets.
struct CompactSets {
    /// `ids[layer][nano_batch]`.
    ids: Vec<Vec<Vec<usize>>>,
    /// Distinct ids per layer.
    universe: Vec<usize>,
    /// Occurrences per layer.
    totals: Vec<usize>,
}

/// Reusable buffers for evaluating one order.
struct Scratch {
    seen: Vec<PresenceBits>,
    pool: Vec<usize>,
    order: Vec<usize>,
}

impl CompactSets {
    fn new<B: LayerNodeSource>(nano_batches: &[B], layers: usize) -> Self {
        let mut ids = Vec::with_capacity(layers);
        let mut universe = Vec::with_capacity(layers);
        let mut totals = Vec::with_capacity(layers);
        for layer in 0..layers {
            let mut dense: HashMap<NodeId, usize> = HashMap::new();
            let mut total = 0;
            let per_nb: Vec<Vec<usize>> = nano_batches
                .iter()
                .map(|nb| {
                    let nodes = nb.layer_nodes(layer);
                    total += nodes.len();
                    // Repeats inside one nano-batch count once.
                    let mut ids: Vec<usize> = nodes
                        .iter()
                        .map(|&g| {
                            let next = dense.len();
                            *dense.entry(g).or_insert(next)
                        })
                        .collect();
                    ids.sort_unstable();
                    ids.dedup();
                    ids
                })
                .collect();
            totals.push(total);
            universe.push(dense.len());
            ids.push(per_nb);
        }
        Self {
            ids,
            universe,
            totals,
        }
    }

    fn scratch(&self) -> Scratch {
        Scratch {
            seen: self.universe.iter().map(|&u| PresenceBits::new(u)).collect(),
            pool: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Redundant counts per layer when the nano-batches run in `order`.
    fn count(&self, order: &[usize], scratch: &mut Scratch) -> Vec<usize> {
        self.ids
            .iter()
            .zip(&mut scratch.seen)
            .map(|(per_nb, seen)| {
                seen.clear();
                let mut redundant = 0;
                for &i in order {
                    redundant += per_nb[i].iter().filter(|&&x| !seen.insert(x)).count();
                }
                redundant
            })
            .collect()
    }

    fn evaluate(&self, k: usize, scratch: &mut Scratch) -> Bounds {
        let n = self.ids.first().map_or(0, Vec::len);
        let mut order = core::mem::take(&mut scratch.order);
        nth_permutation(n, k, &mut scratch.pool, &mut order);
        let counts = self.count(&order, scratch);
        scratch.order = order;
        Bounds {
            min: counts.clone(),
            max: counts,
        }
    }

    #[cfg(feature = "parallel")]
    fn exhaustive(&self, orders: usize) -> Bounds {
        let layers = self.ids.len();
        (0..orders)
            .into_par_iter()
            .map_init(|| self.scratch(), |scratch, k| self.evaluate(k, scratch))
            .reduce(|| Bounds::empty(layers), Bounds::merge)
    }

    #[cfg(not(feature = "parallel"))]
    fn exhaustive(&self, orders: usize) -> Bounds {
        let mut scratch = self.scratch();
        (0..orders).fold(Bounds::empty(self.ids.len()), |acc, k| {
            acc.merge(self.evaluate(k, &mut scratch))
        })
    }
}
