//! Nano-batched forward execution.
//!
//! The convolution itself is external; it is reached through [`LayerOperator`]. This
//! module wires the operator to the [`Partitioner`], the pruner and the per-layer
//! [`History`](crate::History) caches:
//!
//! 1. every layer of the nano-batch is pruned against the caches up front;
//! 2. each layer runs the operator on its pruned adjacency;
//! 3. after every intermediate layer, cached rows are pulled over the fresh output and the
//!    post-pull rows are staged for a push under the layer's global ids;
//! 4. staged pushes are committed once the final layer has succeeded.
//!
//! A failing nano-batch therefore leaves every cache exactly as it found it.
//!
//! Nano-batches of one mini-batch run strictly in sequence, since pruning depends on what
//! the previous ones pushed. Distinct mini-batches share nothing and
//! [`run_mini_batches`] spreads them over rayon workers when the `parallel` feature is on.

use crate::error::{Component, ConfigurationError, Error, Result, StructuralViolation};
use crate::graph::{Adj, Batch, MiniBatch};
use crate::history::{Embeddings, History, HistoryStack};
use crate::partition::Partitioner;
use crate::prune::prune_computation_graph;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One message-passing layer.
///
/// `x` holds one row per local source id (at least `adj.size().src` rows); the result must
/// hold exactly `adj.size().dst` rows, one per destination.
pub trait LayerOperator {
    /// Computes layer `layer` over `adj`.
    ///
    /// # Errors
    /// Implementation-defined; the executor propagates the error untouched.
    fn forward(&self, layer: usize, x: &Embeddings, adj: &Adj) -> Result<Embeddings>;
}

impl<F> LayerOperator for F
where
    F: Fn(usize, &Embeddings, &Adj) -> Result<Embeddings>,
{
    fn forward(&self, layer: usize, x: &Embeddings, adj: &Adj) -> Result<Embeddings> {
        self(layer, x, adj)
    }
}

/// Self-inclusive mean of incoming neighbor rows. Output width equals input width.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAggregator;

impl LayerOperator for MeanAggregator {
    #[allow(clippy::cast_precision_loss)]
    fn forward(&self, _layer: usize, x: &Embeddings, adj: &Adj) -> Result<Embeddings> {
        let size = adj.size();
        if x.rows() < size.src {
            return Err(rows_error(x.rows(), size.src));
        }
        let mut out = Embeddings::zeros(size.dst, x.dim());
        let mut degree = vec![1usize; size.dst];
        for d in 0..size.dst {
            out.row_mut(d).copy_from_slice(x.row(d));
        }
        for (s, d) in adj.edges() {
            for (o, v) in out.row_mut(d).iter_mut().zip(x.row(s)) {
                *o += v;
            }
            degree[d] += 1;
        }
        for (d, &deg) in degree.iter().enumerate() {
            let scale = 1.0 / deg as f32;
            out.row_mut(d).iter_mut().for_each(|v| *v *= scale);
        }
        Ok(out)
    }
}

fn rows_error(rows: usize, expected: usize) -> Error {
    Error::structural(
        Component::Executor,
        StructuralViolation::FeatureRows { rows, expected },
    )
}

/// Runs nano-batches of one mini-batch against that mini-batch's caches.
#[derive(Debug)]
pub struct NanoBatchExecutor<'h> {
    histories: &'h mut HistoryStack,
}

impl<'h> NanoBatchExecutor<'h> {
    /// Wraps the caches of one mini-batch.
    pub fn new(histories: &'h mut HistoryStack) -> Self {
        Self { histories }
    }

    /// The caches, as left by the nano-batches run so far.
    #[inline]
    pub fn histories(&self) -> &HistoryStack {
        self.histories
    }

    /// Computes the final-layer output of `batch`'s targets.
    ///
    /// `x` holds one input row per local id of `batch`.
    ///
    /// # Errors
    /// - structural errors for a malformed `batch`, a mis-sized `x` or an operator result
    ///   with the wrong row count;
    /// - a configuration error unless there is exactly one cache per intermediate layer;
    /// - cache errors from pruning or pulling;
    /// - whatever `op` returns.
    ///
    /// No cache is modified on failure.
    pub fn forward<O>(&mut self, op: &O, x: &Embeddings, batch: &Batch) -> Result<Embeddings>
    where
        O: LayerOperator + ?Sized,
    {
        batch
            .validate()
            .map_err(|v| Error::structural(Component::Executor, v))?;
        let last = batch.layer_count() - 1;
        if self.histories.len() != last {
            return Err(Error::configuration(
                Component::Executor,
                ConfigurationError::HiddenDims {
                    dims: self.histories.len(),
                    layers: last,
                },
            ));
        }
        if x.rows() != batch.node_count() {
            return Err(rows_error(x.rows(), batch.node_count()));
        }

        let pruned = prune_computation_graph(batch, self.histories.as_slice())?;

        // staged[i] is the post-pull output of layer i and the input of layer i + 1.
        let mut staged: Vec<Embeddings> = Vec::with_capacity(last);
        for (layer, adj) in pruned.iter().enumerate().take(last) {
            let input = staged.last().unwrap_or(x);
            let mut out = run_layer(op, layer, input, adj)?;
            let pulled =
                self.histories.as_slice()[layer].pull(&mut out, batch.layer_nodes(layer))?;
            tracing::trace!(layer, pulled, "pulled cached rows");
            staged.push(out);
        }
        let input = staged.last().unwrap_or(x);
        let out = run_layer(op, last, input, &pruned[last])?;

        for (layer, emb) in staged.iter().enumerate() {
            self.histories.as_mut_slice()[layer].push(emb, batch.layer_nodes(layer))?;
        }
        Ok(out)
    }
}

fn run_layer<O>(op: &O, layer: usize, input: &Embeddings, adj: &Adj) -> Result<Embeddings>
where
    O: LayerOperator + ?Sized,
{
    let out = op.forward(layer, input, adj)?;
    if out.rows() != adj.size().dst {
        return Err(rows_error(out.rows(), adj.size().dst));
    }
    Ok(out)
}

/// Computes the final-layer output of every target of `mini_batch`.
///
/// `features` holds one input row per local id of `mini_batch`. Fresh caches are created
/// for the call and dropped afterwards. Rows are returned in target order; under
/// [`RemainderPolicy::Truncate`](crate::RemainderPolicy::Truncate) only the covered
/// prefix of the targets is returned.
///
/// # Errors
/// Propagates partitioning and execution failures.
pub fn run_mini_batch<O>(
    op: &O,
    mini_batch: &MiniBatch,
    features: &Embeddings,
    partitioner: &Partitioner,
    hidden_dims: &[usize],
) -> Result<Embeddings>
where
    O: LayerOperator + ?Sized,
{
    if features.rows() != mini_batch.node_count() {
        return Err(rows_error(features.rows(), mini_batch.node_count()));
    }
    let mut histories = HistoryStack::for_mini_batch(mini_batch, hidden_dims)?;
    let nano = partitioner.partition(mini_batch)?;

    let mut executor = NanoBatchExecutor::new(&mut histories);
    let mut outputs = Vec::with_capacity(nano.len());
    for nb in &nano {
        let x = features.gather(nb.parent_rows())?;
        let out = executor.forward(op, &x, nb.batch())?;
        outputs.push((nb.target_range().start, out));
    }
    outputs.sort_by_key(|(start, _)| *start);

    let parts: Vec<Embeddings> = outputs.into_iter().map(|(_, out)| out).collect();
    tracing::debug!(
        nano_batches = parts.len(),
        targets = mini_batch.target_count(),
        cached = executor
            .histories()
            .as_slice()
            .iter()
            .map(History::cached_count)
            .sum::<usize>(),
        "ran mini-batch"
    );
    Ok(Embeddings::concat(&parts))
}

/// Runs independent mini-batches, each paired with its input features.
///
/// With the `parallel` feature the mini-batches are spread over rayon workers; every one
/// owns its caches, so results match the sequential run.
///
/// # Errors
/// Returns the first failure; results of the other mini-batches are discarded.
pub fn run_mini_batches<O>(
    op: &O,
    mini_batches: &[(MiniBatch, Embeddings)],
    partitioner: &Partitioner,
    hidden_dims: &[usize],
) -> Result<Vec<Embeddings>>
where
    O: LayerOperator + Sync + ?Sized,
{
    #[cfg(feature = "parallel")]
    let iter = mini_batches.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = mini_batches.iter();

    iter.map(|(mb, features)| run_mini_batch(op, mb, features, partitioner, hidden_dims))
        .collect()
}
